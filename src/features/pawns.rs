//! Pawn structure features.
//!
//! Pawns are indexed by file once per call ([`PawnFiles`]); every
//! feature below reads from that index instead of rescanning the board.

use shakmaty::{Board, Color, Role};

/// Ranks (0-based, from White's side) of one color's pawns, per file.
#[derive(Debug, Clone, Default)]
pub struct PawnFiles {
    ranks: [Vec<i32>; 8],
}

impl PawnFiles {
    pub fn new(board: &Board, color: Color) -> Self {
        let mut files = Self::default();
        for sq in board.by_role(Role::Pawn) & board.by_color(color) {
            files.ranks[sq.file() as usize].push(sq.rank() as i32);
        }
        files
    }

    fn on(&self, file: i32) -> &[i32] {
        usize::try_from(file)
            .ok()
            .and_then(|f| self.ranks.get(f))
            .map_or(&[][..], Vec::as_slice)
    }

    fn count(&self, file: i32) -> usize {
        self.on(file).len()
    }

    fn pawns(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..8).flat_map(move |f| self.on(f).iter().map(move |&r| (f, r)))
    }

    /// Pawns beyond the first on each occupied file.
    pub fn doubled(&self) -> usize {
        self.ranks
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| r.len() - 1)
            .sum()
    }

    /// Pawns with a neighbour strictly ahead and none strictly behind,
    /// where "ahead" follows `color`'s direction of travel.
    pub fn backward(&self, color: Color) -> usize {
        let ahead = |rank: i32, than: i32| if color.is_white() { rank > than } else { rank < than };
        self.pawns()
            .filter(|&(f, r)| {
                let neighbours = || self.on(f - 1).iter().chain(self.on(f + 1));
                neighbours().any(|&o| ahead(o, r)) && !neighbours().any(|&o| ahead(r, o))
            })
            .count()
    }

    /// Maximal runs of adjacent occupied files.
    pub fn islands(&self) -> Vec<Island> {
        let mut islands: Vec<Island> = Vec::new();
        for f in 0..8 {
            let count = self.count(f);
            if count == 0 {
                continue;
            }
            match islands.last_mut() {
                Some(last) if last.last_file + 1 == f => {
                    last.last_file = f;
                    last.pawns += count;
                }
                _ => islands.push(Island {
                    first_file: f,
                    last_file: f,
                    pawns: count,
                }),
            }
        }
        islands
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Island {
    pub first_file: i32,
    pub last_file: i32,
    pub pawns: usize,
}

impl Island {
    fn overlaps(&self, other: &Island) -> bool {
        !(other.last_file < self.first_file || other.first_file > self.last_file)
    }
}

pub fn doubled_pawns(mover: &PawnFiles, opponent: &PawnFiles) -> f64 {
    opponent.doubled() as f64 - mover.doubled() as f64
}

pub fn backward_pawns(mover: &PawnFiles, opponent: &PawnFiles, mover_color: Color) -> f64 {
    mover.backward(mover_color) as f64 - opponent.backward(mover_color.other()) as f64
}

fn majority_weight(smaller: usize) -> f64 {
    match smaller {
        1 => 1.0,
        2 => 0.8,
        3 => 0.7,
        4 => 0.6,
        _ => 0.5,
    }
}

fn majority_value(larger: usize, smaller: usize) -> f64 {
    let diff = larger - smaller;
    let scale = match diff {
        1 => 1.0,
        2 => 2.5,
        _ => 4.0,
    };
    majority_weight(smaller) * scale
}

/// Sum of island majorities, positive when they favour the mover.
///
/// Each island is compared with the largest opposing island sharing any
/// of its files.
pub fn pawn_majority(mover: &PawnFiles, opponent: &PawnFiles) -> f64 {
    let ours = mover.islands();
    let theirs = opponent.islands();

    let one_way = |islands: &[Island], against: &[Island]| -> f64 {
        islands
            .iter()
            .map(|isl| {
                let opposing = against
                    .iter()
                    .filter(|o| isl.overlaps(o))
                    .map(|o| o.pawns)
                    .max()
                    .unwrap_or(0);
                if isl.pawns > opposing {
                    majority_value(isl.pawns, opposing)
                } else {
                    0.0
                }
            })
            .sum()
    };

    one_way(&ours, &theirs) - one_way(&theirs, &ours)
}

/// Passed pawns of one color. A passed pawn on a file next to another
/// passed pawn's file scores 1.25; otherwise its file scores 0.6 per
/// pawn, at most 2.5.
pub fn weighted_passed_pawns(own: &PawnFiles, enemy: &PawnFiles, color: Color) -> f64 {
    let ahead = |rank: i32, than: i32| if color.is_white() { rank > than } else { rank < than };

    let mut passed = [0usize; 8];
    for (f, r) in own.pawns() {
        let blocked = (f - 1..=f + 1).any(|ef| enemy.on(ef).iter().any(|&er| ahead(er, r)));
        if !blocked {
            passed[f as usize] += 1;
        }
    }

    let has = |f: i32| (0..8).contains(&f) && passed[f as usize] > 0;
    (0..8)
        .filter(|&f| has(f))
        .map(|f| {
            if has(f - 1) || has(f + 1) {
                1.25
            } else {
                (passed[f as usize] as f64 * 0.6).min(2.5)
            }
        })
        .sum()
}

pub fn passed_pawns(board: &Board, mover: Color) -> f64 {
    let ours = PawnFiles::new(board, mover);
    let theirs = PawnFiles::new(board, mover.other());
    weighted_passed_pawns(&ours, &theirs, mover)
        - weighted_passed_pawns(&theirs, &ours, mover.other())
}
