//! How easy it is for a human to find a good move.

use shakmaty::{CastlingMode, Chess, Position};

use crate::{moves::is_forcing, types::MoveEvaluation};

/// Quality bucket of a move relative to the best score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveClass {
    /// Keeps most of the advantage, or barely worsens a bad position.
    Top,
    /// Keeps half the advantage, or worsens a bad position moderately.
    Decent,
    Other,
}

/// Classifies a score against the best one. When ahead the thresholds are
/// fractions of the advantage; when behind they are multiples of the
/// deficit, more lenient the closer the position is to equal.
pub fn classify(best: i32, eval: i32) -> MoveClass {
    let best_f = f64::from(best);
    let ev = f64::from(eval);
    let (top, decent) = if best >= 0 {
        (0.7, 0.5)
    } else if best <= -300 {
        (1.2, 1.6)
    } else if best <= -100 {
        (1.4, 1.8)
    } else {
        (1.8, 2.2)
    };

    if ev >= top * best_f {
        MoveClass::Top
    } else if ev >= decent * best_f {
        MoveClass::Decent
    } else {
        MoveClass::Other
    }
}

/// `(top + 0.4 * decent) / max(1, good)`, where `good` counts every top
/// and decent move. With `forcing_only`, only checks and captures add to
/// the numerator.
pub fn move_ease(position: &Chess, eval: &MoveEvaluation, forcing_only: bool) -> f64 {
    let mut good = 0usize;
    let mut top = 0usize;
    let mut decent = 0usize;

    for m in position.legal_moves().iter() {
        let Some(score) = eval.get(&m.to_uci(CastlingMode::Standard)) else {
            continue;
        };
        let class = classify(eval.best_eval, score);
        if class == MoveClass::Other {
            continue;
        }
        good += 1;
        if forcing_only && !is_forcing(position, m) {
            continue;
        }
        match class {
            MoveClass::Top => top += 1,
            MoveClass::Decent => decent += 1,
            MoveClass::Other => {}
        }
    }

    (top as f64 + 0.4 * decent as f64) / good.max(1) as f64
}
