//! Move geometry on a bare [`Board`].
//!
//! The feature computer sometimes needs to know what a move would do
//! (does it give check?) without touching the caller's position. These
//! helpers apply moves to a scratch copy of the piece placement.

use shakmaty::{Bitboard, Board, Chess, Color, File, Move, Piece, Position, Rank, Role, Square};

/// Conventional material value, with the king worth far more than anything.
pub fn exchange_value(role: Role) -> u32 {
    match role {
        Role::Pawn => 1,
        Role::Knight | Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 100,
    }
}

/// Piece placement after `m` is played by `mover`.
pub fn board_after(board: &Board, m: &Move, mover: Color) -> Board {
    let mut next = board.clone();
    match *m {
        Move::Normal { role, from, to, promotion, .. } => {
            next.discard_piece_at(from);
            next.set_piece_at(
                to,
                Piece {
                    role: promotion.unwrap_or(role),
                    color: mover,
                },
            );
        }
        Move::EnPassant { from, to } => {
            next.discard_piece_at(from);
            next.discard_piece_at(Square::from_coords(to.file(), from.rank()));
            next.set_piece_at(to, Piece { role: Role::Pawn, color: mover });
        }
        Move::Castle { king, rook } => {
            let (king_file, rook_file) = if king < rook {
                (File::G, File::F)
            } else {
                (File::C, File::D)
            };
            next.discard_piece_at(king);
            next.discard_piece_at(rook);
            next.set_piece_at(
                Square::from_coords(king_file, king.rank()),
                Piece { role: Role::King, color: mover },
            );
            next.set_piece_at(
                Square::from_coords(rook_file, rook.rank()),
                Piece { role: Role::Rook, color: mover },
            );
        }
        _ => {}
    }
    next
}

/// Whether `m` leaves the opponent's king attacked.
pub fn gives_check(position: &Chess, m: &Move) -> bool {
    let mover = position.turn();
    let next = board_after(position.board(), m, mover);
    next.king_of(mover.other())
        .is_some_and(|king| !next.attacks_to(king, mover, next.occupied()).is_empty())
}

/// Checks and captures.
pub fn is_forcing(position: &Chess, m: &Move) -> bool {
    m.is_capture() || gives_check(position, m)
}

/// A pseudo-legal move reduced to what the mobility feature needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub from: Square,
    pub to: Square,
}

/// Pseudo-legal moves for the side to move: piece attacks onto squares
/// not held by the mover, pawn pushes and captures (promotions counted
/// once per promotion piece), plus the legal castling moves.
pub fn pseudo_legal_moves(position: &Chess) -> Vec<Candidate> {
    let board = position.board();
    let us = position.turn();
    let ours = board.by_color(us);
    let theirs = board.by_color(us.other());
    let occupied = board.occupied();
    let ep = position.ep_square(shakmaty::EnPassantMode::Legal);

    let mut out = Vec::new();
    for from in ours {
        let Some(role) = board.role_at(from) else { continue };
        if role != Role::Pawn {
            for to in board.attacks_from(from) & !ours {
                out.push(Candidate { from, to });
            }
            continue;
        }

        let mut targets = board.attacks_from(from) & theirs;
        if let Some(ep) = ep {
            if board.attacks_from(from).contains(ep) {
                targets |= Bitboard::from_square(ep);
            }
        }
        let forward: i32 = if us.is_white() { 1 } else { -1 };
        let rank = from.rank() as i32;
        let start_rank = if us.is_white() { 1 } else { 6 };
        if let Some(one) = offset(from, forward) {
            if !occupied.contains(one) {
                targets |= Bitboard::from_square(one);
                if rank == start_rank {
                    if let Some(two) = offset(from, 2 * forward) {
                        if !occupied.contains(two) {
                            targets |= Bitboard::from_square(two);
                        }
                    }
                }
            }
        }
        let last_rank = if us.is_white() { Rank::Eighth } else { Rank::First };
        for to in targets {
            let times = if to.rank() == last_rank { 4 } else { 1 };
            for _ in 0..times {
                out.push(Candidate { from, to });
            }
        }
    }

    for m in position.legal_moves().iter() {
        if let Move::Castle { king, rook } = *m {
            let file = if king < rook { File::G } else { File::C };
            out.push(Candidate {
                from: king,
                to: Square::from_coords(file, king.rank()),
            });
        }
    }
    out
}

fn offset(sq: Square, ranks: i32) -> Option<Square> {
    let rank = sq.rank() as i32 + ranks;
    (0..8)
        .contains(&rank)
        .then(|| Square::from_coords(sq.file(), Rank::new(rank as u32)))
}
