//! Piece activity: safe mobility, mutual protection and simple tactics.

use shakmaty::{Bitboard, Board, Chess, Color, Position, Role, Square, attacks};

use crate::moves::{Candidate, exchange_value, pseudo_legal_moves};

fn defenders(board: &Board, color: Color, sq: Square) -> Bitboard {
    board.attacks_to(sq, color, board.occupied())
}

fn is_defended(board: &Board, color: Color, sq: Square) -> bool {
    !defenders(board, color, sq).is_empty()
}

/// A move is unsafe if a cheaper enemy piece attacks the destination, or
/// if it is attacked at all and nothing but the moving piece covers it.
fn is_safe(board: &Board, mover: Color, c: Candidate) -> bool {
    let Some(role) = board.role_at(c.from) else {
        return false;
    };
    if board.by_color(mover).contains(c.to) {
        return false;
    }
    let attackers = defenders(board, mover.other(), c.to);
    if attackers.is_empty() {
        return true;
    }
    let moving = exchange_value(role);
    if attackers
        .into_iter()
        .filter_map(|sq| board.role_at(sq))
        .any(|r| exchange_value(r) < moving)
    {
        return false;
    }
    let cover = defenders(board, mover, c.to) & !Bitboard::from_square(c.from);
    !cover.is_empty()
}

/// Number of the mover's pseudo-legal moves that land on a safe square.
pub fn mobility(position: &Chess) -> f64 {
    let board = position.board();
    let mover = position.turn();
    pseudo_legal_moves(position)
        .into_iter()
        .filter(|&c| is_safe(board, mover, c))
        .count() as f64
}

/// Share of the mover's pieces (king included) defended by another own piece.
pub fn piece_coordination(board: &Board, mover: Color) -> f64 {
    let own = board.by_color(mover);
    let defended = own
        .into_iter()
        .filter(|&sq| is_defended(board, mover, sq))
        .count();
    defended as f64 / own.count().max(1) as f64
}

pub fn rooks_connected(board: &Board, mover: Color) -> f64 {
    let rooks = board.by_role(Role::Rook) & board.by_color(mover);
    let connected = rooks.count() == 2 && rooks.into_iter().all(|sq| is_defended(board, mover, sq));
    if connected { 1.0 } else { 0.0 }
}

pub fn bishop_pair(board: &Board, mover: Color) -> f64 {
    let bishops = board.by_role(Role::Bishop) & board.by_color(mover);
    if bishops.count() == 2 { 1.0 } else { 0.0 }
}

/// Undefended own pieces: 1 per minor or major piece, 0.25 per pawn.
pub fn hanging_pieces(board: &Board, mover: Color) -> f64 {
    board
        .by_color(mover)
        .into_iter()
        .filter(|&sq| !is_defended(board, mover, sq))
        .filter_map(|sq| board.role_at(sq))
        .map(|role| match role {
            Role::Pawn => 0.25,
            Role::King => 0.0,
            _ => 1.0,
        })
        .sum()
}

/// Pieces that are the only defender of two or more own minor or major
/// pieces. Counted +1 for the mover and -1 for the opponent.
pub fn overworked_defenders(board: &Board, mover: Color) -> f64 {
    let valuable = board.occupied() & !board.by_role(Role::Pawn) & !board.kings();
    let mut score = 0.0;
    for sq in board.occupied() {
        let Some(color) = board.color_at(sq) else { continue };
        let sole_duties = (board.attacks_from(sq) & valuable & board.by_color(color))
            .into_iter()
            .filter(|&target| defenders(board, color, target) == Bitboard::from_square(sq))
            .count();
        if sole_duties >= 2 {
            score += if color == mover { 1.0 } else { -1.0 };
        }
    }
    score
}

/// Pieces of `color` absolutely pinned to their own king.
pub fn pinned(board: &Board, color: Color) -> Bitboard {
    let Some(king) = board.king_of(color) else {
        return Bitboard::EMPTY;
    };
    let enemy = board.by_color(color.other());
    let snipers = ((attacks::rook_attacks(king, Bitboard::EMPTY) & board.rooks_and_queens())
        | (attacks::bishop_attacks(king, Bitboard::EMPTY) & board.bishops_and_queens()))
        & enemy;

    let mut out = Bitboard::EMPTY;
    for sniper in snipers {
        let blockers = attacks::between(king, sniper) & board.occupied();
        if blockers.count() == 1 {
            out |= blockers & board.by_color(color);
        }
    }
    out
}

/// Opponent pieces pinned to their king minus the mover's.
pub fn pins(board: &Board, mover: Color) -> f64 {
    pinned(board, mover.other()).count() as f64 - pinned(board, mover).count() as f64
}
