use shakmaty::{Board, CastlingSide, Chess, Color, Position, Square};

use crate::config::RoleWeights;

/// Weighted count of enemy attacks on the mover's king and the eight
/// squares around it. Every attacker counts once per square it hits.
pub fn king_exposure(board: &Board, mover: Color, weights: &RoleWeights) -> f64 {
    let Some(king) = board.king_of(mover) else {
        return 0.0;
    };
    let occupied = board.occupied();

    Square::ALL
        .into_iter()
        .filter(|&sq| king.distance(sq) <= 1)
        .flat_map(|sq| board.attacks_to(sq, mover.other(), occupied))
        .filter_map(|attacker| board.role_at(attacker))
        .map(|role| weights.get(role))
        .sum()
}

/// Weighted count of the mover's pieces within two squares of its king.
pub fn defending_pieces(board: &Board, mover: Color, weights: &RoleWeights) -> f64 {
    let Some(king) = board.king_of(mover) else {
        return 0.0;
    };

    board
        .by_color(mover)
        .into_iter()
        .filter(|&sq| sq != king && king.distance(sq) <= 2)
        .filter_map(|sq| board.role_at(sq))
        .map(|role| weights.get(role))
        .sum()
}

/// 3 = both sides, 2 = kingside only, 1 = queenside only, 0 = none.
pub fn castling_status(position: &Chess) -> f64 {
    let mover = position.turn();
    let castles = position.castles();
    match (
        castles.has(mover, CastlingSide::KingSide),
        castles.has(mover, CastlingSide::QueenSide),
    ) {
        (true, true) => 3.0,
        (true, false) => 2.0,
        (false, true) => 1.0,
        (false, false) => 0.0,
    }
}
