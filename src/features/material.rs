use shakmaty::{Board, Color, Role, Square};

fn material_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 1,
        Role::Knight | Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 0,
    }
}

pub fn material_imbalance(board: &Board, mover: Color) -> f64 {
    let total: i32 = board
        .occupied()
        .into_iter()
        .filter_map(|sq| board.piece_at(sq))
        .map(|p| {
            let v = material_value(p.role);
            if p.color == mover { v } else { -v }
        })
        .sum();
    f64::from(total)
}

/// 0 = opening (more than 20 pieces), 1 = middlegame, 2 = endgame (10 or fewer).
pub fn phase(board: &Board) -> f64 {
    match board.occupied().count() {
        n if n > 20 => 0.0,
        n if n > 10 => 1.0,
        _ => 2.0,
    }
}

/// Attackers of `color` on `sq`, plus one if `color` stands on it.
fn control(board: &Board, sq: Square, color: Color) -> i32 {
    let attackers = board.attacks_to(sq, color, board.occupied()).count() as i32;
    let occupant = i32::from(board.by_color(color).contains(sq));
    attackers + occupant
}

/// Squares the mover controls minus squares the opponent controls.
pub fn space_control(board: &Board, mover: Color) -> f64 {
    let total: i32 = Square::ALL
        .into_iter()
        .map(|sq| (control(board, sq, mover) - control(board, sq, mover.other())).signum())
        .sum();
    f64::from(total)
}

const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// Per center square, +1 if the mover controls it, -1 if the opponent does.
pub fn center_control(board: &Board, mover: Color) -> f64 {
    let total: i32 = CENTER
        .into_iter()
        .map(|sq| (control(board, sq, mover) - control(board, sq, mover.other())).signum())
        .sum();
    f64::from(total)
}
