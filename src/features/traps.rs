use crate::types::MoveEvaluation;

/// Whether a move looks good enough at low depth that a human would
/// seriously consider it.
fn looks_good(shallow_best: i32, eval: i32, mate_score: i32) -> bool {
    if eval == mate_score {
        return true;
    }
    let best = f64::from(shallow_best);
    let ev = f64::from(eval);
    if shallow_best >= 0 {
        ev >= 0.7 * best
    } else if shallow_best <= -300 {
        ev >= 1.2 * best
    } else {
        ev >= 1.4 * best
    }
}

/// Whether a deeper search refutes what the shallow search promised.
fn is_trap(shallow: i32, deep: i32, mate_score: i32) -> bool {
    if shallow == mate_score {
        return deep != mate_score;
    }
    (deep < shallow - 450 && deep < 500) || (deep < shallow - 600 && deep >= 500)
}

/// Share of shallow-attractive moves that a deep search refutes.
///
/// Both evaluations are expected to cover the same legal moves. A move
/// missing from `deep` is scored 0.
pub fn trap_susceptibility(
    shallow: &MoveEvaluation,
    deep: &MoveEvaluation,
    mate_score: i32,
) -> f64 {
    let mut candidates = 0usize;
    let mut traps = 0usize;
    for m in &shallow.scores {
        if !looks_good(shallow.best_eval, m.score, mate_score) {
            continue;
        }
        candidates += 1;
        let deep_score = deep.get(&m.uci).unwrap_or(0);
        if is_trap(m.score, deep_score, mate_score) {
            log::trace!("{} looks like {} but is {}", m.uci, m.score, deep_score);
            traps += 1;
        }
    }
    traps as f64 / candidates.max(1) as f64
}
