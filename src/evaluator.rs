use shakmaty::{CastlingMode, Chess, Position, uci::UciMove};

use crate::{
    engine::Engine,
    error::PlayabilityError,
    types::{MoveEvaluation, MoveScore, Score},
};

/// Scores every legal move of `position` with a single multi-line search.
///
/// Asking for as many lines as there are legal moves gets an explicit
/// score for each of them in one round trip. Moves the engine leaves out
/// are scored 0. Mates become `±mate_score` depending on who delivers
/// them. Engine errors are returned as is; retrying is up to the caller.
pub fn evaluate_all_moves<E: Engine + ?Sized>(
    position: &Chess,
    engine: &mut E,
    depth: u32,
    mate_score: i32,
) -> Result<MoveEvaluation, PlayabilityError> {
    let legal: Vec<UciMove> = position
        .legal_moves()
        .iter()
        .map(|m| m.to_uci(CastlingMode::Standard))
        .collect();
    if legal.is_empty() {
        return Ok(MoveEvaluation::default());
    }

    let lines = engine.analyse(position, depth, legal.len())?;

    let mut scores: Vec<MoveScore> = legal
        .into_iter()
        .map(|uci| MoveScore { uci, score: 0 })
        .collect();
    for line in lines {
        let Some(first) = line.pv.first() else { continue };
        let Some(entry) = scores.iter_mut().find(|m| &m.uci == first) else {
            log::warn!("engine line starts with {first}, which is not a legal move");
            continue;
        };
        entry.score = match line.score {
            Some(Score::Mate(n)) if n > 0 => mate_score,
            Some(Score::Mate(_)) => -mate_score,
            Some(Score::Cp(cp)) => cp,
            None => 0,
        };
    }

    let best_eval = scores.iter().map(|m| m.score).max().unwrap_or(0);
    log::debug!("depth {depth}: {} moves, best {best_eval}", scores.len());
    Ok(MoveEvaluation { best_eval, scores })
}
