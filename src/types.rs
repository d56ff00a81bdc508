use serde::Serialize;
use shakmaty::uci::UciMove;

/// Engine score for a single line, from the mover's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns.
    Cp(i32),
    /// Mate in n moves; negative when the mover is getting mated.
    Mate(i32),
}

/// One principal variation returned by a multi-line search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisLine {
    /// 1-based line index as reported by the engine.
    pub multipv: usize,
    pub depth: Option<u32>,
    pub score: Option<Score>,
    pub pv: Vec<UciMove>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveScore {
    pub uci: UciMove,
    pub score: i32,
}

/// Scores for every legal move of a position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveEvaluation {
    /// Highest score among `scores`, or 0 when there are no moves.
    pub best_eval: i32,
    /// One entry per legal move, in legal move order.
    pub scores: Vec<MoveScore>,
}

impl MoveEvaluation {
    pub fn get(&self, uci: &UciMove) -> Option<i32> {
        self.scores.iter().find(|m| &m.uci == uci).map(|m| m.score)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.scores.iter().map(|m| m.score)
    }
}

/// Model output for one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Raw regression output, nominally in 0..1.
    pub raw: f32,
    /// `raw` mapped onto an engine-style eval bar.
    pub eval_bar: f32,
}
