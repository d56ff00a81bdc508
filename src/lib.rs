//! Estimates how playable a chess position is for a human.
//!
//!
//! The crate drives a UCI engine to score every legal move of a
//! position, derives a fixed set of named features from those scores
//! and from the board itself (king safety, pawn structure, mobility,
//! volatility, traps, move ease), and feeds a selection of them to
//! rating-specific ONNX regression models.
//!
//! The principal entry points are [`compute_features`], which only needs
//! something implementing [`Engine`], and [`Analyzer`], which adds model
//! predictions on top.
//!
//! The library re‑exports `shakmaty` to make position construction easy.

mod config;
mod engine;
mod error;
mod evaluator;
mod features;
mod moves;
mod predictor;
mod tensor;
mod types;
mod uci;

use shakmaty::{CastlingMode, Chess, Setup, fen::Fen};

/// Tunable constants and engine launch settings.
pub use config::{EngineConfig, FeatureConfig, MATE_SCORE, RoleWeights};

/// The engine seam and its UCI implementation.
pub use engine::{Engine, UciEngine};

/// Error type produced by library operations.
pub use error::PlayabilityError;

pub use evaluator::evaluate_all_moves;

pub use features::{
    FEATURE_NAMES, FeatureRecord, MoveClass, blunder_severity, classify, compute_features,
    move_ease, trap_susceptibility, volatility,
};

pub use moves::{gives_check, is_forcing};

pub use predictor::{
    Analysis, Analyzer, FeatureSets, MetricsTable, ModelInfo, ModelMetrics, ModelReport,
    NEUTRAL_SCORE, PlayabilityModel, RawScores,
};

pub use tensor::{
    EloBracket, Target, TimeControl, feature_tensor, model_file_name, score_to_eval_bar,
};

/// Engine output and evaluation data structures.
pub use types::{AnalysisLine, MoveEvaluation, MoveScore, Prediction, Score};

pub use uci::parse_info_line;

/// Re-export of `shakmaty` for convenience when building positions.
pub use shakmaty;

/// Parses a FEN into a standard chess position.
pub fn position_from_fen(fen: &str) -> Result<Chess, PlayabilityError> {
    let fen: Fen = fen.parse()?;
    let setup: Setup = fen.into();
    let position: Chess = setup.position(CastlingMode::Standard)?;
    Ok(position)
}
