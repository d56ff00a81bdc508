//! The feature computer.
//!
//! [`compute_features`] turns a position and two engine searches into a
//! [`FeatureRecord`]. Every numeric feature is measured relative to the
//! side to move. Most read "higher is better for the mover", but
//! penalties such as `backward_pawns`, `king_exposure`, `hanging_pieces`
//! and `volatility` grow with the mover's trouble.

mod activity;
mod ease;
mod king;
mod material;
mod pawns;
mod traps;
mod volatility;

use std::collections::BTreeMap;

use serde::Serialize;
use shakmaty::{Chess, Position};

use crate::{
    config::FeatureConfig, engine::Engine, error::PlayabilityError, evaluator::evaluate_all_moves,
};

pub use ease::{MoveClass, classify, move_ease};
pub use volatility::{blunder_severity, volatility};
pub use traps::trap_susceptibility;

/// Names of the numeric features, in output order.
pub const FEATURE_NAMES: [&str; 23] = [
    "volatility",
    "move_ease",
    "trap_susceptibility",
    "king_exposure",
    "castling_status",
    "defending_pieces",
    "doubled_pawns",
    "backward_pawns",
    "pawn_majority",
    "mobility",
    "piece_coordination",
    "hanging_pieces",
    "rooks_connected",
    "bishop_pair",
    "overworked_defenders",
    "pins",
    "tactical_motifs",
    "material_imbalance",
    "phase",
    "space_control",
    "passed_pawns",
    "center_control",
    "stockfish_eval",
];

/// Feature vector of one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub volatility: f64,
    pub move_ease: f64,
    pub trap_susceptibility: f64,
    pub king_exposure: f64,
    pub castling_status: f64,
    pub defending_pieces: f64,
    pub doubled_pawns: f64,
    pub backward_pawns: f64,
    pub pawn_majority: f64,
    pub mobility: f64,
    pub piece_coordination: f64,
    pub hanging_pieces: f64,
    pub rooks_connected: f64,
    pub bishop_pair: f64,
    pub overworked_defenders: f64,
    pub pins: f64,
    pub tactical_motifs: f64,
    pub material_imbalance: f64,
    pub phase: f64,
    pub space_control: f64,
    pub passed_pawns: f64,
    pub center_control: f64,
    /// Best score at the primary depth.
    pub stockfish_eval: i32,
    /// Legal moves in UCI notation. Not a model input.
    pub top_moves: Vec<String>,
    /// Primary-depth score of every legal move. Not a model input.
    pub evals: BTreeMap<String, i32>,
}

impl FeatureRecord {
    /// Numeric feature by name. Auxiliary fields are not reachable here.
    pub fn value(&self, name: &str) -> Option<f64> {
        let v = match name {
            "volatility" => self.volatility,
            "move_ease" => self.move_ease,
            "trap_susceptibility" => self.trap_susceptibility,
            "king_exposure" => self.king_exposure,
            "castling_status" => self.castling_status,
            "defending_pieces" => self.defending_pieces,
            "doubled_pawns" => self.doubled_pawns,
            "backward_pawns" => self.backward_pawns,
            "pawn_majority" => self.pawn_majority,
            "mobility" => self.mobility,
            "piece_coordination" => self.piece_coordination,
            "hanging_pieces" => self.hanging_pieces,
            "rooks_connected" => self.rooks_connected,
            "bishop_pair" => self.bishop_pair,
            "overworked_defenders" => self.overworked_defenders,
            "pins" => self.pins,
            "tactical_motifs" => self.tactical_motifs,
            "material_imbalance" => self.material_imbalance,
            "phase" => self.phase,
            "space_control" => self.space_control,
            "passed_pawns" => self.passed_pawns,
            "center_control" => self.center_control,
            "stockfish_eval" => f64::from(self.stockfish_eval),
            _ => return None,
        };
        Some(v)
    }

    /// All numeric features as `(name, value)` pairs, in [`FEATURE_NAMES`] order.
    pub fn numeric_features(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES
            .iter()
            .filter_map(|&name| self.value(name).map(|v| (name, v)))
            .collect()
    }
}

/// Computes the full feature record for `position`.
///
/// Runs two searches through `engine`: one at `config.depth` for the
/// move scores and one at `config.shallow_depth` for trap detection.
/// The position itself is never modified.
pub fn compute_features<E: Engine + ?Sized>(
    position: &Chess,
    engine: &mut E,
    config: &FeatureConfig,
) -> Result<FeatureRecord, PlayabilityError> {
    let mate = config.mate_score;
    let deep = evaluate_all_moves(position, engine, config.depth, mate)?;
    let shallow = evaluate_all_moves(position, engine, config.shallow_depth, mate)?;

    let board = position.board();
    let mover = position.turn();
    let our_pawns = pawns::PawnFiles::new(board, mover);
    let their_pawns = pawns::PawnFiles::new(board, mover.other());
    let pins = activity::pins(board, mover);

    let record = FeatureRecord {
        volatility: volatility(&deep, mate),
        move_ease: move_ease(position, &deep, config.forcing_moves_only),
        trap_susceptibility: trap_susceptibility(&shallow, &deep, mate),
        king_exposure: king::king_exposure(board, mover, &config.king_attackers),
        castling_status: king::castling_status(position),
        defending_pieces: king::defending_pieces(board, mover, &config.king_defenders),
        doubled_pawns: pawns::doubled_pawns(&our_pawns, &their_pawns),
        backward_pawns: pawns::backward_pawns(&our_pawns, &their_pawns, mover),
        pawn_majority: pawns::pawn_majority(&our_pawns, &their_pawns),
        mobility: activity::mobility(position),
        piece_coordination: activity::piece_coordination(board, mover),
        hanging_pieces: activity::hanging_pieces(board, mover),
        rooks_connected: activity::rooks_connected(board, mover),
        bishop_pair: activity::bishop_pair(board, mover),
        overworked_defenders: activity::overworked_defenders(board, mover),
        pins,
        tactical_motifs: pins,
        material_imbalance: material::material_imbalance(board, mover),
        phase: material::phase(board),
        space_control: material::space_control(board, mover),
        passed_pawns: pawns::passed_pawns(board, mover),
        center_control: material::center_control(board, mover),
        stockfish_eval: deep.best_eval,
        top_moves: deep.scores.iter().map(|m| m.uci.to_string()).collect(),
        evals: deep
            .scores
            .iter()
            .map(|m| (m.uci.to_string(), m.score))
            .collect(),
    };
    log::debug!(
        "features: volatility {:.3}, ease {:.3}, traps {:.3}, eval {}",
        record.volatility,
        record.move_ease,
        record.trap_susceptibility,
        record.stockfish_eval
    );
    Ok(record)
}
