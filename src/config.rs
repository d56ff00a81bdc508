//! Tunable constants for feature extraction and engine startup.
//!
//! Every field has a default, so a JSON file only needs to mention
//! the values it wants to change.

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use shakmaty::Role;

use crate::error::PlayabilityError;

/// Score used for a forced mate, signed from the mover's point of view.
pub const MATE_SCORE: i32 = 100_000;

/// Weights per piece role, indexed pawn..king.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleWeights {
    pub pawn: f64,
    pub knight: f64,
    pub bishop: f64,
    pub rook: f64,
    pub queen: f64,
    pub king: f64,
}

impl RoleWeights {
    pub fn get(&self, role: Role) -> f64 {
        match role {
            Role::Pawn => self.pawn,
            Role::Knight => self.knight,
            Role::Bishop => self.bishop,
            Role::Rook => self.rook,
            Role::Queen => self.queen,
            Role::King => self.king,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub mate_score: i32,
    /// Primary search depth.
    pub depth: u32,
    /// Depth of the second, cheaper search used for trap detection.
    pub shallow_depth: u32,
    /// Weight of an enemy attacker on a square next to the mover's king.
    pub king_attackers: RoleWeights,
    /// Weight of an own piece within two squares of the mover's king.
    pub king_defenders: RoleWeights,
    /// Only checks and captures add to the move ease numerator.
    pub forcing_moves_only: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            mate_score: MATE_SCORE,
            depth: 6,
            shallow_depth: 1,
            king_attackers: RoleWeights {
                pawn: 0.7,
                knight: 0.5,
                bishop: 0.7,
                rook: 0.8,
                queen: 1.0,
                king: 0.9,
            },
            king_defenders: RoleWeights {
                pawn: 0.7,
                knight: 1.0,
                bishop: 1.2,
                rook: 1.5,
                queen: 2.0,
                king: 0.0,
            },
            forcing_moves_only: true,
        }
    }
}

impl FeatureConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlayabilityError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// How to launch and size a UCI engine process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub threads: u32,
    pub hash_mb: u32,
    /// Per-request deadline. `None` waits for the engine forever.
    pub timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockfish"),
            args: Vec::new(),
            threads: 1,
            hash_mb: 16,
            timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlayabilityError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
