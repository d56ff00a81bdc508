use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{error::PlayabilityError, features::FeatureRecord};

/// Rating bucket a model was trained on.
///
/// - Ratings below 800 map to `"800-"`.
/// - Ratings up to 2200 are bucketed at 1100, 1400, 1600, 1800, 2000 and
///   2200 (inclusive upper bounds).
/// - Anything higher maps to `"2200+"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EloBracket {
    #[serde(rename = "800-")]
    Below800,
    #[serde(rename = "800-1100")]
    To1100,
    #[serde(rename = "1100-1400")]
    To1400,
    #[serde(rename = "1400-1600")]
    To1600,
    #[serde(rename = "1600-1800")]
    To1800,
    #[serde(rename = "1800-2000")]
    To2000,
    #[serde(rename = "2000-2200")]
    To2200,
    #[serde(rename = "2200+")]
    Above2200,
}

impl EloBracket {
    pub fn from_elo(elo: u32) -> Self {
        match elo {
            0..800 => Self::Below800,
            800..=1100 => Self::To1100,
            1101..=1400 => Self::To1400,
            1401..=1600 => Self::To1600,
            1601..=1800 => Self::To1800,
            1801..=2000 => Self::To2000,
            2001..=2200 => Self::To2200,
            _ => Self::Above2200,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Below800 => "800-",
            Self::To1100 => "800-1100",
            Self::To1400 => "1100-1400",
            Self::To1600 => "1400-1600",
            Self::To1800 => "1600-1800",
            Self::To2000 => "1800-2000",
            Self::To2200 => "2000-2200",
            Self::Above2200 => "2200+",
        }
    }
}

impl fmt::Display for EloBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeControl {
    Blitz,
    RapidClassical,
}

impl TimeControl {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blitz => "blitz",
            Self::RapidClassical => "rapid_classical",
        }
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    #[serde(rename = "label_position_quality")]
    PositionQuality,
    #[serde(rename = "label_move_ease")]
    MoveEase,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::PositionQuality, Target::MoveEase];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PositionQuality => "label_position_quality",
            Self::MoveEase => "label_move_ease",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File name of the model for one bracket, time control and target.
pub fn model_file_name(bracket: EloBracket, tc: TimeControl, target: Target) -> String {
    format!("model_{bracket}_{tc}_{target}.onnx")
}

/// Builds the `[1, k]` model input from the named features, in order.
pub fn feature_tensor(
    record: &FeatureRecord,
    names: &[String],
) -> Result<Array2<f32>, PlayabilityError> {
    let values = names
        .iter()
        .map(|name| {
            record
                .value(name)
                .map(|v| v as f32)
                .ok_or_else(|| PlayabilityError::UnknownFeature(name.clone()))
        })
        .collect::<Result<Vec<f32>, _>>()?;
    Ok(Array2::from_shape_vec((1, values.len()), values)?)
}

/// Maps a 0..1 model score onto an engine-style eval bar.
///
/// The curve is logarithmic near 0.5 and grows quadratically towards the
/// extremes, so 0.5 maps to 0 and 1.0 to a little over `max_eval`.
pub fn score_to_eval_bar(score: f32, max_eval: f32, extreme_scale: f32) -> f32 {
    let x = score - 0.5;
    let magnitude = max_eval * (1.0 + 10.0 * x.abs()).ln() / 11f32.ln() + x * x * extreme_scale;
    if x < 0.0 { -magnitude } else if x > 0.0 { magnitude } else { 0.0 }
}
