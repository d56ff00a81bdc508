//! Regression models on top of the feature record.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Once,
};

use ort::{session::Session, value::Tensor};
use serde::{Deserialize, Serialize};
use shakmaty::Chess;

use crate::{
    config::FeatureConfig,
    engine::Engine,
    error::PlayabilityError,
    features::{FEATURE_NAMES, FeatureRecord, compute_features},
    tensor::{EloBracket, Target, TimeControl, feature_tensor, model_file_name, score_to_eval_bar},
    types::Prediction,
};

/// Score reported when no model exists for a bracket.
pub const NEUTRAL_SCORE: f32 = 0.5;

const DEFAULT_INPUT: &str = "float_input";
const DEFAULT_OUTPUT: &str = "variable";

static BACKEND: Once = Once::new();

fn init_backend() {
    BACKEND.call_once(|| {
        ort::set_api(ort_tract::api());
    });
}

/// A single-output regression model taking a `[1, k]` float tensor.
pub struct PlayabilityModel {
    session: Session,
    input: String,
    output: String,
}

impl PlayabilityModel {
    /// Initialize from a local `.onnx` file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlayabilityError> {
        init_backend();
        let session = Session::builder()?.commit_from_file(path)?;
        Ok(Self::with_session(session))
    }

    /// Initialize from raw bytes
    pub fn from_memory(model_bytes: &[u8]) -> Result<Self, PlayabilityError> {
        init_backend();
        let session = Session::builder()?.commit_from_memory(model_bytes)?;
        Ok(Self::with_session(session))
    }

    fn with_session(session: Session) -> Self {
        Self {
            session,
            input: DEFAULT_INPUT.to_string(),
            output: DEFAULT_OUTPUT.to_string(),
        }
    }

    /// Overrides the tensor names used at inference time.
    pub fn with_io_names(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.input = input.into();
        self.output = output.into();
        self
    }

    pub fn predict(
        &mut self,
        record: &FeatureRecord,
        features: &[String],
    ) -> Result<f32, PlayabilityError> {
        let input = feature_tensor(record, features)?;
        let outputs = self.session.run(ort::inputs! {
            self.input.as_str() => Tensor::from_array(input)?,
        })?;
        let values = outputs[self.output.as_str()].try_extract_array::<f32>()?;
        values.iter().next().copied().ok_or(PlayabilityError::EmptyOutput)
    }
}

/// Which features each bracket's models were trained on.
///
/// JSON layout: `{ "<bracket>" | "default": { "<target>": ["feature", ..] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSets(HashMap<String, HashMap<String, Vec<String>>>);

impl FeatureSets {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlayabilityError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Features for a bracket and target, falling back to the `default`
    /// entry and then to every numeric feature.
    pub fn lookup(&self, bracket: EloBracket, target: Target) -> Vec<String> {
        let find = |key: &str| self.0.get(key).and_then(|sets| sets.get(target.as_str()));
        if let Some(names) = find(bracket.as_str()) {
            return names.clone();
        }
        if let Some(names) = find("default") {
            log::warn!("no feature set for {bracket}/{target}, using default");
            return names.clone();
        }
        log::warn!("no feature set for {bracket}/{target}, using all features");
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }
}

/// Held-out statistics of one trained model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMetrics {
    pub rmse: Option<f64>,
    pub r2: Option<f64>,
    pub n_games: Option<u64>,
    pub n_positions: Option<u64>,
}

impl ModelMetrics {
    /// `1 - rmse`, floored at 0. Unknown without an rmse.
    pub fn certainty(&self) -> Option<f64> {
        self.rmse.map(|rmse| (1.0 - rmse).max(0.0))
    }
}

/// Training metrics for every model.
///
/// JSON layout: `{ "<bracket>": { "<tc>": { "<target>": { "rmse": .., .. } } } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsTable(HashMap<String, HashMap<String, HashMap<String, ModelMetrics>>>);

impl MetricsTable {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlayabilityError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn get(
        &self,
        bracket: EloBracket,
        tc: TimeControl,
        target: Target,
    ) -> Option<&ModelMetrics> {
        self.0
            .get(bracket.as_str())?
            .get(tc.as_str())?
            .get(target.as_str())
    }
}

/// How far a prediction can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelInfo {
    pub certainty: Option<f64>,
    pub n_games: Option<u64>,
    pub n_positions: Option<u64>,
}

impl From<&ModelMetrics> for ModelInfo {
    fn from(metrics: &ModelMetrics) -> Self {
        Self {
            certainty: metrics.certainty(),
            n_games: metrics.n_games,
            n_positions: metrics.n_positions,
        }
    }
}

/// Per-target [`ModelInfo`]; `None` where no metrics were recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelReport {
    pub position_quality: Option<ModelInfo>,
    pub move_ease: Option<ModelInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawScores {
    pub position_quality: f32,
    pub move_ease: f32,
}

/// Result of analysing one position for one rating and time control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Eval-bar value of the position quality prediction.
    pub position_quality: f32,
    /// Eval-bar value of the move ease prediction.
    pub move_ease: f32,
    pub raw_scores: RawScores,
    pub model_info: ModelReport,
    /// Numeric features only.
    pub features: BTreeMap<String, f64>,
    pub elo_range: EloBracket,
    pub time_control: TimeControl,
}

type ModelKey = (EloBracket, TimeControl, Target);

/// Computes features and runs the matching models.
///
/// Models are read from `model_dir` on first use and cached, including
/// the fact that a model is missing.
pub struct Analyzer {
    model_dir: PathBuf,
    feature_sets: FeatureSets,
    config: FeatureConfig,
    metrics: MetricsTable,
    models: HashMap<ModelKey, Option<PlayabilityModel>>,
}

impl Analyzer {
    pub fn new(
        model_dir: impl Into<PathBuf>,
        feature_sets: FeatureSets,
        config: FeatureConfig,
    ) -> Self {
        Self {
            model_dir: model_dir.into(),
            feature_sets,
            config,
            metrics: MetricsTable::default(),
            models: HashMap::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsTable) -> Self {
        self.metrics = metrics;
        self
    }

    /// Certainty and training counts of the model behind one target.
    pub fn model_info(
        &self,
        bracket: EloBracket,
        tc: TimeControl,
        target: Target,
    ) -> Option<ModelInfo> {
        self.metrics.get(bracket, tc, target).map(ModelInfo::from)
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    fn model(&mut self, key: ModelKey) -> Result<Option<&mut PlayabilityModel>, PlayabilityError> {
        if !self.models.contains_key(&key) {
            let (bracket, tc, target) = key;
            let path = self.model_dir.join(model_file_name(bracket, tc, target));
            let model = if path.is_file() {
                log::info!("loading model {}", path.display());
                Some(PlayabilityModel::from_file(&path)?)
            } else {
                log::warn!("no model at {}, predicting neutral", path.display());
                None
            };
            self.models.insert(key, model);
        }
        Ok(self.models.get_mut(&key).and_then(Option::as_mut))
    }

    /// Prediction for one target. Without a model the score is neutral and
    /// the eval bar is 0.
    pub fn predict(
        &mut self,
        record: &FeatureRecord,
        bracket: EloBracket,
        tc: TimeControl,
        target: Target,
    ) -> Result<Prediction, PlayabilityError> {
        let features = self.feature_sets.lookup(bracket, target);
        match self.model((bracket, tc, target))? {
            Some(model) => {
                let raw = model.predict(record, &features)?;
                Ok(Prediction {
                    raw,
                    eval_bar: score_to_eval_bar(raw, 10.0, 3.0),
                })
            }
            None => Ok(Prediction {
                raw: NEUTRAL_SCORE,
                eval_bar: 0.0,
            }),
        }
    }

    pub fn analyze<E: Engine + ?Sized>(
        &mut self,
        position: &Chess,
        elo: u32,
        tc: TimeControl,
        engine: &mut E,
    ) -> Result<Analysis, PlayabilityError> {
        let record = compute_features(position, engine, &self.config)?;
        let bracket = EloBracket::from_elo(elo);
        let quality = self.predict(&record, bracket, tc, Target::PositionQuality)?;
        let ease = self.predict(&record, bracket, tc, Target::MoveEase)?;

        Ok(Analysis {
            position_quality: quality.eval_bar,
            move_ease: ease.eval_bar,
            raw_scores: RawScores {
                position_quality: quality.raw,
                move_ease: ease.raw,
            },
            model_info: ModelReport {
                position_quality: self.model_info(bracket, tc, Target::PositionQuality),
                move_ease: self.model_info(bracket, tc, Target::MoveEase),
            },
            features: record
                .numeric_features()
                .into_iter()
                .map(|(name, v)| (name.to_string(), v))
                .collect(),
            elo_range: bracket,
            time_control: tc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_set_fallbacks() {
        let sets: FeatureSets = serde_json::from_str(
            r#"{
                "1400-1600": { "label_move_ease": ["move_ease", "mobility"] },
                "default": {
                    "label_move_ease": ["volatility"],
                    "label_position_quality": ["phase"]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            sets.lookup(EloBracket::To1600, Target::MoveEase),
            vec!["move_ease".to_string(), "mobility".to_string()]
        );
        assert_eq!(
            sets.lookup(EloBracket::To1600, Target::PositionQuality),
            vec!["phase".to_string()]
        );
        assert_eq!(
            sets.lookup(EloBracket::Above2200, Target::MoveEase),
            vec!["volatility".to_string()]
        );
        assert_eq!(
            FeatureSets::default().lookup(EloBracket::Below800, Target::MoveEase).len(),
            FEATURE_NAMES.len()
        );
    }

    #[test]
    fn metrics_give_certainty_and_counts() {
        let metrics: MetricsTable = serde_json::from_str(
            r#"{
                "1400-1600": {
                    "blitz": {
                        "label_move_ease": {
                            "rmse": 0.12, "r2": 0.4, "n_games": 310, "n_positions": 9120
                        },
                        "label_position_quality": { "rmse": 1.7 }
                    }
                }
            }"#,
        )
        .unwrap();
        let analyzer = Analyzer::new("models", FeatureSets::default(), FeatureConfig::default())
            .with_metrics(metrics);

        let ease = analyzer
            .model_info(EloBracket::To1600, TimeControl::Blitz, Target::MoveEase)
            .unwrap();
        assert!((ease.certainty.unwrap() - 0.88).abs() < 1e-9);
        assert_eq!(ease.n_games, Some(310));
        assert_eq!(ease.n_positions, Some(9120));

        // an rmse above 1 floors at zero certainty
        let quality = analyzer
            .model_info(EloBracket::To1600, TimeControl::Blitz, Target::PositionQuality)
            .unwrap();
        assert_eq!(quality.certainty, Some(0.0));
        assert_eq!(quality.n_games, None);

        assert_eq!(
            analyzer.model_info(EloBracket::To1600, TimeControl::RapidClassical, Target::MoveEase),
            None
        );
    }
}
