use std::collections::{BTreeSet, HashMap};

use chess_playability::shakmaty::{CastlingMode, Chess, EnPassantMode, Position, fen::Fen};
use chess_playability::{
    AnalysisLine, Analyzer, Engine, FEATURE_NAMES, FeatureConfig, FeatureSets, MATE_SCORE,
    PlayabilityError, Score, TimeControl, compute_features, evaluate_all_moves, feature_tensor,
    position_from_fen,
};
use pretty_assertions::assert_eq;

/// Answers from a fixed table per depth and records every request.
#[derive(Default)]
struct ScriptedEngine {
    by_depth: HashMap<u32, Vec<(&'static str, Score)>>,
    calls: Vec<(u32, usize)>,
}

impl ScriptedEngine {
    fn at(mut self, depth: u32, lines: &[(&'static str, Score)]) -> Self {
        self.by_depth.insert(depth, lines.to_vec());
        self
    }
}

impl Engine for ScriptedEngine {
    fn analyse(
        &mut self,
        _position: &Chess,
        depth: u32,
        multipv: usize,
    ) -> Result<Vec<AnalysisLine>, PlayabilityError> {
        self.calls.push((depth, multipv));
        let lines = self.by_depth.get(&depth).cloned().unwrap_or_default();
        Ok(lines
            .into_iter()
            .take(multipv)
            .enumerate()
            .map(|(i, (uci, score))| AnalysisLine {
                multipv: i + 1,
                depth: Some(depth),
                score: Some(score),
                pv: vec![uci.parse().unwrap()],
            })
            .collect())
    }
}

fn start_engine() -> ScriptedEngine {
    ScriptedEngine::default()
        .at(
            6,
            &[
                ("e2e4", Score::Cp(40)),
                ("d2d4", Score::Cp(35)),
                ("g1f3", Score::Cp(30)),
                ("f2f3", Score::Cp(-60)),
            ],
        )
        .at(
            1,
            &[("e2e4", Score::Cp(50)), ("f2f3", Score::Cp(45)), ("d2d4", Score::Cp(30))],
        )
}

fn fen_of(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

fn legal_ucis(position: &Chess) -> BTreeSet<String> {
    position
        .legal_moves()
        .iter()
        .map(|m| m.to_uci(CastlingMode::Standard).to_string())
        .collect()
}

#[test]
fn evals_cover_exactly_the_legal_moves() {
    let pos = Chess::default();
    let record = compute_features(&pos, &mut start_engine(), &FeatureConfig::default()).unwrap();

    let keys: BTreeSet<String> = record.evals.keys().cloned().collect();
    assert_eq!(keys, legal_ucis(&pos));
    assert_eq!(record.top_moves.len(), 20);
    assert_eq!(record.stockfish_eval, 40);
    assert_eq!(record.stockfish_eval, *record.evals.values().max().unwrap());
}

#[test]
fn runs_one_deep_and_one_shallow_search() {
    let mut engine = start_engine();
    compute_features(&Chess::default(), &mut engine, &FeatureConfig::default()).unwrap();
    assert_eq!(engine.calls, vec![(6, 20), (1, 20)]);
}

#[test]
fn position_is_left_untouched() {
    let pos =
        position_from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
            .unwrap();
    let before = fen_of(&pos);
    compute_features(&pos, &mut ScriptedEngine::default(), &FeatureConfig::default()).unwrap();
    assert_eq!(fen_of(&pos), before);
}

#[test]
fn ratios_stay_in_unit_interval() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        "4k3/8/8/8/8/8/8/R3K3 w Q - 0 1",
        "6k1/5ppp/8/8/8/8/5PPP/3Q2K1 b - - 0 1",
    ];
    for fen in fens {
        let pos = position_from_fen(fen).unwrap();
        let record =
            compute_features(&pos, &mut start_engine(), &FeatureConfig::default()).unwrap();
        for value in [record.piece_coordination, record.move_ease, record.trap_susceptibility] {
            assert!((0.0..=1.0).contains(&value), "{fen}: {value}");
        }
    }
}

#[test]
fn single_legal_move_is_not_volatile() {
    // the king must take the queen
    let pos = position_from_fen("k7/8/8/8/8/8/1q6/K7 w - - 0 1").unwrap();
    assert_eq!(legal_ucis(&pos).len(), 1);
    let mut engine = ScriptedEngine::default().at(6, &[("a1b2", Score::Cp(0))]);
    let record = compute_features(&pos, &mut engine, &FeatureConfig::default()).unwrap();
    assert_eq!(record.volatility, 0.0);
}

#[test]
fn recomputing_gives_the_same_record() {
    let pos = Chess::default();
    let config = FeatureConfig::default();
    let first = compute_features(&pos, &mut start_engine(), &config).unwrap();
    let second = compute_features(&pos, &mut start_engine(), &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn start_position_scenario() {
    let record =
        compute_features(&Chess::default(), &mut start_engine(), &FeatureConfig::default())
            .unwrap();
    assert_eq!(record.phase, 0.0);
    assert_eq!(record.bishop_pair, 1.0);
    assert_eq!(record.material_imbalance, 0.0);
    assert_eq!(record.king_exposure, 0.0);
    assert_eq!(record.castling_status, 3.0);
    assert_eq!(record.pins, record.tactical_motifs);
}

#[test]
fn mate_in_one_reports_the_sentinel() {
    let pos = position_from_fen("6k1/5ppp/8/8/8/8/5PPP/3Q2K1 w - - 0 1").unwrap();
    let mut engine = ScriptedEngine::default()
        .at(6, &[("d1d8", Score::Mate(1)), ("d1d2", Score::Cp(150))])
        .at(1, &[("d1d8", Score::Mate(1))]);
    let record = compute_features(&pos, &mut engine, &FeatureConfig::default()).unwrap();
    assert_eq!(record.stockfish_eval, MATE_SCORE);
    // the mate survives the deeper search, so it is not a trap
    assert_eq!(record.trap_susceptibility, 0.0);
}

#[test]
fn rooks_connected_scenarios() {
    let config = FeatureConfig::default();
    let connected = position_from_fen("4k3/8/8/8/8/8/8/R4RK1 w - - 0 1").unwrap();
    let record = compute_features(&connected, &mut ScriptedEngine::default(), &config).unwrap();
    assert_eq!(record.rooks_connected, 1.0);

    let three = position_from_fen("4k3/8/8/8/8/8/R7/R4RK1 w - - 0 1").unwrap();
    let record = compute_features(&three, &mut ScriptedEngine::default(), &config).unwrap();
    assert_eq!(record.rooks_connected, 0.0);
}

#[test]
fn features_are_mover_relative() {
    // same placement, different side to move
    let white = position_from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
    let black = position_from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
    let config = FeatureConfig::default();
    let w = compute_features(&white, &mut ScriptedEngine::default(), &config).unwrap();
    let b = compute_features(&black, &mut ScriptedEngine::default(), &config).unwrap();
    assert_eq!(w.material_imbalance, 5.0);
    assert_eq!(b.material_imbalance, -5.0);
    assert_eq!(w.space_control, -b.space_control);
}

#[test]
fn best_eval_is_the_maximum() {
    let mut engine = ScriptedEngine::default()
        .at(3, &[("e2e4", Score::Cp(-20)), ("d2d4", Score::Cp(-5))]);
    let eval = evaluate_all_moves(&Chess::default(), &mut engine, 3, MATE_SCORE).unwrap();
    assert_eq!(eval.len(), 20);
    assert_eq!(Some(eval.best_eval), eval.values().max());
}

#[test]
fn feature_tensor_follows_the_requested_order() {
    let record =
        compute_features(&Chess::default(), &mut start_engine(), &FeatureConfig::default())
            .unwrap();
    let names = vec!["bishop_pair".to_string(), "stockfish_eval".to_string()];
    let tensor = feature_tensor(&record, &names).unwrap();
    assert_eq!(tensor.shape(), &[1, 2]);
    assert_eq!(tensor[[0, 0]], 1.0);
    assert_eq!(tensor[[0, 1]], 40.0);

    let unknown = feature_tensor(&record, &["top_moves".to_string()]);
    assert!(matches!(unknown, Err(PlayabilityError::UnknownFeature(_))));
}

#[test]
fn missing_models_predict_neutral() {
    let dir = std::env::temp_dir().join("chess-playability-no-models");
    let mut analyzer = Analyzer::new(dir, FeatureSets::default(), FeatureConfig::default());
    let analysis = analyzer
        .analyze(&Chess::default(), 1500, TimeControl::Blitz, &mut start_engine())
        .unwrap();

    assert_eq!(analysis.raw_scores.position_quality, 0.5);
    assert_eq!(analysis.raw_scores.move_ease, 0.5);
    assert_eq!(analysis.position_quality, 0.0);
    assert_eq!(analysis.move_ease, 0.0);
    assert_eq!(analysis.features.len(), FEATURE_NAMES.len());
    assert_eq!(analysis.elo_range.to_string(), "1400-1600");
    assert_eq!(analysis.model_info.position_quality, None);
    assert_eq!(analysis.model_info.move_ease, None);

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["time_control"], "blitz");
    assert_eq!(json["elo_range"], "1400-1600");
    assert!(json["model_info"]["move_ease"].is_null());
}
