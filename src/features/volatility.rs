use crate::types::MoveEvaluation;

const MAX_SEVERITY: f64 = 3.0;

/// How badly a single move spoils the position, given the best score.
///
/// The scale depends on what is at stake: losing a forced mate, throwing
/// away a winning advantage, deepening a lost position, collapsing from
/// equality, or a plain large drop.
pub fn blunder_severity(best: i32, eval: i32, mate_score: i32) -> f64 {
    let best_f = f64::from(best);
    let ev = f64::from(eval);
    let loss = best_f - ev;

    let severity = if best.abs() >= mate_score {
        if eval < 1000 { (1000.0 - ev) / 1000.0 } else { 0.0 }
    } else if best >= 300 {
        if loss >= 0.8 * best_f.abs() { loss / best_f.abs() } else { 0.0 }
    } else if best <= -300 {
        if ev <= 2.0 * best_f {
            (ev - best_f).abs() / best_f.abs() / 2.0
        } else {
            0.0
        }
    } else if (-100..=100).contains(&best) {
        if eval <= -200 { -ev / 200.0 * 0.7 } else { 0.0 }
    } else if loss >= 250.0 {
        loss / 250.0
    } else {
        0.0
    };
    severity.min(MAX_SEVERITY)
}

/// Sample variance divided by the squared range, 0 for a flat list.
fn dispersion(values: &[f64]) -> f64 {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if range <= 0.0 || values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance / (range * range + 1e-6)
}

/// `0.7 * mean blunder severity + 0.3 * dispersion` over all move scores.
pub fn volatility(eval: &MoveEvaluation, mate_score: i32) -> f64 {
    if eval.len() < 2 {
        return 0.0;
    }
    let total: f64 = eval
        .values()
        .map(|v| blunder_severity(eval.best_eval, v, mate_score))
        .sum();
    let blunder_ratio = total / eval.len() as f64;

    let values: Vec<f64> = eval.values().map(f64::from).collect();
    0.7 * blunder_ratio + 0.3 * dispersion(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::MATE_SCORE, types::MoveScore};

    fn evaluation(scores: &[i32]) -> MoveEvaluation {
        // the moves themselves do not matter here
        let squares = ["a2a3", "b2b3", "c2c3", "d2d3", "e2e3", "f2f3", "g2g3", "h2h3"];
        MoveEvaluation {
            best_eval: scores.iter().copied().max().unwrap_or(0),
            scores: scores
                .iter()
                .zip(squares)
                .map(|(&score, uci)| MoveScore { uci: uci.parse().unwrap(), score })
                .collect(),
        }
    }

    #[test]
    fn single_move_is_not_volatile() {
        assert_eq!(volatility(&evaluation(&[-400]), MATE_SCORE), 0.0);
        assert_eq!(volatility(&MoveEvaluation::default(), MATE_SCORE), 0.0);
    }

    #[test]
    fn flat_scores_have_no_dispersion() {
        assert_eq!(volatility(&evaluation(&[20, 20, 20]), MATE_SCORE), 0.0);
    }

    #[test]
    fn severity_rules() {
        // missing a mate: (1000 - 0) / 1000
        assert!((blunder_severity(MATE_SCORE, 0, MATE_SCORE) - 1.0).abs() < 1e-9);
        assert_eq!(blunder_severity(MATE_SCORE, 1500, MATE_SCORE), 0.0);
        // winning position thrown away: 500 of 500
        assert!((blunder_severity(500, 0, MATE_SCORE) - 1.0).abs() < 1e-9);
        assert_eq!(blunder_severity(500, 200, MATE_SCORE), 0.0);
        // lost position doubled: |-800 - -400| / 400 / 2
        assert!((blunder_severity(-400, -800, MATE_SCORE) - 0.5).abs() < 1e-9);
        // equal position collapsing: 400 / 200 * 0.7
        assert!((blunder_severity(0, -400, MATE_SCORE) - 1.4).abs() < 1e-9);
        // mild edge, large drop: 500 / 250
        assert!((blunder_severity(200, -300, MATE_SCORE) - 2.0).abs() < 1e-9);
        assert_eq!(blunder_severity(200, 0, MATE_SCORE), 0.0);
    }

    #[test]
    fn severities_are_capped() {
        assert_eq!(blunder_severity(0, -MATE_SCORE, MATE_SCORE), 3.0);
        assert_eq!(blunder_severity(MATE_SCORE, -MATE_SCORE, MATE_SCORE), 3.0);
    }

    #[test]
    fn two_move_example() {
        // best 0; the -400 move has severity 1.4; variance 80000 over range 400^2
        let v = volatility(&evaluation(&[0, -400]), MATE_SCORE);
        let expected = 0.7 * (1.4 / 2.0) + 0.3 * (80_000.0 / (160_000.0 + 1e-6));
        assert!((v - expected).abs() < 1e-9, "got {v}");
    }
}
