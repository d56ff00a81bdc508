#![cfg(unix)]

use chess_playability::shakmaty::{Chess, Position, uci::UciMove};
use chess_playability::{Engine, EngineConfig, PlayabilityError, Score, UciEngine};
use pretty_assertions::assert_eq;

/// A UCI engine whose first search overruns any short deadline and whose
/// later searches answer immediately with a different move.
const SLOW_FIRST_SEARCH: &str = r#"
n=0
while read -r line; do
  case "$line" in
    uci) echo "id name slowstart"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      n=$((n + 1))
      if [ "$n" -eq 1 ]; then
        sleep 0.5
        echo "info depth 1 multipv 1 score cp 777 pv e2e4"
        echo "bestmove e2e4"
      else
        echo "info depth 1 multipv 1 score cp 5 pv a7a6"
        echo "bestmove a7a6"
      fi
      ;;
    quit) exit 0 ;;
  esac
done
"#;

fn scripted(script: &str, timeout_ms: Option<u64>) -> UciEngine {
    let config = EngineConfig {
        path: "sh".into(),
        args: vec!["-c".to_string(), script.to_string()],
        timeout_ms,
        ..EngineConfig::default()
    };
    UciEngine::spawn(&config).unwrap()
}

fn after_e4() -> Chess {
    let e4: UciMove = "e2e4".parse().unwrap();
    let pos = Chess::default();
    let m = e4.to_move(&pos).unwrap();
    pos.play(m).unwrap()
}

#[test]
fn handshake_reads_the_engine_name() {
    let engine = scripted(SLOW_FIRST_SEARCH, Some(1000));
    assert_eq!(engine.id_name.as_deref(), Some("slowstart"));
}

#[test]
fn timed_out_search_does_not_leak_into_the_next_one() {
    let mut engine = scripted(SLOW_FIRST_SEARCH, Some(100));

    let first = engine.analyse(&Chess::default(), 10, 1);
    assert!(matches!(first, Err(PlayabilityError::EngineTimeout(_))));

    let lines = engine.analyse(&after_e4(), 10, 1).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].score, Some(Score::Cp(5)));
    assert_eq!(lines[0].pv[0].to_string(), "a7a6");
}
