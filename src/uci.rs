//! Parsing of engine output lines.

use shakmaty::uci::UciMove;

use crate::types::{AnalysisLine, Score};

/// Parses an `info` line into an [`AnalysisLine`].
///
/// Returns `None` for lines that carry no principal variation
/// (`info string`, `currmove` updates, bare depth reports).
pub fn parse_info_line(line: &str) -> Option<AnalysisLine> {
    let mut it = line.split_whitespace();
    if it.next() != Some("info") {
        return None;
    }

    let mut out = AnalysisLine {
        multipv: 1,
        depth: None,
        score: None,
        pv: Vec::new(),
    };
    while let Some(tok) = it.next() {
        match tok {
            "string" => return None,
            "depth" => out.depth = it.next().and_then(|s| s.parse().ok()),
            "multipv" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    out.multipv = v;
                }
            }
            "score" => match it.next() {
                Some("cp") => out.score = it.next().and_then(|s| s.parse().ok()).map(Score::Cp),
                Some("mate") => {
                    out.score = it.next().and_then(|s| s.parse().ok()).map(Score::Mate)
                }
                _ => {}
            },
            "pv" => {
                // pv runs to the end of the line
                out.pv = it.by_ref().map_while(|s| s.parse::<UciMove>().ok()).collect();
                break;
            }
            _ => {}
        }
    }

    if out.pv.is_empty() { None } else { Some(out) }
}

/// Extracts the option name from an `option name <..> type <..>` line.
pub fn parse_option_name(line: &str) -> Option<String> {
    let rest = line.strip_prefix("option name ")?;
    let name: Vec<&str> = rest
        .split_whitespace()
        .take_while(|&t| t != "type")
        .collect();
    if name.is_empty() { None } else { Some(name.join(" ")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multipv_centipawn_line() {
        let line = "info depth 6 seldepth 7 multipv 3 score cp -42 nodes 5123 nps 512300 \
                    tbhits 0 time 10 pv g1f3 d7d5 d2d4";
        let parsed = parse_info_line(line).unwrap();
        assert_eq!(parsed.multipv, 3);
        assert_eq!(parsed.depth, Some(6));
        assert_eq!(parsed.score, Some(Score::Cp(-42)));
        assert_eq!(parsed.pv.len(), 3);
        assert_eq!(parsed.pv[0].to_string(), "g1f3");
    }

    #[test]
    fn parses_mate_and_bounds() {
        let line = "info depth 3 multipv 1 score mate -2 upperbound nodes 10 pv e1e2";
        let parsed = parse_info_line(line).unwrap();
        assert_eq!(parsed.score, Some(Score::Mate(-2)));
        assert_eq!(parsed.pv[0].to_string(), "e1e2");
    }

    #[test]
    fn ignores_lines_without_pv() {
        assert!(parse_info_line("info depth 1 currmove e2e4 currmovenumber 1").is_none());
        assert!(parse_info_line("info string NNUE evaluation using nn.nnue").is_none());
        assert!(parse_info_line("bestmove e2e4 ponder e7e5").is_none());
    }

    #[test]
    fn defaults_multipv_to_one() {
        let parsed = parse_info_line("info depth 2 score cp 10 pv e2e4").unwrap();
        assert_eq!(parsed.multipv, 1);
    }

    #[test]
    fn option_names_may_contain_spaces() {
        assert_eq!(
            parse_option_name("option name Skill Level type spin default 20 min 0 max 20"),
            Some("Skill Level".to_string())
        );
        assert_eq!(parse_option_name("id name Stockfish"), None);
    }
}
