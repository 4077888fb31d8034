//! Bulk import of cards from pasted text
//!
//! One card per line. Each line is split on `|` first, then on a tab, then
//! on `,`, whichever yields at least two parts.

const SEPARATORS: [char; 3] = ['|', '\t', ','];

/// Parse raw text into `(front, back)` pairs.
///
/// Lines without a non-empty front and back are skipped. Parts after the
/// second are ignored.
pub fn parse_import(text: &str) -> Vec<(String, String)> {
    text.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let mut parts: Vec<&str> = Vec::new();
    for sep in SEPARATORS {
        parts = line.split(sep).map(str::trim).collect();
        if parts.len() >= 2 {
            break;
        }
    }

    match parts.as_slice() {
        [front, back, ..] if !front.is_empty() && !back.is_empty() => {
            Some((front.to_string(), back.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_preference() {
        let cards = parse_import("a | b\nc\td\ne, f\n");
        assert_eq!(
            cards,
            vec![
                ("a".to_string(), "b".to_string()),
                ("c".to_string(), "d".to_string()),
                ("e".to_string(), "f".to_string()),
            ]
        );
    }

    #[test]
    fn test_pipe_wins_over_comma() {
        let cards = parse_import("hello, world | greeting");
        assert_eq!(cards, vec![("hello, world".to_string(), "greeting".to_string())]);
    }

    #[test]
    fn test_skips_incomplete_lines() {
        let cards = parse_import("only front\n | back\nfront |  \n\nok|yes|extra");
        assert_eq!(cards, vec![("ok".to_string(), "yes".to_string())]);
    }

    #[test]
    fn test_crlf_lines() {
        let cards = parse_import("q1|a1\r\nq2|a2\r\n");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1], ("q2".to_string(), "a2".to_string()));
    }
}
