//! Inline `**bold**` markup used in step titles and subtitles.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Lazy match between two `**` pairs; `.` stops at line breaks.
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("emphasis pattern is valid"));

/// A run of text, either plain or emphasized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Segment {
    Plain(String),
    Emphasized(String),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(t) | Self::Emphasized(t) => t,
        }
    }

    pub fn is_emphasized(&self) -> bool {
        matches!(self, Self::Emphasized(_))
    }
}

/// Split `text` into plain and emphasized segments.
///
/// Unmatched `**` stay in the plain text. Empty plain runs between adjacent
/// matches are dropped.
pub fn parse_emphasis(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in EMPHASIS.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            segments.push(Segment::Plain(text[cursor..whole.start()].to_string()));
        }
        segments.push(Segment::Emphasized(inner.as_str().to_string()));
        cursor = whole.end();
    }

    if cursor < text.len() {
        segments.push(Segment::Plain(text[cursor..].to_string()));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> Segment {
        Segment::Plain(s.to_string())
    }

    fn bold(s: &str) -> Segment {
        Segment::Emphasized(s.to_string())
    }

    #[test]
    fn emphasis_in_the_middle() {
        assert_eq!(
            parse_emphasis("a **b** c"),
            vec![plain("a "), bold("b"), plain(" c")]
        );
    }

    #[test]
    fn no_markup_is_one_plain_segment() {
        assert_eq!(parse_emphasis("no bold"), vec![plain("no bold")]);
    }

    #[test]
    fn adjacent_matches_have_nothing_between() {
        assert_eq!(parse_emphasis("**x****y**"), vec![bold("x"), bold("y")]);
    }

    #[test]
    fn multiple_matches() {
        let segs = parse_emphasis("How many **new recipes** in the **next 30 days**?");
        assert_eq!(
            segs,
            vec![
                plain("How many "),
                bold("new recipes"),
                plain(" in the "),
                bold("next 30 days"),
                plain("?"),
            ]
        );
    }

    #[test]
    fn unmatched_delimiter_is_literal() {
        assert_eq!(parse_emphasis("a **b"), vec![plain("a **b")]);
        assert_eq!(
            parse_emphasis("**a** and **b"),
            vec![bold("a"), plain(" and **b")]
        );
    }

    #[test]
    fn emphasis_does_not_cross_lines() {
        assert_eq!(parse_emphasis("**a\nb**"), vec![plain("**a\nb**")]);
    }

    #[test]
    fn empty_input_has_no_segments() {
        assert!(parse_emphasis("").is_empty());
    }

    #[test]
    fn segment_serializes_with_kind() {
        let json = serde_json::to_value(bold("hi")).unwrap();
        assert_eq!(json["kind"], "emphasized");
        assert_eq!(json["text"], "hi");
    }
}
