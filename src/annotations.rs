//! Extraction of `[%clk]` and `[%eval]` tokens from move comments.
//!
//! These tokens are a loose convention of online chess servers, not a formal
//! grammar; matching the two known shapes tolerates whatever other bracketed
//! annotations share the comment.

use crate::types::Eval;
use regex::Regex;
use std::sync::LazyLock;

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%clk\s*([0-9:.]+)\]").expect("valid clock annotation regex"));

static EVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%eval\s*([#\-0-9.]+)\]").expect("valid eval annotation regex"));

/// Clock reading from a comment like `{ [%eval 0.17] [%clk 0:00:30] }`.
///
/// Returns the captured time text verbatim; only the first `[%clk]` token is
/// considered.
pub fn extract_clock_time(comment: &str) -> Option<&str> {
    CLOCK_RE
        .captures(comment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Engine evaluation from a comment like `{ [%eval -3.15] }` or
/// `{ [%eval #5] }`.
///
/// A `#`-prefixed value is a mate distance with the written sign; anything
/// else is parsed as a pawn-unit score. Token text that matches the pattern
/// but fails to parse yields `None`.
pub fn extract_evaluation(comment: &str) -> Option<Eval> {
    let caps = EVAL_RE.captures(comment)?;
    let text = caps.get(1)?.as_str();

    if let Some(mate) = text.strip_prefix('#') {
        return mate.parse::<i32>().ok().map(Eval::Mate);
    }

    text.parse::<f64>().ok().map(Eval::Cp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_time_basic() {
        assert_eq!(extract_clock_time("[%clk 0:05:30]"), Some("0:05:30"));
        assert_eq!(extract_clock_time("[%clk 0:03:00]"), Some("0:03:00"));
    }

    #[test]
    fn test_clock_time_absent() {
        assert_eq!(extract_clock_time(""), None);
        assert_eq!(extract_clock_time("no annotation here"), None);
        assert_eq!(extract_clock_time("[%eval 0.17]"), None);
    }

    #[test]
    fn test_clock_time_fractional_seconds() {
        assert_eq!(extract_clock_time("[%clk 0:00:05.2]"), Some("0:00:05.2"));
    }

    #[test]
    fn test_clock_time_multi_digit_hours() {
        assert_eq!(extract_clock_time("[%clk 10:00:00]"), Some("10:00:00"));
    }

    #[test]
    fn test_clock_time_first_token_wins() {
        assert_eq!(
            extract_clock_time("[%clk 0:01:00] [%clk 0:02:00]"),
            Some("0:01:00")
        );
    }

    #[test]
    fn test_eval_numeric() {
        assert_eq!(extract_evaluation("[%eval 0.17]"), Some(Eval::Cp(0.17)));
        assert_eq!(extract_evaluation("[%eval -3.15]"), Some(Eval::Cp(-3.15)));
        assert_eq!(extract_evaluation("[%eval 0]"), Some(Eval::Cp(0.0)));
    }

    #[test]
    fn test_eval_mate_scores_keep_sign() {
        assert_eq!(extract_evaluation("[%eval #5]"), Some(Eval::Mate(5)));
        assert_eq!(extract_evaluation("[%eval #-5]"), Some(Eval::Mate(-5)));
    }

    #[test]
    fn test_eval_absent() {
        assert_eq!(extract_evaluation(""), None);
        assert_eq!(extract_evaluation("just words"), None);
        assert_eq!(extract_evaluation("[%clk 0:00:30]"), None);
    }

    #[test]
    fn test_eval_unparseable_inner_text_is_absent() {
        // Matches the character class but is not a number.
        assert_eq!(extract_evaluation("[%eval 1.2.3]"), None);
        assert_eq!(extract_evaluation("[%eval #]"), None);
    }

    #[test]
    fn test_both_tokens_in_one_comment_either_order() {
        let comment = "[%eval 0.17] [%clk 0:00:30]";
        assert_eq!(extract_clock_time(comment), Some("0:00:30"));
        assert_eq!(extract_evaluation(comment), Some(Eval::Cp(0.17)));

        let flipped = "[%clk 0:00:30] [%eval 0.17]";
        assert_eq!(extract_clock_time(flipped), Some("0:00:30"));
        assert_eq!(extract_evaluation(flipped), Some(Eval::Cp(0.17)));
    }

    #[test]
    fn test_unrelated_bracketed_tokens_are_ignored() {
        let comment = "[%csl Gd4] [%clk 1:02:03] [%cal Ge2e4]";
        assert_eq!(extract_clock_time(comment), Some("1:02:03"));
        assert_eq!(extract_evaluation(comment), None);
    }
}
