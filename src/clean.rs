//! Field-level cleaning of raw PGN header values and move annotations.
//!
//! PGN archives use `""`, `"?"` and `"-"` as missing-value placeholders and
//! keep everything as text; this module turns a raw [`GameRecord`] into
//! typed, nullable columns and adds the usual derived ones.

use crate::timecontrol;
use crate::types::GameRecord;
use chrono::{NaiveDate, NaiveTime};

/// Placeholder-to-null replacement.
pub fn normalize_placeholder(value: &str) -> Option<&str> {
    match value {
        "" | "?" | "-" => None,
        other => Some(other),
    }
}

/// Game result reduced to the winning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCategory {
    White,
    Black,
    Draw,
    Unknown,
}

impl ResultCategory {
    pub fn from_result(result: &str) -> Self {
        match result {
            "1-0" => Self::White,
            "0-1" => Self::Black,
            "1/2-1/2" => Self::Draw,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
            Self::Draw => "Draw",
            Self::Unknown => "Unknown",
        }
    }
}

/// Typed metadata row with derived columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedGame {
    pub event: Option<String>,
    pub site: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>,
    pub result_category: Option<ResultCategory>,
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
    pub elo_diff: Option<i32>,
    pub avg_elo: Option<f64>,
    pub date: Option<NaiveDate>,
    pub utc_time: Option<NaiveTime>,
    pub eco: Option<String>,
    pub opening: Option<String>,
    pub termination: Option<String>,
    pub time_control: Option<String>,
    pub time_category: Option<&'static str>,
}

/// Cleans one record: placeholders to null, lenient type coercion (a value
/// that does not parse becomes null, never an error), derived Elo and
/// time-control columns.
pub fn clean_game(record: &GameRecord) -> CleanedGame {
    let field = |key: &str| record.header(key).and_then(normalize_placeholder);
    let owned = |key: &str| field(key).map(str::to_owned);

    let white_elo = field("WhiteElo").and_then(|s| s.parse::<i32>().ok());
    let black_elo = field("BlackElo").and_then(|s| s.parse::<i32>().ok());
    let elo_diff = white_elo.zip(black_elo).map(|(w, b)| w - b);
    let avg_elo = white_elo
        .zip(black_elo)
        .map(|(w, b)| f64::from(w + b) / 2.0);

    let date = field("UTCDate")
        .or_else(|| field("Date"))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y.%m.%d").ok());
    let utc_time = field("UTCTime")
        .or_else(|| field("Time"))
        .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M:%S").ok());

    let result = owned("Result");
    let result_category = result.as_deref().map(ResultCategory::from_result);

    let time_control = owned("TimeControl");
    let time_category = time_control
        .as_deref()
        .and_then(timecontrol::categorize_timecontrol);

    CleanedGame {
        event: owned("Event"),
        site: owned("Site"),
        white: owned("White"),
        black: owned("Black"),
        result,
        result_category,
        white_elo,
        black_elo,
        elo_diff,
        avg_elo,
        date,
        utc_time,
        eco: owned("ECO"),
        opening: owned("Opening"),
        termination: owned("Termination"),
        time_control,
        time_category,
    }
}

/// `"H:MM:SS[.f]"` clock text to seconds. Also accepts `MM:SS` and bare
/// seconds; anything else is null.
pub fn clock_to_seconds(clock: &str) -> Option<f64> {
    let mut total = 0.0;
    for part in clock.split(':') {
        let value: f64 = part.parse().ok()?;
        if value < 0.0 {
            return None;
        }
        total = total * 60.0 + value;
    }
    Some(total)
}

/// Removes `{ ... }` annotation blocks from movetext, tracking brace depth,
/// and collapses the surrounding whitespace.
pub fn strip_annotations(movetext: &str) -> String {
    let mut out = String::with_capacity(movetext.len());
    let mut depth = 0usize;
    let mut pending_space = false;

    for ch in movetext.chars() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    pending_space = true;
                }
            }
            _ if depth > 0 => {}
            c if c.is_whitespace() => pending_space = !out.is_empty(),
            c => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(headers: &[(&str, &str)]) -> GameRecord {
        let mut record = GameRecord::default();
        for (key, value) in headers {
            record.push_header(key.to_string(), value.to_string());
        }
        record
    }

    #[test]
    fn test_placeholders_become_null() {
        assert_eq!(normalize_placeholder(""), None);
        assert_eq!(normalize_placeholder("?"), None);
        assert_eq!(normalize_placeholder("-"), None);
        assert_eq!(normalize_placeholder("Berlin"), Some("Berlin"));
    }

    #[test]
    fn test_clean_game_types_and_derived_columns() {
        let cleaned = clean_game(&record(&[
            ("Event", "Rated Blitz game"),
            ("White", "alice"),
            ("Black", "bob"),
            ("Result", "1-0"),
            ("WhiteElo", "2500"),
            ("BlackElo", "2400"),
            ("UTCDate", "2021.01.31"),
            ("UTCTime", "13:45:00"),
            ("TimeControl", "180+2"),
        ]));

        assert_eq!(cleaned.white.as_deref(), Some("alice"));
        assert_eq!(cleaned.result_category, Some(ResultCategory::White));
        assert_eq!(cleaned.white_elo, Some(2500));
        assert_eq!(cleaned.black_elo, Some(2400));
        assert_eq!(cleaned.elo_diff, Some(100));
        assert_eq!(cleaned.avg_elo, Some(2450.0));
        assert_eq!(cleaned.date, NaiveDate::from_ymd_opt(2021, 1, 31));
        assert_eq!(
            cleaned.utc_time,
            NaiveTime::from_hms_opt(13, 45, 0)
        );
        assert_eq!(cleaned.time_category, Some("blitz"));
    }

    #[test]
    fn test_clean_game_tolerates_placeholders_and_junk() {
        let cleaned = clean_game(&record(&[
            ("White", "?"),
            ("WhiteElo", "?"),
            ("BlackElo", "not a number"),
            ("UTCDate", "????.??.??"),
            ("Result", "*"),
            ("TimeControl", "-"),
        ]));

        assert_eq!(cleaned.white, None);
        assert_eq!(cleaned.white_elo, None);
        assert_eq!(cleaned.black_elo, None);
        assert_eq!(cleaned.elo_diff, None);
        assert_eq!(cleaned.date, None);
        assert_eq!(cleaned.result_category, Some(ResultCategory::Unknown));
        assert_eq!(cleaned.time_control, None);
        assert_eq!(cleaned.time_category, None);
    }

    #[test]
    fn test_date_falls_back_to_date_tag() {
        let cleaned = clean_game(&record(&[("Date", "2019.12.01")]));
        assert_eq!(cleaned.date, NaiveDate::from_ymd_opt(2019, 12, 1));
    }

    #[test]
    fn test_result_categories() {
        assert_eq!(ResultCategory::from_result("1-0"), ResultCategory::White);
        assert_eq!(ResultCategory::from_result("0-1"), ResultCategory::Black);
        assert_eq!(ResultCategory::from_result("1/2-1/2"), ResultCategory::Draw);
        assert_eq!(ResultCategory::from_result("*"), ResultCategory::Unknown);
        assert_eq!(ResultCategory::Draw.as_str(), "Draw");
    }

    #[test]
    fn test_clock_to_seconds() {
        assert_eq!(clock_to_seconds("0:03:00"), Some(180.0));
        assert_eq!(clock_to_seconds("1:00:00"), Some(3600.0));
        assert_eq!(clock_to_seconds("0:00:05.2"), Some(5.2));
        assert_eq!(clock_to_seconds("05:30"), Some(330.0));
        assert_eq!(clock_to_seconds("45"), Some(45.0));
        assert_eq!(clock_to_seconds("abc"), None);
        assert_eq!(clock_to_seconds("0:-1:00"), None);
    }

    #[test]
    fn test_strip_annotations_simple() {
        assert_eq!(
            strip_annotations("1. e4 { [%clk 0:03:00] } e5"),
            "1. e4 e5"
        );
    }

    #[test]
    fn test_strip_annotations_multiple_and_nested() {
        assert_eq!(
            strip_annotations("1. e4 { first } e5 { outer { inner } text } 2. Nf3"),
            "1. e4 e5 2. Nf3"
        );
    }

    #[test]
    fn test_strip_annotations_whitespace_normalization() {
        assert_eq!(strip_annotations("1. e4   { comment }   e5"), "1. e4 e5");
        assert_eq!(strip_annotations("  1. e4 e5  "), "1. e4 e5");
        assert_eq!(strip_annotations("{ pre-game } 1. e4"), "1. e4");
        assert_eq!(strip_annotations(""), "");
    }
}
