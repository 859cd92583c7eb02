//! PGN `TimeControl` tag parsing and speed-category bucketing.
//!
//! Covers the shapes that actually occur in server exports: `?`, `-`,
//! sandclock `*N`, `base[+inc]`, `moves/base[+inc]`, and colon-separated
//! multi-stage controls. A bare base below 60 with no move count is the
//! common minutes shorthand (`3+2` for 180 seconds + 2) and is scaled
//! accordingly.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Unknown,
    Unlimited,
    Sandclock,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub moves: Option<u32>,
    pub base_seconds: u32,
    pub increment_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTimeControl {
    pub raw: String,
    pub normalized: Option<String>,
    pub periods: Vec<Period>,
    pub mode: Mode,
}

fn parse_u32(s: &str) -> Option<u32> {
    s.parse().ok()
}

fn parse_stage(s: &str) -> Option<Period> {
    let (moves, rest) = match s.split_once('/') {
        Some((moves_part, rest)) => (Some(parse_u32(moves_part)?), rest),
        None => (None, s),
    };

    let (base, increment) = match rest.split_once('+') {
        Some((base_part, inc_part)) => (parse_u32(base_part)?, Some(parse_u32(inc_part)?)),
        None => (parse_u32(rest)?, None),
    };

    Some(Period {
        moves,
        base_seconds: base,
        increment_seconds: increment,
    })
}

fn format_period(period: &Period) -> String {
    let mut out = String::new();
    if let Some(moves) = period.moves {
        out.push_str(&format!("{}/", moves));
    }
    out.push_str(&period.base_seconds.to_string());
    if let Some(inc) = period.increment_seconds {
        out.push_str(&format!("+{}", inc));
    }
    out
}

/// Bases under a minute with no move count are minutes shorthand, not
/// sub-minute games.
fn scale_minute_shorthand(mut period: Period) -> Period {
    if period.moves.is_none() && period.base_seconds < 60 {
        period.base_seconds *= 60;
    }
    period
}

pub fn parse_timecontrol(raw: &str) -> Option<ParsedTimeControl> {
    let input = raw.trim();
    if input.is_empty() {
        return None;
    }

    if input == "?" {
        return Some(ParsedTimeControl {
            raw: raw.to_string(),
            normalized: Some("?".to_string()),
            periods: Vec::new(),
            mode: Mode::Unknown,
        });
    }

    if input == "-" {
        return Some(ParsedTimeControl {
            raw: raw.to_string(),
            normalized: Some("-".to_string()),
            periods: Vec::new(),
            mode: Mode::Unlimited,
        });
    }

    if let Some(secs_str) = input.strip_prefix('*')
        && let Some(secs) = parse_u32(secs_str)
    {
        return Some(ParsedTimeControl {
            raw: raw.to_string(),
            normalized: Some(format!("*{}", secs)),
            periods: vec![Period {
                moves: None,
                base_seconds: secs,
                increment_seconds: None,
            }],
            mode: Mode::Sandclock,
        });
    }

    let stage_parts: Vec<&str> = input.split(':').collect();
    if stage_parts.len() > 1 {
        let periods: Option<Vec<Period>> = stage_parts.iter().map(|s| parse_stage(s)).collect();
        if let Some(periods) = periods
            && !periods.is_empty()
        {
            let normalized = periods
                .iter()
                .map(format_period)
                .collect::<Vec<_>>()
                .join(":");
            return Some(ParsedTimeControl {
                raw: raw.to_string(),
                normalized: Some(normalized),
                periods,
                mode: Mode::Normal,
            });
        }
        return None;
    }

    let period = scale_minute_shorthand(parse_stage(input)?);
    let normalized = format_period(&period);
    Some(ParsedTimeControl {
        raw: raw.to_string(),
        normalized: Some(normalized),
        periods: vec![period],
        mode: Mode::Normal,
    })
}

pub fn normalize_timecontrol(raw: &str) -> Option<String> {
    parse_timecontrol(raw).and_then(|parsed| parsed.normalized)
}

/// Expected game length estimate: base plus forty increments, the usual
/// server-side bucketing formula.
pub fn category_from_parsed(parsed: &ParsedTimeControl) -> Option<&'static str> {
    if parsed.mode != Mode::Normal {
        return None;
    }

    let period = parsed.periods.first()?;
    let increment = period.increment_seconds.unwrap_or(0) as u64;
    let estimated_seconds = period.base_seconds as u64 + 40 * increment;

    match estimated_seconds {
        0..=29 => Some("ultra-bullet"),
        30..=179 => Some("bullet"),
        180..=479 => Some("blitz"),
        480..=1499 => Some("rapid"),
        _ => Some("classical"),
    }
}

pub fn categorize_timecontrol(raw: &str) -> Option<&'static str> {
    let parsed = parse_timecontrol(raw)?;
    category_from_parsed(&parsed)
}
