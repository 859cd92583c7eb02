//! CSV and JSON export of the extracted tables.
//!
//! Move tables use a fixed column set; metadata columns are the
//! first-seen-ordered union of header keys across the batch, since PGN
//! headers carry no fixed schema.

use crate::reader::MetaData;
use crate::types::{Eval, GameMoveTable, HalfMove};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const MOVES_CSV_HEADER: &str =
    "move_number,white_move,white_time,white_eval,black_move,black_time,black_eval";

fn push_csv_field(line: &mut String, value: &str) {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        line.push('"');
        line.push_str(&value.replace('"', "\"\""));
        line.push('"');
    } else {
        line.push_str(value);
    }
}

fn push_half_move_fields(line: &mut String, half: Option<&HalfMove>) {
    line.push(',');
    if let Some(half) = half {
        push_csv_field(line, &half.san);
    }
    line.push(',');
    if let Some(clock) = half.and_then(|h| h.clock.as_deref()) {
        push_csv_field(line, clock);
    }
    line.push(',');
    if let Some(eval) = half.and_then(|h| h.eval) {
        let _ = write!(line, "{}", eval);
    }
}

/// Writes one game's move table as CSV. Null cells are empty; mate scores
/// render as `M±n`.
pub fn write_moves_csv<W: Write>(table: &GameMoveTable, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", MOVES_CSV_HEADER)?;

    for row in table.rows() {
        let mut line = row.number.to_string();
        push_half_move_fields(&mut line, row.white.as_ref());
        push_half_move_fields(&mut line, row.black.as_ref());
        writeln!(writer, "{}", line)?;
    }

    Ok(())
}

pub fn moves_to_csv_path(table: &GameMoveTable, path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_moves_csv(table, &mut writer)?;
    writer.flush()
}

/// Writes the whole metadata batch as CSV, `Game_ID` first.
pub fn write_metadata_csv<W: Write>(meta: &MetaData, mut writer: W) -> io::Result<()> {
    let mut columns: Vec<&str> = Vec::new();
    for game in meta.records() {
        for (key, _) in game.headers() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut header = String::from("Game_ID");
    for column in &columns {
        header.push(',');
        push_csv_field(&mut header, column);
    }
    writeln!(writer, "{}", header)?;

    for (game_id, game) in meta.iter() {
        let mut line = game_id.to_string();
        for column in &columns {
            line.push(',');
            if let Some(value) = game.header(column) {
                push_csv_field(&mut line, value);
            }
        }
        writeln!(writer, "{}", line)?;
    }

    Ok(())
}

pub fn metadata_to_csv_path(meta: &MetaData, path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_metadata_csv(meta, &mut writer)?;
    writer.flush()
}

fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn json_opt_string(value: Option<&str>) -> String {
    value.map(json_string).unwrap_or_else(|| "null".to_string())
}

fn json_eval(eval: Option<Eval>) -> String {
    match eval {
        None => "null".to_string(),
        Some(Eval::Cp(v)) => v.to_string(),
        Some(Eval::Mate(n)) => format!("\"M{}\"", n),
    }
}

/// One game's move table as a JSON array of row objects. Numeric
/// evaluations stay numbers; mate markers become `"M±n"` strings.
pub fn moves_to_json(table: &GameMoveTable) -> String {
    let mut json = String::from("[");

    for (idx, row) in table.rows().iter().enumerate() {
        if idx > 0 {
            json.push(',');
        }

        let white = row.white.as_ref();
        let black = row.black.as_ref();
        let _ = write!(
            json,
            r#"{{"move_number":{},"white_move":{},"white_time":{},"white_eval":{},"black_move":{},"black_time":{},"black_eval":{}}}"#,
            row.number,
            json_opt_string(white.map(|h| h.san.as_str())),
            json_opt_string(white.and_then(|h| h.clock.as_deref())),
            json_eval(white.and_then(|h| h.eval)),
            json_opt_string(black.map(|h| h.san.as_str())),
            json_opt_string(black.and_then(|h| h.clock.as_deref())),
            json_eval(black.and_then(|h| h.eval)),
        );
    }

    json.push(']');
    json
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{MetaData, MoveData};

    const SAMPLE: &str = r#"[Event "Rated Blitz game"]
[White "alice"]
[Black "bob"]
[Result "1-0"]
1. e4 { [%clk 0:03:00] } e5 { [%eval 0.2] [%clk 0:03:00] } 2. Nf3 { [%eval #5] } 1-0"#;

    fn sample_table() -> GameMoveTable {
        let data = MoveData::from_reader(SAMPLE.as_bytes());
        data.get_game_moves(1).unwrap().clone()
    }

    #[test]
    fn test_moves_csv_layout() {
        let mut out = Vec::new();
        write_moves_csv(&sample_table(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], MOVES_CSV_HEADER);
        assert_eq!(lines[1], "1,e4,0:03:00,,e5,0:03:00,0.2");
        assert_eq!(lines[2], "2,Nf3,,M5,,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_quoting() {
        let mut line = String::new();
        push_csv_field(&mut line, "plain");
        assert_eq!(line, "plain");

        let mut line = String::new();
        push_csv_field(&mut line, "a, b");
        assert_eq!(line, "\"a, b\"");

        let mut line = String::new();
        push_csv_field(&mut line, "say \"hi\"");
        assert_eq!(line, "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_metadata_csv_unions_header_columns() {
        let pgn = r#"[Event "One"]
[White "alice"]
1. e4 1-0

[Event "Two"]
[Opening "Sicilian, comma defense"]
1. e4 c5 0-1"#;

        let meta = MetaData::from_reader(pgn.as_bytes());
        let mut out = Vec::new();
        write_metadata_csv(&meta, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Game_ID,Event,White,Result,Opening");
        assert_eq!(lines[1], "1,One,alice,1-0,");
        assert_eq!(lines[2], "2,Two,,0-1,\"Sicilian, comma defense\"");
    }

    #[test]
    fn test_moves_json_round_trip_row() {
        let json = moves_to_json(&sample_table());
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0]["move_number"], 1);
        assert_eq!(rows[0]["white_move"], "e4");
        assert_eq!(rows[0]["white_time"], "0:03:00");
        assert!(rows[0]["white_eval"].is_null());
        assert_eq!(rows[0]["black_eval"], 0.2);

        assert_eq!(rows[1]["white_eval"], "M5");
        assert!(rows[1]["black_move"].is_null());
    }

    #[test]
    fn test_moves_json_empty_table() {
        assert_eq!(moves_to_json(&GameMoveTable::default()), "[]");
    }
}
