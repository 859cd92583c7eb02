//! Batch extraction of tabular datasets from PGN chess archives.
//!
//! Reads a stream of games (plain or zstd-compressed, single file or glob)
//! and produces two datasets: per-game metadata ([`MetaData`]) and per-move
//! tables ([`MoveData`]) with clock and engine-eval annotations parsed out
//! of move comments. Malformed games are skipped, not fatal; the value of a
//! batch run is the aggregate dataset.
//!
//! ```
//! use pgndata::MoveData;
//!
//! let pgn = r#"[Event "Example"]
//! 1. e4 { [%clk 0:03:00] } e5 { [%eval 0.2] [%clk 0:03:00] } 1-0"#;
//!
//! let data = MoveData::from_reader(pgn.as_bytes());
//! let table = data.get_game_moves(1).unwrap();
//! assert_eq!(table.rows()[0].black.as_ref().unwrap().clock.as_deref(), Some("0:03:00"));
//! ```

pub mod annotations;
pub mod clean;
pub mod error;
pub mod export;
mod log;
pub mod moves;
pub mod reader;
pub mod timecontrol;
pub mod types;
pub mod visitor;

pub use error::DataError;
pub use reader::{Compression, MetaData, MoveData, PgnInput};
pub use types::{Eval, GameMoveTable, GameRecord, HalfMove, MoveRow};
