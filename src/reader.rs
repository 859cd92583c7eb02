//! Input streams and the batch drivers that walk a whole PGN archive.
//!
//! The batch loop distinguishes three signals from the underlying reader:
//! a parsed game, a genuine end of stream, and a per-game failure. Failures
//! are skipped without consuming an ID; only a stream that stops advancing
//! terminates the run early.

use crate::error::DataError;
use crate::log;
use crate::moves::MoveTableVisitor;
use crate::types::{GameMoveTable, GameRecord};
use crate::visitor::GameVisitor;
use pgn_reader::Reader;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder as ZstdDecoder;

pub type PgnInput = Box<dyn Read + Send>;

/// A failing read cannot advance the stream, so retrying forever would spin.
/// One retry covers a corrupt record boundary; after that the source is
/// treated as exhausted.
const MAX_CONSECUTIVE_FAILURES: u32 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    Plain,
    Zstd,
}

impl Compression {
    /// Bulk server exports ship as `.pgn.zst`; anything else is read as-is.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

pub fn open_input_stream(path: &Path, compression: Compression) -> Result<PgnInput, DataError> {
    let file = File::open(path).map_err(|e| DataError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    match compression {
        Compression::Plain => Ok(Box::new(file)),
        Compression::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|e| DataError::Decoder {
                path: path.to_path_buf(),
                source: e,
            }),
    }
}

/// Expands a glob pattern to the matching files, or passes a literal path
/// through untouched.
pub fn expand_paths(pattern: &str) -> Result<Vec<PathBuf>, DataError> {
    if pattern.contains('*') || pattern.contains('?') {
        Ok(glob::glob(pattern)
            .map_err(|e| DataError::Pattern {
                pattern: pattern.to_string(),
                source: e,
            })?
            .filter_map(|entry| entry.ok())
            .collect())
    } else {
        Ok(vec![PathBuf::from(pattern)])
    }
}

/// With a single explicit path a failure to open is hard; across a glob
/// result the unreadable member is warned about and skipped.
fn for_each_input(
    pattern: &str,
    mut consume: impl FnMut(PgnInput),
) -> Result<(), DataError> {
    let paths = expand_paths(pattern)?;
    let fail_hard = paths.len() == 1;

    for path in &paths {
        match open_input_stream(path, Compression::from_path(path)) {
            Ok(input) => consume(input),
            Err(err) if fail_hard => return Err(err),
            Err(err) => log::warn(err.to_string()),
        }
    }

    Ok(())
}

/// Per-move dataset of a batch run: dense 1-based game IDs over every game
/// that parsed and produced at least one row.
#[derive(Debug)]
pub struct MoveData {
    games: BTreeMap<u32, GameMoveTable>,
    next_id: u32,
    next_source_index: u32,
}

impl Default for MoveData {
    fn default() -> Self {
        Self {
            games: BTreeMap::new(),
            next_id: 1,
            next_source_index: 1,
        }
    }
}

impl MoveData {
    /// Extracts move tables from a single PGN file, decompressing by
    /// extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let input = open_input_stream(path, Compression::from_path(path))?;
        Ok(Self::from_reader(input))
    }

    /// Extracts move tables from every file matching a glob pattern, in
    /// match order. Game IDs and stream positions run across file
    /// boundaries.
    pub fn from_glob(pattern: &str) -> Result<Self, DataError> {
        let mut data = Self::default();
        for_each_input(pattern, |input| data.extend_from_input(input))?;
        Ok(data)
    }

    pub fn from_reader<R: Read>(input: R) -> Self {
        let mut data = Self::default();
        data.extend_from_input(input);
        data
    }

    fn extend_from_input<R: Read>(&mut self, input: R) {
        let mut reader = Reader::new(input);
        let mut visitor = MoveTableVisitor::new();
        let mut consecutive_failures = 0u32;

        loop {
            match reader.read_game(&mut visitor) {
                Ok(Some(())) => {
                    consecutive_failures = 0;
                    let source_index = self.next_source_index;
                    self.next_source_index += 1;

                    let rows = visitor.take_rows();
                    if rows.is_empty() {
                        continue;
                    }

                    self.games
                        .insert(self.next_id, GameMoveTable::new(rows, source_index));
                    self.next_id += 1;
                }
                Ok(None) => break,
                Err(error) => {
                    let source_index = self.next_source_index;
                    self.next_source_index += 1;
                    log::warn(format!(
                        "skipping unreadable game at stream position {}: {}",
                        source_index, error
                    ));

                    consecutive_failures += 1;
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        log::error("input stream no longer advances; stopping batch early");
                        break;
                    }
                }
            }
        }

        log::info(format!(
            "move extraction: {} of {} games retained",
            self.games.len(),
            self.next_source_index - 1
        ));
    }

    /// Move table for a game ID, `None` for unknown IDs.
    pub fn get_game_moves(&self, game_id: u32) -> Option<&GameMoveTable> {
        self.games.get(&game_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &GameMoveTable)> {
        self.games.iter().map(|(id, table)| (*id, table))
    }

    pub fn into_map(self) -> BTreeMap<u32, GameMoveTable> {
        self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// Per-game metadata of a batch run, one record per game in stream order.
///
/// Unlike [`MoveData`], empty games keep their slot here, and unreadable
/// games surface as records with `parse_error` set, so metadata IDs always
/// equal stream positions.
#[derive(Debug, Default)]
pub struct MetaData {
    games: Vec<GameRecord>,
}

impl MetaData {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let input = open_input_stream(path, Compression::from_path(path))?;
        Ok(Self::from_reader(input))
    }

    pub fn from_glob(pattern: &str) -> Result<Self, DataError> {
        let mut data = Self::default();
        for_each_input(pattern, |input| data.extend_from_input(input))?;
        Ok(data)
    }

    pub fn from_reader<R: Read>(input: R) -> Self {
        let mut data = Self::default();
        data.extend_from_input(input);
        data
    }

    fn extend_from_input<R: Read>(&mut self, input: R) {
        let mut reader = Reader::new(input);
        let mut visitor = GameVisitor::new();
        let mut consecutive_failures = 0u32;

        loop {
            match reader.read_game(&mut visitor) {
                Ok(Some(())) => {
                    consecutive_failures = 0;
                    if let Some(game) = visitor.current_game.take() {
                        self.games.push(game);
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    let error_msg = format!(
                        "read error at stream position {}: {}",
                        self.games.len() + 1,
                        error
                    );
                    log::warn(&error_msg);
                    visitor.finalize_game_with_error(error_msg);
                    if let Some(game) = visitor.current_game.take() {
                        self.games.push(game);
                    }

                    consecutive_failures += 1;
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        log::error("input stream no longer advances; stopping batch early");
                        break;
                    }
                }
            }
        }

        log::info(format!("metadata extraction: {} records", self.games.len()));
    }

    /// Record for a 1-based game ID.
    pub fn get(&self, game_id: u32) -> Option<&GameRecord> {
        game_id
            .checked_sub(1)
            .and_then(|idx| self.games.get(idx as usize))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &GameRecord)> {
        self.games
            .iter()
            .enumerate()
            .map(|(idx, game)| (idx as u32 + 1, game))
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
