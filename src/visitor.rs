//! Metadata visitor: collects the full header mapping and a normalized
//! rendition of the mainline movetext for one game.

use crate::error::ErrorAccumulator;
use crate::types::GameRecord;
use pgn_reader::{Outcome, RawComment, RawTag, SanPlus, Skip, Visitor};
use std::fmt::Write;
use std::mem;
use std::ops::ControlFlow;

/// Streaming PGN visitor (pgn-reader) for per-game metadata.
///
/// Headers are kept schema-free: every tag pair the source carries lands in
/// the record, first occurrence winning. The movetext is re-rendered with
/// move numbers and `{ ... }` comments, whitespace-normalized.
pub struct GameVisitor {
    record: GameRecord,
    move_count: u32,
    result_marker: Option<String>,
    parse_error: ErrorAccumulator,
    pub current_game: Option<GameRecord>,
}

impl GameVisitor {
    pub fn new() -> Self {
        Self {
            record: GameRecord::default(),
            move_count: 0,
            result_marker: None,
            parse_error: ErrorAccumulator::default(),
            current_game: None,
        }
    }

    fn finalize_game(&mut self) {
        // Lichess exports always carry a Result tag; other sources may only
        // have the movetext outcome token.
        if self.record.header("Result").is_none()
            && let Some(marker) = self.result_marker.take()
        {
            self.record.push_header("Result".to_string(), marker);
        }

        self.record.parse_error = self.parse_error.take();
        self.current_game = Some(mem::take(&mut self.record));
    }

    /// Emits a partial record carrying whatever headers were readable plus
    /// the failure diagnostic.
    pub fn finalize_game_with_error(&mut self, error_msg: String) {
        self.parse_error.push(&error_msg);
        self.finalize_game();
    }

    fn append_comment(&self, movetext: &mut String, comment: RawComment<'_>) {
        let comment_str = String::from_utf8_lossy(comment.as_bytes());

        if !movetext.is_empty() {
            movetext.push(' ');
        }
        movetext.push('{');
        movetext.push(' ');
        movetext.push_str(comment_str.trim());
        movetext.push(' ');
        movetext.push('}');
    }
}

impl Default for GameVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Visitor for GameVisitor {
    type Tags = ();
    type Movetext = String;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.record = GameRecord::default();
        self.move_count = 0;
        self.result_marker = None;
        self.parse_error = ErrorAccumulator::default();
        self.current_game = None;
        ControlFlow::Continue(())
    }

    fn tag(
        &mut self,
        _: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let key = String::from_utf8_lossy(key).into_owned();
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        self.record.push_header(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(String::with_capacity(256))
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        if !movetext.is_empty() {
            movetext.push(' ');
        }

        if self.move_count.is_multiple_of(2) {
            let _ = write!(movetext, "{}. ", (self.move_count / 2) + 1);
        }

        let _ = write!(movetext, "{}", san);
        self.move_count += 1;
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        self.append_comment(movetext, comment);
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        self.append_comment(movetext, comment);
        ControlFlow::Continue(())
    }

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        self.result_marker = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        self.record.movetext = movetext.trim().to_string();
        self.finalize_game();
    }
}
