//! Move Extractor: walks one game's mainline and builds a wide move table
//! with one row per move number (white move + black reply).

use crate::annotations::{extract_clock_time, extract_evaluation};
use crate::types::{HalfMove, MoveRow, RowList};
use pgn_reader::{RawComment, RawTag, SanPlus, Skip, Visitor};
use shakmaty::Color;
use std::mem;
use std::ops::ControlFlow;

/// Streaming PGN visitor (pgn-reader) producing the rows of one game.
///
/// Rows are assembled in a pending slot: a white move opens the slot, the
/// black reply completes it, and the next white move (or the end of the
/// game) flushes it. Comments are reported after the move they follow, so
/// annotations attach to the most recent half-move.
pub struct MoveTableVisitor {
    rows: RowList,
    pending: Option<MoveRow>,
    start_side: Color,
    side: Color,
    last_mover: Option<Color>,
    finished: Option<RowList>,
}

impl MoveTableVisitor {
    pub fn new() -> Self {
        Self {
            rows: RowList::new(),
            pending: None,
            start_side: Color::White,
            side: Color::White,
            last_mover: None,
            finished: None,
        }
    }

    /// Rows of the game finished by the last `read_game` call.
    pub fn take_rows(&mut self) -> RowList {
        self.finished.take().unwrap_or_default()
    }

    fn next_number(&self) -> u32 {
        self.rows.len() as u32 + 1
    }

    fn flush_pending(&mut self) {
        if let Some(row) = self.pending.take() {
            self.rows.push(row);
        }
    }

    fn attach_comment(&mut self, comment: &str) {
        // Comments before the first move carry no per-move annotations.
        let Some(mover) = self.last_mover else { return };
        let Some(row) = self.pending.as_mut() else {
            return;
        };

        let half = match mover {
            Color::White => row.white.as_mut(),
            Color::Black => row.black.as_mut(),
        };
        let Some(half) = half else { return };

        // First matching token wins, also across multiple comment blocks.
        if half.clock.is_none() {
            half.clock = extract_clock_time(comment).map(str::to_owned);
        }
        if half.eval.is_none() {
            half.eval = extract_evaluation(comment);
        }
    }
}

impl Default for MoveTableVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Visitor for MoveTableVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.rows.clear();
        self.pending = None;
        self.start_side = Color::White;
        self.side = Color::White;
        self.last_mover = None;
        self.finished = None;
        ControlFlow::Continue(())
    }

    fn tag(
        &mut self,
        _: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        // A FEN setup can put black on move first; ply parity alone would
        // then assign columns to the wrong side.
        if key == b"FEN" {
            let fen = String::from_utf8_lossy(value.as_bytes()).into_owned();
            if fen.split_whitespace().nth(1) == Some("b") {
                self.start_side = Color::Black;
            }
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        self.side = self.start_side;
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, _: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        let san_text = san.to_string();

        match self.side {
            Color::White => {
                self.flush_pending();
                self.pending = Some(MoveRow {
                    number: self.next_number(),
                    white: Some(HalfMove::new(san_text)),
                    black: None,
                });
            }
            Color::Black => {
                let number = self.next_number();
                let row = self.pending.get_or_insert_with(|| MoveRow {
                    number,
                    white: None,
                    black: None,
                });
                row.black = Some(HalfMove::new(san_text));
            }
        }

        self.last_mover = Some(self.side);
        self.side = self.side.other();
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        _: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let text = String::from_utf8_lossy(comment.as_bytes()).into_owned();
        self.attach_comment(&text);
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        _: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let text = String::from_utf8_lossy(comment.as_bytes()).into_owned();
        self.attach_comment(&text);
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, _: Self::Movetext) -> Self::Output {
        self.flush_pending();
        self.finished = Some(mem::take(&mut self.rows));
    }
}
