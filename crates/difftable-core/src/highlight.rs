//! Character-level highlighting of paired removal/insertion runs

use crate::chunk::{Direction, OperationChunk};
use crate::engine::{DiffChunk, DiffEngine, DiffOp};
use crate::marked::MarkedLine;
use thiserror::Error;

/// Default size below which a shared run between changes is folded into the highlight
pub const DEFAULT_SHARED_RUN_FOLD_LIMIT: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    #[error("cannot highlight an empty {0} chunk")]
    EmptyChunk(Direction),
    #[error("expected a removal chunk followed by an insertion chunk")]
    NotAPair,
}

/// Unit of the character diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharToken {
    Char(char),
    LineEnd,
}

/// Highlighter for eligible chunk pairs
#[derive(Debug, Clone)]
pub struct Highlighter<'e> {
    engine: &'e DiffEngine,
    ignore_crlf: bool,
    fold_limit: usize,
}

impl<'e> Highlighter<'e> {
    pub fn new(engine: &'e DiffEngine) -> Self {
        Self {
            engine,
            ignore_crlf: false,
            fold_limit: DEFAULT_SHARED_RUN_FOLD_LIMIT,
        }
    }

    pub fn with_ignore_crlf(mut self, ignore_crlf: bool) -> Self {
        self.ignore_crlf = ignore_crlf;
        self
    }

    pub fn with_fold_limit(mut self, fold_limit: usize) -> Self {
        self.fold_limit = fold_limit;
        self
    }

    /// Diff `minus` against `plus` by character and rebuild both sides with emphasis.
    ///
    /// Each returned line starts with its side's marker and has no line ending.
    pub fn highlight_pair(
        &self,
        minus: &OperationChunk,
        plus: &OperationChunk,
    ) -> Result<(Vec<MarkedLine>, Vec<MarkedLine>), HighlightError> {
        if minus.direction() != Some(Direction::Minus) || plus.direction() != Some(Direction::Plus) {
            return Err(HighlightError::NotAPair);
        }
        if minus.lines().is_empty() {
            return Err(HighlightError::EmptyChunk(Direction::Minus));
        }
        if plus.lines().is_empty() {
            return Err(HighlightError::EmptyChunk(Direction::Plus));
        }

        let before = self.tokenize(minus);
        let after = self.tokenize(plus);
        let chunks = self.engine.diff(&before, &after);

        Ok((
            reconstruct(&chunks, Direction::Minus, self.fold_limit),
            reconstruct(&chunks, Direction::Plus, self.fold_limit),
        ))
    }

    /// One token per character of each line, marker stripped, each line closed by `LineEnd`
    pub fn tokenize(&self, chunk: &OperationChunk) -> Vec<CharToken> {
        let mut tokens = Vec::new();
        for line in chunk.lines() {
            let mut chars = line.chars();
            chars.next();
            let body = chars.as_str();
            let body = body.strip_suffix('\n').unwrap_or(body);
            let body = if self.ignore_crlf {
                body.strip_suffix('\r').unwrap_or(body)
            } else {
                body
            };
            tokens.extend(body.chars().map(CharToken::Char));
            tokens.push(CharToken::LineEnd);
        }
        tokens
    }
}

/// Rebuild one side from the character chunks.
///
/// Chunks unique to `side` are emphasized and chunks of the other side are
/// dropped. A shared chunk is emphasized too when it sits between changes:
/// past the first two chunks, before the last one, and shorter than
/// `fold_limit` tokens.
pub fn reconstruct(
    chunks: &[DiffChunk<CharToken>],
    side: Direction,
    fold_limit: usize,
) -> Vec<MarkedLine> {
    let own = side.op();
    let mut builder = LineBuilder::new(side.marker());

    for (idx, chunk) in chunks.iter().enumerate() {
        let emphasized = match chunk.op {
            op if op == own => true,
            DiffOp::Equal => idx > 1 && idx + 1 < chunks.len() && chunk.tokens.len() < fold_limit,
            _ => continue,
        };
        for token in &chunk.tokens {
            match token {
                CharToken::Char(c) => builder.push(*c, emphasized),
                CharToken::LineEnd => builder.break_line(),
            }
        }
    }
    builder.finish()
}

/// Collects marked lines, re-prefixing each with the side's marker
struct LineBuilder {
    marker: char,
    lines: Vec<MarkedLine>,
    current: MarkedLine,
    /// Whether `current` received any token
    dirty: bool,
}

impl LineBuilder {
    fn new(marker: char) -> Self {
        Self {
            marker,
            lines: Vec::new(),
            current: prefixed(marker),
            dirty: false,
        }
    }

    fn push(&mut self, c: char, emphasized: bool) {
        self.current.push(c, emphasized);
        self.dirty = true;
    }

    fn break_line(&mut self) {
        let line = std::mem::replace(&mut self.current, prefixed(self.marker));
        self.lines.push(line);
        self.dirty = false;
    }

    fn finish(mut self) -> Vec<MarkedLine> {
        if self.dirty {
            self.lines.push(self.current);
        }
        self.lines
    }
}

fn prefixed(marker: char) -> MarkedLine {
    let mut line = MarkedLine::new();
    line.push(marker, false);
    line
}
