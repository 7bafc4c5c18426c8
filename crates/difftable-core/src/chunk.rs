//! Operation chunks and removal/insertion pairing

use crate::engine::DiffOp;
use crate::highlight::{HighlightError, Highlighter};
use crate::line::{chomp, is_comment_marker};
use crate::marked::MarkedLine;
use std::fmt;

/// Side of a paired edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Minus,
    Plus,
}

impl Direction {
    fn from_lead(lead: Option<char>) -> Option<Self> {
        match lead {
            Some('-') => Some(Direction::Minus),
            Some('+') => Some(Direction::Plus),
            _ => None,
        }
    }

    pub fn marker(self) -> char {
        match self {
            Direction::Minus => '-',
            Direction::Plus => '+',
        }
    }

    /// Character diff operation unique to this side
    pub fn op(self) -> DiffOp {
        match self {
            Direction::Minus => DiffOp::Delete,
            Direction::Plus => DiffOp::Insert,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Minus => write!(f, "removal"),
            Direction::Plus => write!(f, "insertion"),
        }
    }
}

/// Consecutive diff lines sharing one leading character.
///
/// Metadata lines (`---`, `+++`, `\`) always stand alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationChunk {
    lead: Option<char>,
    comment: bool,
    lines: Vec<String>,
}

impl OperationChunk {
    pub fn start(line: &str) -> Self {
        Self {
            lead: line.chars().next(),
            comment: is_comment_marker(line),
            lines: vec![line.to_string()],
        }
    }

    #[cfg(test)]
    pub(crate) fn empty(direction: Direction) -> Self {
        Self {
            lead: Some(direction.marker()),
            comment: false,
            lines: Vec::new(),
        }
    }

    /// Append `line` if it continues this chunk
    pub fn try_extend(&mut self, line: &str) -> bool {
        if self.comment || is_comment_marker(line) || line.chars().next() != self.lead {
            return false;
        }
        self.lines.push(line.to_string());
        true
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::from_lead(self.lead)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_comment(&self) -> bool {
        self.comment
    }

    fn passthrough(&self, out: &mut Vec<MarkedLine>) {
        out.extend(self.lines.iter().map(|l| MarkedLine::plain(chomp(l))));
    }
}

/// Group lines into maximal operation chunks
pub fn group<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<OperationChunk> {
    let mut chunks: Vec<OperationChunk> = Vec::new();
    for line in lines {
        let extended = match chunks.last_mut() {
            Some(last) => last.try_extend(line),
            None => false,
        };
        if !extended {
            chunks.push(OperationChunk::start(line));
        }
    }
    chunks
}

/// A removal chunk directly followed by an insertion chunk, neither of them metadata
pub fn is_pair_eligible(minus: &OperationChunk, plus: &OperationChunk) -> bool {
    minus.direction() == Some(Direction::Minus)
        && plus.direction() == Some(Direction::Plus)
        && !minus.is_comment()
        && !plus.is_comment()
}

/// Resolve chunks into display lines, highlighting eligible pairs in place
pub fn resolve(
    chunks: &[OperationChunk],
    highlighter: &Highlighter<'_>,
) -> Result<Vec<MarkedLine>, HighlightError> {
    let mut out = Vec::new();
    let mut idx = 0;
    while idx < chunks.len() {
        let chunk = &chunks[idx];
        if let Some(next) = chunks.get(idx + 1) {
            if is_pair_eligible(chunk, next) {
                log::trace!(
                    "highlighting pair at chunk {}: {} removed, {} added",
                    idx,
                    chunk.lines.len(),
                    next.lines.len()
                );
                let (minus, plus) = highlighter.highlight_pair(chunk, next)?;
                out.extend(minus);
                out.extend(plus);
                idx += 2;
                continue;
            }
            if chunk.direction() == Some(Direction::Minus)
                && next.direction() == Some(Direction::Plus)
            {
                log::trace!("skipping metadata pair at chunk {}", idx);
            }
        }
        chunk.passthrough(&mut out);
        idx += 1;
    }
    Ok(out)
}
