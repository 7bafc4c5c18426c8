//! Sequence diff engine
//!
//! One primitive serves both granularities: lines of two texts, and the
//! character tokens of a paired removal/insertion run.

use crate::line::{DiffLine, NO_NEWLINE_MARKER};
use imara_diff::{Algorithm, Diff, InternedInput, TokenSource};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::ops::Range;

/// Operation tag of a diff chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffOp {
    Equal,
    Delete,
    Insert,
}

impl DiffOp {
    /// Leading marker character used in the textual line format
    pub fn marker(self) -> char {
        match self {
            DiffOp::Equal => ' ',
            DiffOp::Delete => '-',
            DiffOp::Insert => '+',
        }
    }
}

/// A maximal run of tokens sharing one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffChunk<T> {
    pub op: DiffOp,
    pub tokens: Vec<T>,
}

/// Alignment algorithm used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    MyersMinimal,
    Histogram,
}

impl From<DiffAlgorithm> for Algorithm {
    fn from(algorithm: DiffAlgorithm) -> Self {
        match algorithm {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::MyersMinimal => Algorithm::MyersMinimal,
            DiffAlgorithm::Histogram => Algorithm::Histogram,
        }
    }
}

/// Borrowed token slice fed to the interner
struct TokenSlice<'a, T>(&'a [T]);

impl<'a, T: Hash + Eq> TokenSource for TokenSlice<'a, T> {
    type Token = &'a T;
    type Tokenizer = std::slice::Iter<'a, T>;

    fn tokenize(&self) -> Self::Tokenizer {
        self.0.iter()
    }

    fn estimate_tokens(&self) -> u32 {
        u32::try_from(self.0.len()).unwrap_or(u32::MAX)
    }
}

/// Diff engine
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    algorithm: DiffAlgorithm,
    /// Unchanged lines kept around each change in `diff_texts`; `None` keeps the whole file
    context: Option<usize>,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, algorithm: DiffAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Emit unified hunks with `n` lines of context instead of the full file
    pub fn with_context(mut self, context: Option<usize>) -> Self {
        self.context = context;
        self
    }

    pub fn algorithm(&self) -> DiffAlgorithm {
        self.algorithm
    }

    /// Diff two token sequences into ordered chunks.
    ///
    /// Chunks are maximal and never empty. At each change site the deleted
    /// run precedes the inserted run. Equal chunks carry the tokens of `before`.
    pub fn diff<T: Hash + Eq + Clone>(&self, before: &[T], after: &[T]) -> Vec<DiffChunk<T>> {
        let input = InternedInput::new(TokenSlice(before), TokenSlice(after));
        let diff = Diff::compute(self.algorithm.into(), &input);

        let mut chunks = Vec::new();
        let mut pos = 0;
        for hunk in diff.hunks() {
            let removed = to_usize(&hunk.before);
            let added = to_usize(&hunk.after);
            push_run(&mut chunks, DiffOp::Equal, &before[pos..removed.start]);
            push_run(&mut chunks, DiffOp::Delete, &before[removed.clone()]);
            push_run(&mut chunks, DiffOp::Insert, &after[added]);
            pos = removed.end;
        }
        push_run(&mut chunks, DiffOp::Equal, &before[pos..]);
        chunks
    }

    /// Line-level diff of two texts into the tagged line format.
    ///
    /// Returns an empty sequence when the texts have the same lines.
    pub fn diff_texts(&self, old: &str, new: &str) -> Vec<DiffLine> {
        let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
        let new_lines: Vec<&str> = new.split_inclusive('\n').collect();

        let entries: Vec<(DiffOp, &str)> = self
            .diff(&old_lines, &new_lines)
            .into_iter()
            .flat_map(|chunk| {
                let op = chunk.op;
                chunk.tokens.into_iter().map(move |line| (op, line))
            })
            .collect();

        if entries.iter().all(|(op, _)| *op == DiffOp::Equal) {
            return Vec::new();
        }

        let mut out = Vec::new();
        match self.context {
            None => {
                for (op, line) in &entries {
                    push_line(&mut out, *op, line);
                }
            }
            Some(context) => {
                for range in hunk_ranges(&entries, context) {
                    out.push(DiffLine::new(hunk_header(&entries, range.clone())));
                    for (op, line) in &entries[range] {
                        push_line(&mut out, *op, line);
                    }
                }
            }
        }
        out
    }
}

fn to_usize(range: &Range<u32>) -> Range<usize> {
    range.start as usize..range.end as usize
}

fn push_run<T: Clone>(chunks: &mut Vec<DiffChunk<T>>, op: DiffOp, tokens: &[T]) {
    if tokens.is_empty() {
        return;
    }
    match chunks.last_mut() {
        Some(last) if last.op == op => last.tokens.extend_from_slice(tokens),
        _ => chunks.push(DiffChunk {
            op,
            tokens: tokens.to_vec(),
        }),
    }
}

fn push_line(out: &mut Vec<DiffLine>, op: DiffOp, line: &str) {
    let mut text = String::with_capacity(line.len() + 2);
    text.push(op.marker());
    text.push_str(line);
    if line.ends_with('\n') {
        out.push(DiffLine::new(text));
    } else {
        text.push('\n');
        out.push(DiffLine::new(text));
        out.push(DiffLine::new(format!("{NO_NEWLINE_MARKER}\n")));
    }
}

/// Entry ranges of unified hunks; changes closer than `2 * context` lines share a hunk
fn hunk_ranges(entries: &[(DiffOp, &str)], context: usize) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (idx, _) in entries
        .iter()
        .enumerate()
        .filter(|(_, (op, _))| *op != DiffOp::Equal)
    {
        let start = idx.saturating_sub(context);
        let end = (idx + context + 1).min(entries.len());
        match ranges.last_mut() {
            Some(last) if start <= last.end => last.end = last.end.max(end),
            _ => ranges.push(start..end),
        }
    }
    ranges
}

fn hunk_header(entries: &[(DiffOp, &str)], range: Range<usize>) -> String {
    let head = &entries[..range.start];
    let body = &entries[range];
    format!(
        "@@ -{} +{} @@\n",
        hunk_span(side_count(head, DiffOp::Delete), side_count(body, DiffOp::Delete)),
        hunk_span(side_count(head, DiffOp::Insert), side_count(body, DiffOp::Insert))
    )
}

/// Lines of one side: shared lines plus those tagged `side`
fn side_count(entries: &[(DiffOp, &str)], side: DiffOp) -> usize {
    entries
        .iter()
        .filter(|(op, _)| *op == DiffOp::Equal || *op == side)
        .count()
}

fn hunk_span(lines_before: usize, count: usize) -> String {
    let start = if count == 0 {
        lines_before
    } else {
        lines_before + 1
    };
    if count == 1 {
        start.to_string()
    } else {
        format!("{start},{count}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[DiffLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text()).collect()
    }

    #[test]
    fn test_diff_chars() {
        let engine = DiffEngine::new();
        let old: Vec<char> = "foo bar baz".chars().collect();
        let new: Vec<char> = "foo qux baz".chars().collect();
        let chunks = engine.diff(&old, &new);

        let ops: Vec<DiffOp> = chunks.iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![DiffOp::Equal, DiffOp::Delete, DiffOp::Insert, DiffOp::Equal]
        );
        assert_eq!(chunks[1].tokens, vec!['b', 'a', 'r']);
        assert_eq!(chunks[2].tokens, vec!['q', 'u', 'x']);
        assert_eq!(chunks[3].tokens, vec![' ', 'b', 'a', 'z']);
    }

    #[test]
    fn test_diff_identical_is_single_equal_chunk() {
        let engine = DiffEngine::new();
        let seq = vec![1, 2, 3];
        let chunks = engine.diff(&seq, &seq);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].op, DiffOp::Equal);
        assert_eq!(chunks[0].tokens, seq);
    }

    #[test]
    fn test_diff_empty_sides() {
        let engine = DiffEngine::new();
        let empty: Vec<u8> = Vec::new();
        assert!(engine.diff(&empty, &empty).is_empty());

        let chunks = engine.diff(&empty, &[1u8, 2]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].op, DiffOp::Insert);
    }

    #[test]
    fn test_diff_chars_every_algorithm() {
        let old: Vec<char> = "foo bar baz".chars().collect();
        let new: Vec<char> = "foo qux baz".chars().collect();
        for algorithm in [
            DiffAlgorithm::Myers,
            DiffAlgorithm::MyersMinimal,
            DiffAlgorithm::Histogram,
        ] {
            let engine = DiffEngine::new().with_algorithm(algorithm);
            assert_eq!(engine.algorithm(), algorithm);
            let chunks = engine.diff(&old, &new);
            assert_eq!(
                chunks,
                vec![
                    DiffChunk {
                        op: DiffOp::Equal,
                        tokens: "foo ".chars().collect(),
                    },
                    DiffChunk {
                        op: DiffOp::Delete,
                        tokens: "bar".chars().collect(),
                    },
                    DiffChunk {
                        op: DiffOp::Insert,
                        tokens: "qux".chars().collect(),
                    },
                    DiffChunk {
                        op: DiffOp::Equal,
                        tokens: " baz".chars().collect(),
                    },
                ],
                "{algorithm:?}"
            );
        }
    }

    #[test]
    fn test_token_estimate() {
        assert_eq!(TokenSlice(&[1u8, 2, 3]).estimate_tokens(), 3);
        assert_eq!(TokenSlice::<u8>(&[]).estimate_tokens(), 0);
    }

    #[test]
    fn test_diff_texts_with_histogram() {
        let engine = DiffEngine::new().with_algorithm(DiffAlgorithm::Histogram);
        let lines = engine.diff_texts("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(texts(&lines), vec![" a\n", "-b\n", "+B\n", " c\n"]);
    }

    #[test]
    fn test_diff_texts_full_context() {
        let engine = DiffEngine::new();
        let lines = engine.diff_texts("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(texts(&lines), vec![" a\n", "-b\n", "+B\n", " c\n"]);
    }

    #[test]
    fn test_diff_texts_identical_is_empty() {
        let engine = DiffEngine::new();
        assert!(engine.diff_texts("same\n", "same\n").is_empty());
    }

    #[test]
    fn test_diff_texts_missing_trailing_newline() {
        let engine = DiffEngine::new();
        let lines = engine.diff_texts("a", "b");
        assert_eq!(
            texts(&lines),
            vec![
                "-a\n",
                "\\ No newline at end of file\n",
                "+b\n",
                "\\ No newline at end of file\n",
            ]
        );
    }

    #[test]
    fn test_diff_texts_unified_hunks() {
        let old = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n";
        let new = "1\nTWO\n3\n4\n5\n6\n7\n8\n9\nTEN\n";
        let engine = DiffEngine::new().with_context(Some(1));
        let lines = engine.diff_texts(old, new);
        assert_eq!(
            texts(&lines),
            vec![
                "@@ -1,3 +1,3 @@\n",
                " 1\n",
                "-2\n",
                "+TWO\n",
                " 3\n",
                "@@ -9,2 +9,2 @@\n",
                " 9\n",
                "-10\n",
                "+TEN\n",
            ]
        );
    }

    #[test]
    fn test_diff_texts_close_changes_share_hunk() {
        let old = "a\nb\nc\nd\n";
        let new = "A\nb\nc\nD\n";
        let engine = DiffEngine::new().with_context(Some(1));
        let lines = engine.diff_texts(old, new);
        assert_eq!(lines.iter().filter(|l| l.text().starts_with("@@")).count(), 1);
        assert_eq!(lines[0].text(), "@@ -1,4 +1,4 @@\n");
    }

    #[test]
    fn test_hunk_span_formats() {
        assert_eq!(hunk_span(0, 0), "0,0");
        assert_eq!(hunk_span(4, 1), "5");
        assert_eq!(hunk_span(4, 3), "5,3");
    }
}
