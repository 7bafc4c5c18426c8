//! Diff lines, their classification, and the rows they render to

use crate::marked::{Escaper, MarkedLine, Markup};
use serde::{Deserialize, Serialize};

/// Text of the metadata line that follows a last line without newline
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// One line of a textual diff, leading marker included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    text: String,
}

impl DiffLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Split a diff text into lines, keeping line endings
    pub fn parse(diff: &str) -> Vec<Self> {
        diff.split_inclusive('\n').map(Self::new).collect()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> LineKind {
        LineKind::classify(&self.text)
    }

    pub fn is_no_newline_marker(&self) -> bool {
        chomp(&self.text) == NO_NEWLINE_MARKER
    }
}

impl From<&str> for DiffLine {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Strip one trailing line ending (`\n`, `\r\n` or `\r`)
pub fn chomp(text: &str) -> &str {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.strip_suffix('\r').unwrap_or(text)
}

/// `---`, `+++` and `\` lines are diff metadata, whatever their first character
pub fn is_comment_marker(text: &str) -> bool {
    text.starts_with("---") || text.starts_with("+++") || text.starts_with('\\')
}

/// Classification of a diff line by its leading characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Comment,
    HunkHeader,
    Added,
    Removed,
    Context,
    Unrecognized,
}

impl LineKind {
    pub fn classify(text: &str) -> Self {
        if is_comment_marker(text) {
            return LineKind::Comment;
        }
        if text.starts_with("@@") {
            return LineKind::HunkHeader;
        }
        match text.chars().next() {
            Some('+') => LineKind::Added,
            Some('-') => LineKind::Removed,
            Some(' ') => LineKind::Context,
            _ => LineKind::Unrecognized,
        }
    }

    pub fn row_kind(self) -> Option<RowKind> {
        match self {
            LineKind::Comment => Some(RowKind::Comment),
            LineKind::HunkHeader => Some(RowKind::BlockInfo),
            LineKind::Added => Some(RowKind::Inserted),
            LineKind::Removed => Some(RowKind::Deleted),
            LineKind::Context => Some(RowKind::Unchanged),
            LineKind::Unrecognized => None,
        }
    }
}

/// Row category, serialized as its CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKind {
    #[serde(rename = "diff-comment")]
    Comment,
    #[serde(rename = "ins")]
    Inserted,
    #[serde(rename = "del")]
    Deleted,
    #[serde(rename = "unchanged")]
    Unchanged,
    #[serde(rename = "diff-block-info")]
    BlockInfo,
}

impl RowKind {
    pub fn css_class(self) -> &'static str {
        match self {
            RowKind::Comment => "diff-comment",
            RowKind::Inserted => "ins",
            RowKind::Deleted => "del",
            RowKind::Unchanged => "unchanged",
            RowKind::BlockInfo => "diff-block-info",
        }
    }
}

/// One rendered row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub kind: RowKind,
    pub old_line: Option<usize>,
    pub new_line: Option<usize>,
    /// Escaped content, possibly holding emphasis markers
    pub content: String,
}

/// How a classified line's content is produced
pub struct RowStyle<'a> {
    pub escaper: &'a dyn Escaper,
    pub markup: &'a Markup,
    /// Wrap the leading marker in the symbol markup instead of dropping it
    pub keep_symbol: bool,
}

/// Old/new gutter counters for one render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineNumbers {
    pub old: usize,
    pub new: usize,
}

impl LineNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one line and advance the counters it touches.
    ///
    /// Lines with an unknown leading character produce no row.
    pub fn classify(&mut self, line: &MarkedLine, style: &RowStyle<'_>) -> Option<Row> {
        let text = line.text();
        let kind = LineKind::classify(&text).row_kind()?;

        let (old_line, new_line) = match kind {
            RowKind::Comment | RowKind::BlockInfo => {
                let content = style.escaper.escape(chomp(&text)).into_owned();
                return Some(Row {
                    kind,
                    old_line: None,
                    new_line: None,
                    content,
                });
            }
            RowKind::Inserted => {
                self.new += 1;
                (None, Some(self.new))
            }
            RowKind::Deleted => {
                self.old += 1;
                (Some(self.old), None)
            }
            RowKind::Unchanged => {
                self.old += 1;
                self.new += 1;
                (Some(self.old), Some(self.new))
            }
        };

        Some(Row {
            kind,
            old_line,
            new_line,
            content: clean_line(line, style),
        })
    }

    /// Decimal digit count of the old counter
    pub fn old_width(&self) -> usize {
        digits(self.old)
    }

    /// Decimal digit count of the new counter
    pub fn new_width(&self) -> usize {
        digits(self.new)
    }
}

fn digits(n: usize) -> usize {
    n.to_string().len()
}

fn clean_line(line: &MarkedLine, style: &RowStyle<'_>) -> String {
    let (symbol, rest) = line.split_first_char();
    let mut content = String::new();
    if style.keep_symbol {
        if let Some(symbol) = symbol {
            let mut buf = [0; 4];
            content.push_str(&style.markup.symbol_open);
            content.push_str(&style.escaper.escape(symbol.encode_utf8(&mut buf)));
            content.push_str(&style.markup.symbol_close);
        }
    }
    content.push_str(&rest.render(style.escaper, style.markup));
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marked::{HtmlEscaper, Span};

    fn style<'a>(markup: &'a Markup, keep_symbol: bool) -> RowStyle<'a> {
        RowStyle {
            escaper: &HtmlEscaper,
            markup,
            keep_symbol,
        }
    }

    fn row(numbers: &mut LineNumbers, text: &str) -> Option<Row> {
        let markup = Markup::default();
        numbers.classify(&MarkedLine::plain(chomp(text)), &style(&markup, false))
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(LineKind::classify("--- a/file"), LineKind::Comment);
        assert_eq!(LineKind::classify("+++ b/file"), LineKind::Comment);
        assert_eq!(LineKind::classify("\\ No newline"), LineKind::Comment);
        assert_eq!(LineKind::classify("@@ -1 +1 @@"), LineKind::HunkHeader);
        assert_eq!(LineKind::classify("+x"), LineKind::Added);
        assert_eq!(LineKind::classify("-x"), LineKind::Removed);
        assert_eq!(LineKind::classify("--x"), LineKind::Removed);
        assert_eq!(LineKind::classify(" x"), LineKind::Context);
        assert_eq!(LineKind::classify("diff --git a b"), LineKind::Unrecognized);
        assert_eq!(LineKind::classify(""), LineKind::Unrecognized);
    }

    #[test]
    fn test_context_row() {
        let mut numbers = LineNumbers::new();
        let row = row(&mut numbers, " context\n").unwrap();
        assert_eq!(row.kind, RowKind::Unchanged);
        assert_eq!(row.old_line, Some(1));
        assert_eq!(row.new_line, Some(1));
        assert_eq!(row.content, "context");
    }

    #[test]
    fn test_comment_rows_have_no_gutter() {
        let mut numbers = LineNumbers::new();
        let first = row(&mut numbers, "--- a\n").unwrap();
        let second = row(&mut numbers, "+++ b\n").unwrap();
        assert_eq!(first.kind, RowKind::Comment);
        assert_eq!(first.content, "--- a");
        assert_eq!(first.old_line, None);
        assert_eq!(second.content, "+++ b");
        assert_eq!(second.new_line, None);
        assert_eq!(numbers, LineNumbers::new());
    }

    #[test]
    fn test_counters_follow_line_order() {
        let mut numbers = LineNumbers::new();
        let rows: Vec<Row> = ["-a\n", " b\n", "+c\n", "+d\n", "-e\n"]
            .iter()
            .filter_map(|l| row(&mut numbers, l))
            .collect();
        let old: Vec<_> = rows.iter().map(|r| r.old_line).collect();
        let new: Vec<_> = rows.iter().map(|r| r.new_line).collect();
        assert_eq!(old, vec![Some(1), Some(2), None, None, Some(3)]);
        assert_eq!(new, vec![None, Some(1), Some(2), Some(3), None]);
    }

    #[test]
    fn test_unrecognized_line_is_dropped() {
        let mut numbers = LineNumbers::new();
        assert!(row(&mut numbers, "index 123..456\n").is_none());
        assert_eq!(numbers, LineNumbers::new());
    }

    #[test]
    fn test_hunk_header_verbatim() {
        let mut numbers = LineNumbers::new();
        let row = row(&mut numbers, "@@ -1,2 +1,2 @@\n").unwrap();
        assert_eq!(row.kind, RowKind::BlockInfo);
        assert_eq!(row.content, "@@ -1,2 +1,2 @@");
    }

    #[test]
    fn test_symbol_wrapper() {
        let markup = Markup::default();
        let mut numbers = LineNumbers::new();
        let row = numbers
            .classify(&MarkedLine::plain("+<b>"), &style(&markup, true))
            .unwrap();
        assert_eq!(row.content, "<span class=\"symbol\">+</span>&lt;b&gt;");
    }

    #[test]
    fn test_emphasis_survives_marker_strip() {
        let markup = Markup::default();
        let mut numbers = LineNumbers::new();
        let line = MarkedLine::from_spans(vec![
            Span::plain("-"),
            Span::plain("a"),
            Span::emphasized("b"),
        ]);
        let row = numbers.classify(&line, &style(&markup, false)).unwrap();
        assert_eq!(row.content, "a<strong>b</strong>");
    }

    #[test]
    fn test_gutter_width() {
        let numbers = LineNumbers { old: 12, new: 0 };
        assert_eq!(numbers.old_width(), 2);
        assert_eq!(numbers.new_width(), 1);
    }

    #[test]
    fn test_parse_keeps_line_endings() {
        let lines = DiffLine::parse("-a\n+b\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text(), "+b\n");
        assert_eq!(lines[1].kind(), LineKind::Added);
        assert!(DiffLine::new("\\ No newline at end of file\n").is_no_newline_marker());
    }
}
