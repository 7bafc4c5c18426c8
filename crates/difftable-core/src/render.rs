//! Diff rendering into gutter-numbered rows

use crate::chunk;
use crate::engine::{DiffAlgorithm, DiffEngine};
use crate::highlight::{HighlightError, Highlighter, DEFAULT_SHARED_RUN_FOLD_LIMIT};
use crate::line::{chomp, DiffLine, LineNumbers, Row, RowStyle};
use crate::marked::{Escaper, HtmlEscaper, MarkedLine, Markup};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Highlight error: {0}")]
    Highlight(#[from] HighlightError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rendering options
///
/// Example (JSON):
/// ```json
/// {
///   "highlight_words": true,
///   "include_plus_and_minus_in_html": false,
///   "ignore_crlf": false,
///   "shared_run_fold_limit": 4,
///   "hide_no_newline_marker": true,
///   "algorithm": "myers"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Pair removal/insertion runs and highlight changed characters
    pub highlight_words: bool,
    /// Wrap the leading `+`/`-`/space in the symbol markup instead of dropping it
    pub include_plus_and_minus_in_html: bool,
    /// Treat `\r\n` like `\n` when tokenizing for the character diff
    pub ignore_crlf: bool,
    /// Shared runs shorter than this between two changes are highlighted too
    pub shared_run_fold_limit: usize,
    /// Drop `\ No newline at end of file` lines before pairing
    pub hide_no_newline_marker: bool,
    pub algorithm: DiffAlgorithm,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            highlight_words: false,
            include_plus_and_minus_in_html: false,
            ignore_crlf: false,
            shared_run_fold_limit: DEFAULT_SHARED_RUN_FOLD_LIMIT,
            hide_no_newline_marker: true,
            algorithm: DiffAlgorithm::default(),
        }
    }
}

/// Rows plus the gutter widths consumers size their columns with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffTable {
    pub old_gutter_width: usize,
    pub new_gutter_width: usize,
    pub rows: Vec<Row>,
}

/// Result of a render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedDiff {
    /// No line produced a row
    Empty,
    Table(DiffTable),
}

impl RenderedDiff {
    pub fn is_empty(&self) -> bool {
        matches!(self, RenderedDiff::Empty)
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            RenderedDiff::Empty => &[],
            RenderedDiff::Table(table) => &table.rows,
        }
    }

    pub fn table(&self) -> Option<&DiffTable> {
        match self {
            RenderedDiff::Empty => None,
            RenderedDiff::Table(table) => Some(table),
        }
    }

    /// HTML container with one table row per rendered line
    pub fn to_html(&self) -> String {
        let table = match self {
            RenderedDiff::Empty => return "<div class=\"diff\"></div>".to_string(),
            RenderedDiff::Table(table) => table,
        };

        let mut html = String::new();
        html.push_str(&format!(
            "<div class=\"diff\" data-old-gutter=\"{}\" data-new-gutter=\"{}\">\n",
            table.old_gutter_width, table.new_gutter_width
        ));
        html.push_str("  <table>\n");
        for row in &table.rows {
            html.push_str(&format!(
                "    <tr class=\"{}\"><td class=\"gutter-old\">{}</td><td class=\"gutter-new\">{}</td><td class=\"line\">{}</td></tr>\n",
                row.kind.css_class(),
                gutter(row.old_line),
                gutter(row.new_line),
                row.content
            ));
        }
        html.push_str("  </table>\n</div>\n");
        html
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn gutter(line: Option<usize>) -> String {
    line.map(|n| n.to_string()).unwrap_or_default()
}

/// Renders diff lines into rows
pub struct DiffRenderer {
    options: RenderOptions,
    engine: DiffEngine,
    escaper: Box<dyn Escaper>,
    markup: Markup,
}

impl DiffRenderer {
    pub fn new(options: RenderOptions) -> Self {
        let engine = DiffEngine::new().with_algorithm(options.algorithm);
        Self {
            options,
            engine,
            escaper: Box::new(HtmlEscaper),
            markup: Markup::default(),
        }
    }

    pub fn with_escaper(mut self, escaper: impl Escaper + 'static) -> Self {
        self.escaper = Box::new(escaper);
        self
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    /// Engine used by `render_texts` for the line diff.
    ///
    /// The character diff keeps the algorithm named in the options.
    pub fn with_engine(mut self, engine: DiffEngine) -> Self {
        self.engine = engine.with_algorithm(self.options.algorithm);
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn engine(&self) -> &DiffEngine {
        &self.engine
    }

    /// Render a tagged line sequence
    pub fn render(&self, lines: &[DiffLine]) -> Result<RenderedDiff, RenderError> {
        log::debug!(
            "Rendering {} diff lines (highlight_words={})",
            lines.len(),
            self.options.highlight_words
        );

        let resolved = if self.options.highlight_words {
            let chunks = chunk::group(
                lines
                    .iter()
                    .filter(|l| !(self.options.hide_no_newline_marker && l.is_no_newline_marker()))
                    .map(DiffLine::text),
            );
            let highlighter = Highlighter::new(&self.engine)
                .with_ignore_crlf(self.options.ignore_crlf)
                .with_fold_limit(self.options.shared_run_fold_limit);
            chunk::resolve(&chunks, &highlighter)?
        } else {
            lines
                .iter()
                .map(|l| MarkedLine::plain(chomp(l.text())))
                .collect()
        };

        Ok(self.assemble(&resolved))
    }

    /// Diff two texts line by line and render the result
    pub fn render_texts(&self, old: &str, new: &str) -> Result<RenderedDiff, RenderError> {
        self.render(&self.engine.diff_texts(old, new))
    }

    fn assemble(&self, lines: &[MarkedLine]) -> RenderedDiff {
        let style = RowStyle {
            escaper: self.escaper.as_ref(),
            markup: &self.markup,
            keep_symbol: self.options.include_plus_and_minus_in_html,
        };
        let mut numbers = LineNumbers::new();
        let rows: Vec<Row> = lines
            .iter()
            .filter_map(|line| numbers.classify(line, &style))
            .collect();

        log::debug!(
            "Rendered {} rows (old={}, new={})",
            rows.len(),
            numbers.old,
            numbers.new
        );

        if rows.is_empty() {
            return RenderedDiff::Empty;
        }
        RenderedDiff::Table(DiffTable {
            old_gutter_width: numbers.old_width(),
            new_gutter_width: numbers.new_width(),
            rows,
        })
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}
