//! Structured emphasis model
//!
//! Highlighted text is kept as spans until the very end, so markers are
//! balanced per line by construction and adjacent emphasized runs merge.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A run of text that is either emphasized or plain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub emphasized: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: false,
        }
    }

    pub fn emphasized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: true,
        }
    }
}

/// One output line made of spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkedLine {
    spans: Vec<Span>,
}

impl MarkedLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        let mut line = Self::new();
        line.push_str(&text.into(), false);
        line
    }

    pub fn from_spans(spans: impl IntoIterator<Item = Span>) -> Self {
        let mut line = Self::new();
        for span in spans {
            line.push_str(&span.text, span.emphasized);
        }
        line
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Append text; empty text is ignored and equal emphasis extends the last span
    pub fn push_str(&mut self, text: &str, emphasized: bool) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.emphasized == emphasized => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                emphasized,
            }),
        }
    }

    pub fn push(&mut self, c: char, emphasized: bool) {
        let mut buf = [0; 4];
        self.push_str(c.encode_utf8(&mut buf), emphasized);
    }

    /// Text without markers
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn emphasis_count(&self) -> usize {
        self.spans.iter().filter(|s| s.emphasized).count()
    }

    /// Detach the first character (the diff marker) from the rest of the line
    pub fn split_first_char(&self) -> (Option<char>, MarkedLine) {
        let mut rest = MarkedLine::new();
        let mut first = None;
        for span in &self.spans {
            if first.is_none() {
                let mut chars = span.text.chars();
                first = chars.next();
                rest.push_str(chars.as_str(), span.emphasized);
            } else {
                rest.push_str(&span.text, span.emphasized);
            }
        }
        (first, rest)
    }

    /// Flatten to escaped text with emphasis markers
    pub fn render(&self, escaper: &dyn Escaper, markup: &Markup) -> String {
        let mut out = String::new();
        for span in &self.spans {
            let text = escaper.escape(&span.text);
            if span.emphasized {
                out.push_str(&markup.emphasis_open);
                out.push_str(&text);
                out.push_str(&markup.emphasis_close);
            } else {
                out.push_str(&text);
            }
        }
        out
    }
}

/// Escaping applied to text when flattening
pub trait Escaper: Send + Sync {
    fn escape<'a>(&self, text: &'a str) -> Cow<'a, str>;
}

/// HTML entity escaping of `& < > " '`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscaper;

impl Escaper for HtmlEscaper {
    fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains(['&', '<', '>', '"', '\'']) {
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(c),
            }
        }
        Cow::Owned(out)
    }
}

/// Pass text through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEscape;

impl Escaper for NoEscape {
    fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }
}

/// Literal marker text used when flattening
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markup {
    pub emphasis_open: String,
    pub emphasis_close: String,
    pub symbol_open: String,
    pub symbol_close: String,
}

impl Default for Markup {
    fn default() -> Self {
        Self {
            emphasis_open: "<strong>".to_string(),
            emphasis_close: "</strong>".to_string(),
            symbol_open: "<span class=\"symbol\">".to_string(),
            symbol_close: "</span>".to_string(),
        }
    }
}
