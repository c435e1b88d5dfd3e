//! Annotated source excerpts for template errors.
//!
//! A [`Diagnostic`] bundles an error message, labelled spans, and the
//! template source so the error can be shown as an excerpt:
//!
//! ```text
//!   × Failed lookup for key [1b] in 3
//!    ╭─[2:17]
//!  1 │ {% load multiply from custom_filters %}
//!  2 │ {{ num|multiply:foo.bar.1b.baz }}
//!    ·                 ───┬─── ─┬
//!    ·                    │     ╰── key
//!    ·                    ╰── 3
//!    ╰────
//! ```
//!
//! The layout is produced by miette's graphical report handler with the
//! colourless unicode theme, so it is byte-for-byte stable.

use std::fmt;

use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, SourceCode};
use rusty_templates_core::span::Span;

/// A labelled region of the template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// The region being annotated.
    pub span: Span,
    /// Text printed next to the underline.
    pub text: String,
    /// Whether this is the label the error is about.
    pub primary: bool,
}

impl Label {
    /// Creates the primary label of a diagnostic.
    pub fn primary(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
            primary: true,
        }
    }

    /// Creates a secondary label.
    pub fn secondary(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
            primary: false,
        }
    }
}

/// A structured error ready to be rendered against its source.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    source: String,
}

impl Diagnostic {
    /// Creates a diagnostic with no labels.
    pub fn new(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            labels: Vec::new(),
            help: None,
            source: source.into(),
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds several labels.
    #[must_use]
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = Label>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// Attaches a help line printed below the excerpt.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// All labels, in the order they were added.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// The help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The template source the spans refer to.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The label marked primary, falling back to the first label.
    pub fn primary_label(&self) -> Option<&Label> {
        self.labels
            .iter()
            .find(|label| label.primary)
            .or_else(|| self.labels.first())
    }

    /// The 1-based `(line, column)` of the primary label.
    pub fn location(&self) -> Option<(usize, usize)> {
        self.primary_label()
            .map(|label| label.span.line_col(&self.source))
    }

    /// The source text each label covers, in label order.
    pub fn highlighted(&self) -> Vec<&str> {
        self.labels
            .iter()
            .filter_map(|label| label.span.slice(&self.source))
            .collect()
    }

    /// Renders the diagnostic with the default formatter.
    pub fn render(&self) -> String {
        DiagnosticFormatter::default().render(self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Diagnostic {}

impl miette::Diagnostic for Diagnostic {
    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source)
    }

    // Labels are handed over without a primary marker; the excerpt header
    // then points at the earliest label.
    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Box::new(self.labels.iter().map(|label| {
            let text = (!label.text.is_empty()).then(|| label.text.clone());
            LabeledSpan::new(text, label.span.start, label.span.len())
        })))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn fmt::Display + 'a>)
    }
}

/// Renders [`Diagnostic`]s as annotated source excerpts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticFormatter {
    width: usize,
    context_lines: usize,
}

impl Default for DiagnosticFormatter {
    fn default() -> Self {
        Self {
            width: 200,
            context_lines: 1,
        }
    }
}

impl DiagnosticFormatter {
    /// Creates a formatter with the default width and one line of context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column width messages are wrapped at.
    #[must_use]
    pub const fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Sets how many unlabelled lines are shown around each labelled line.
    #[must_use]
    pub const fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Renders a diagnostic to a string.
    ///
    /// Every excerpt header carries the `[line:col]` of its first label,
    /// whether the excerpt spans one line or several.
    ///
    /// Falls back to the bare message if the report cannot be laid out,
    /// which only happens when a span lies outside the source.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
            .with_width(self.width)
            .with_context_lines(self.context_lines)
            .without_primary_span_start();
        let mut out = String::new();
        match handler.render_report(&mut out, diagnostic) {
            Ok(()) => stamp_excerpt_headers(&out, diagnostic),
            Err(_) => {
                tracing::debug!(message = %diagnostic.message, "diagnostic could not be laid out");
                format!("  × {}\n", diagnostic.message)
            }
        }
    }
}

// miette leaves the header bare for unnamed single-line excerpts, so the
// handler is told to never write one and the location goes in here. Columns
// count chars, matching `Diagnostic::location`.
fn stamp_excerpt_headers(report: &str, diagnostic: &Diagnostic) -> String {
    let mut starts: Vec<(usize, usize)> = diagnostic
        .labels
        .iter()
        .map(|label| label.span.line_col(&diagnostic.source))
        .collect();
    starts.sort_unstable();

    let mut out = String::with_capacity(report.len() + 16);
    let mut lines = report.split_inclusive('\n').peekable();
    while let Some(line) = lines.next() {
        let header = line.trim_start_matches(' ');
        if header.trim_end() == "╭────" {
            let first_line = lines.peek().and_then(|next| excerpt_line_number(next));
            let start = first_line
                .and_then(|first| starts.iter().find(|(label_line, _)| *label_line >= first));
            if let Some((label_line, column)) = start {
                out.push_str(&line[..line.len() - header.len()]);
                out.push_str(&format!("╭─[{label_line}:{column}]\n"));
                continue;
            }
        }
        out.push_str(line);
    }
    out
}

fn excerpt_line_number(line: &str) -> Option<usize> {
    let (number, _) = line.split_once('│')?;
    number.trim().parse().ok()
}
