//! Template parser.
//!
//! Converts a stream of lexer [`Token`]s into a list of [`Node`]s. Variable
//! expressions are parsed into a base [`Operand`] and a chain of
//! [`FilterInvocation`]s whose filters are bound at parse time, and
//! `{% load %}` tags are executed here: they populate the template's
//! [`FilterRegistry`] and leave an inert [`Node::Tag`] behind.
//!
//! Variable expressions follow Django's grammar:
//!
//! ```text
//! expression := (constant | var) filter*
//! filter     := ws* '|' ws* name (':' (constant | var))?
//! constant   := "..." | '...'
//! var        := [\w.]+ | [-+.]?\d[\d.e]*
//! ```
//!
//! A `var` that reads as a number is a numeric literal; otherwise it is a
//! dotted path.

use std::fmt;
use std::sync::Arc;

use rusty_templates_core::span::Span;
use rusty_templates_core::value::Value;

use crate::error::ParseError;
use crate::filters::{Filter, FilterRegistry};
use crate::lexer::{self, Token, TokenKind};
use crate::library::{Library, LibraryLookup};

/// One name in a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The segment text.
    pub name: String,
    /// Where the segment appears in the source.
    pub at: Span,
}

/// A dotted variable path such as `foo.bar.1b.baz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePath {
    /// The segments, first to last. Never empty.
    pub segments: Vec<Segment>,
    /// Span of the whole path.
    pub at: Span,
}

impl VariablePath {
    /// Parses a path, computing each segment's span from `offset`.
    fn new(text: &str, offset: usize) -> Self {
        let mut segments = Vec::new();
        let mut start = 0;
        for part in text.split('.') {
            segments.push(Segment {
                name: part.to_string(),
                at: Span::with_len(offset + start, part.len()),
            });
            start += part.len() + 1;
        }
        Self {
            segments,
            at: Span::with_len(offset, text.len()),
        }
    }

    /// Span from the start of the path to the end of segment `index`.
    pub fn prefix_span(&self, index: usize) -> Span {
        self.segments
            .get(index)
            .map_or(self.at, |segment| Span::new(self.at.start, segment.at.end))
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
        }
        Ok(())
    }
}

/// A value in an expression: a literal or a path to resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A string or numeric literal. String literals are safe.
    Literal {
        /// The literal value.
        value: Value,
        /// Span of the literal's source text.
        at: Span,
    },
    /// A dotted path resolved against the context.
    Path(VariablePath),
}

impl Operand {
    /// Span of the operand's source text.
    pub const fn span(&self) -> Span {
        match self {
            Self::Literal { at, .. } => *at,
            Self::Path(path) => path.at,
        }
    }
}

/// A filter application in a chain, bound to its implementation.
#[derive(Clone)]
pub struct FilterInvocation {
    /// The name the filter was used under.
    pub name: String,
    /// The library the filter was loaded from.
    pub library: String,
    /// The bound implementation.
    pub filter: Arc<dyn Filter>,
    /// The argument after `:`, if any.
    pub argument: Option<Operand>,
    /// Span of the name and argument.
    pub at: Span,
}

impl fmt::Debug for FilterInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterInvocation")
            .field("name", &self.name)
            .field("library", &self.library)
            .field("argument", &self.argument)
            .field("at", &self.at)
            .finish_non_exhaustive()
    }
}

/// The contents of a `{{ }}` tag.
#[derive(Debug, Clone)]
pub struct FilterExpression {
    /// The value being filtered.
    pub base: Operand,
    /// Filters to apply in order.
    pub filters: Vec<FilterInvocation>,
    /// The expression's source text.
    pub token: String,
    /// Span of the expression's source text.
    pub at: Span,
}

/// The effect of a `{% load %}` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Load {
    /// `{% load lib1 lib2 %}`
    Libraries(Vec<String>),
    /// `{% load name1 name2 from lib %}`
    Filters {
        /// The filters imported.
        names: Vec<String>,
        /// The library they come from.
        library: String,
    },
}

/// A block tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// `{% load %}`. Applied while parsing; renders nothing.
    Load(Load),
}

/// A node in the parsed template.
#[derive(Debug, Clone)]
pub enum Node {
    /// A literal text segment.
    Text {
        /// The text, output verbatim.
        text: String,
        /// Span of the text.
        at: Span,
    },
    /// A `{{ }}` variable with optional filter chain.
    Variable {
        /// The parsed expression.
        expression: FilterExpression,
        /// Span of the whole tag.
        at: Span,
    },
    /// A `{% %}` block tag.
    Tag {
        /// The parsed tag.
        tag: Tag,
        /// Span of the whole tag.
        at: Span,
    },
}

impl Node {
    /// Span of the node's source text.
    pub const fn span(&self) -> Span {
        match self {
            Self::Text { at, .. } | Self::Variable { at, .. } | Self::Tag { at, .. } => *at,
        }
    }
}

/// Builds nodes from template source, binding filters as `load` tags are met.
pub struct Parser<'a> {
    source: &'a str,
    lookup: &'a dyn LibraryLookup,
    registry: FilterRegistry,
}

impl<'a> Parser<'a> {
    /// Creates a parser with an empty filter scope.
    pub fn new(source: &'a str, lookup: &'a dyn LibraryLookup) -> Self {
        Self {
            source,
            lookup,
            registry: FilterRegistry::new(),
        }
    }

    /// Loads libraries into scope before parsing, like an implicit
    /// `{% load %}` at the top of the template.
    ///
    /// An unknown library is reported with an empty span at offset 0.
    pub fn load_builtins(&mut self, names: &[String]) -> Result<(), ParseError> {
        for name in names {
            let library = self.find_library(name, Span::default())?;
            self.load_library(&library);
        }
        Ok(())
    }

    /// Parses the whole source.
    ///
    /// # Errors
    ///
    /// Returns the first lex or parse error; no partial result is produced.
    pub fn parse(mut self) -> Result<(Vec<Node>, FilterRegistry), ParseError> {
        let tokens = lexer::tokenize(self.source)?;
        let mut nodes = Vec::with_capacity(tokens.len());

        for token in tokens {
            match token.kind {
                TokenKind::Text => nodes.push(Node::Text {
                    text: token.content.to_string(),
                    at: token.at,
                }),
                TokenKind::Variable => nodes.push(self.parse_variable(&token)?),
                TokenKind::Block => nodes.push(self.parse_block(&token)?),
                TokenKind::Comment => {}
            }
        }

        Ok((nodes, self.registry))
    }

    fn line_of(&self, span: Span) -> usize {
        span.line_col(self.source).0
    }

    fn parse_variable(&self, token: &Token<'_>) -> Result<Node, ParseError> {
        if token.content.is_empty() {
            return Err(ParseError::EmptyVariable {
                line: self.line_of(token.at),
                at: token.at,
            });
        }
        let expression = self.parse_filter_expression(token.content, token.content_at.start)?;
        Ok(Node::Variable {
            expression,
            at: token.at,
        })
    }

    fn parse_block(&mut self, token: &Token<'_>) -> Result<Node, ParseError> {
        let bits = lexer::split_tag_bits(token.content, token.content_at.start);
        let Some(&(command, command_at)) = bits.first() else {
            return Err(ParseError::EmptyTag {
                line: self.line_of(token.at),
                at: token.at,
            });
        };

        match command {
            "load" => {
                let load = self.parse_load(&bits[1..])?;
                Ok(Node::Tag {
                    tag: Tag::Load(load),
                    at: token.at,
                })
            }
            _ => Err(ParseError::UnknownTag {
                tag: command.to_string(),
                line: self.line_of(token.at),
                at: command_at,
            }),
        }
    }

    fn parse_load(&mut self, args: &[(&str, Span)]) -> Result<Load, ParseError> {
        if args.len() >= 3 && args[args.len() - 2].0 == "from" {
            let (library_name, library_at) = args[args.len() - 1];
            let library = self.find_library(library_name, library_at)?;
            let requested = &args[..args.len() - 2];

            let mut bound = Vec::with_capacity(requested.len());
            for &(name, at) in requested {
                let filter = library.filter(name).ok_or_else(|| {
                    ParseError::UnknownFilterInLibrary {
                        filter: name.to_string(),
                        library: library_name.to_string(),
                        at,
                    }
                })?;
                bound.push((name, Arc::clone(filter)));
            }

            let names: Vec<String> = requested.iter().map(|(name, _)| (*name).to_string()).collect();
            tracing::debug!(library = library_name, filters = ?names, "load filters");
            for (name, filter) in bound {
                self.registry.bind(name, filter, library.name());
            }
            return Ok(Load::Filters {
                names,
                library: library_name.to_string(),
            });
        }

        let mut libraries = Vec::with_capacity(args.len());
        for &(name, at) in args {
            let library = self.find_library(name, at)?;
            self.load_library(&library);
            libraries.push(name.to_string());
        }
        tracing::debug!(libraries = ?libraries, "load libraries");
        Ok(Load::Libraries(libraries))
    }

    fn find_library(&self, name: &str, at: Span) -> Result<Arc<Library>, ParseError> {
        self.lookup.find_library(name).ok_or_else(|| {
            let mut available = self.lookup.library_names();
            available.sort();
            ParseError::UnknownLibrary {
                library: name.to_string(),
                available,
                at,
            }
        })
    }

    fn load_library(&mut self, library: &Library) {
        for (name, filter) in library.filters() {
            self.registry.bind(name, Arc::clone(filter), library.name());
        }
    }

    fn parse_filter_expression(
        &self,
        token: &str,
        offset: usize,
    ) -> Result<FilterExpression, ParseError> {
        let scanner = Scanner { token, offset };

        let Some(base_end) = scanner
            .constant_at(0)
            .or_else(|| scanner.var_at(0))
        else {
            return Err(if scanner.filter_at(0).is_some() {
                ParseError::MissingVariable {
                    token: token.to_string(),
                    at: scanner.span(0, token.len()),
                }
            } else {
                ParseError::InvalidRemainder {
                    remainder: token.to_string(),
                    token: token.to_string(),
                    at: scanner.span(0, token.len()),
                }
            });
        };
        let base = scanner.operand(0, base_end)?;

        let mut filters = Vec::new();
        let mut pos = base_end;
        while let Some(found) = scanner.filter_at(pos) {
            filters.push(self.bind_filter(&scanner, &found)?);
            pos = found.end;
        }

        if pos != token.len() {
            return Err(ParseError::InvalidRemainder {
                remainder: token[pos..].to_string(),
                token: token.to_string(),
                at: scanner.span(pos, token.len()),
            });
        }

        Ok(FilterExpression {
            base,
            filters,
            token: token.to_string(),
            at: scanner.span(0, token.len()),
        })
    }

    fn bind_filter(
        &self,
        scanner: &Scanner<'_>,
        found: &FilterMatch,
    ) -> Result<FilterInvocation, ParseError> {
        let name = &scanner.token[found.name.0..found.name.1];
        let name_at = scanner.span(found.name.0, found.name.1);
        let at = scanner.span(found.name.0, found.end);

        let bound = self
            .registry
            .get(name)
            .ok_or_else(|| ParseError::InvalidFilter {
                filter: name.to_string(),
                at: name_at,
            })?;

        let argument = found
            .argument
            .map(|(start, end)| scanner.operand(start, end))
            .transpose()?;

        let arg_count = bound.filter.arg_count();
        let provided = 1 + usize::from(argument.is_some());
        if !arg_count.accepts(provided) {
            return Err(ParseError::FilterArity {
                filter: name.to_string(),
                required: arg_count.min,
                provided,
                at,
            });
        }

        Ok(FilterInvocation {
            name: name.to_string(),
            library: bound.library.clone(),
            filter: Arc::clone(&bound.filter),
            argument,
            at,
        })
    }
}

/// A `|name:arg` match, as byte offsets into the expression.
struct FilterMatch {
    name: (usize, usize),
    argument: Option<(usize, usize)>,
    end: usize,
}

/// Matches the pieces of an expression against its source text.
struct Scanner<'t> {
    token: &'t str,
    offset: usize,
}

fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

impl Scanner<'_> {
    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.offset + start, self.offset + end)
    }

    fn peek(&self, pos: usize) -> Option<char> {
        self.token.get(pos..).and_then(|rest| rest.chars().next())
    }

    fn take_while(&self, pos: usize, pred: impl Fn(char) -> bool) -> usize {
        self.token[pos..]
            .char_indices()
            .find(|&(_, ch)| !pred(ch))
            .map_or(self.token.len(), |(i, _)| pos + i)
    }

    /// A quoted string with backslash escapes starting at `pos`.
    fn constant_at(&self, pos: usize) -> Option<usize> {
        let quote = self.peek(pos).filter(|&ch| ch == '"' || ch == '\'')?;
        let mut escaped = false;
        for (i, ch) in self.token[pos + 1..].char_indices() {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                return Some(pos + 1 + i + 1);
            }
        }
        None
    }

    /// A run of word characters and dots, or a signed number.
    fn var_at(&self, pos: usize) -> Option<usize> {
        let end = self.take_while(pos, |ch| is_word(ch) || ch == '.');
        if end > pos {
            return Some(end);
        }

        let mut digits = pos;
        if matches!(self.peek(digits), Some('-' | '+' | '.')) {
            digits += 1;
        }
        if !self.peek(digits).is_some_and(|ch| ch.is_ascii_digit()) {
            return None;
        }
        Some(self.take_while(digits + 1, |ch| ch.is_ascii_digit() || ch == '.' || ch == 'e'))
    }

    fn filter_at(&self, pos: usize) -> Option<FilterMatch> {
        let pipe = self.take_while(pos, char::is_whitespace);
        if self.peek(pipe) != Some('|') {
            return None;
        }
        let name_start = self.take_while(pipe + 1, char::is_whitespace);
        let name_end = self.take_while(name_start, is_word);
        if name_end == name_start {
            return None;
        }

        let argument = if self.peek(name_end) == Some(':') {
            let arg_start = name_end + 1;
            self.constant_at(arg_start)
                .or_else(|| self.var_at(arg_start))
                .map(|arg_end| (arg_start, arg_end))
        } else {
            None
        };

        Some(FilterMatch {
            name: (name_start, name_end),
            end: argument.map_or(name_end, |(_, end)| end),
            argument,
        })
    }

    fn operand(&self, start: usize, end: usize) -> Result<Operand, ParseError> {
        let text = &self.token[start..end];
        let at = self.span(start, end);

        if let Some(quote) = text.chars().next().filter(|&ch| ch == '"' || ch == '\'') {
            return Ok(Operand::Literal {
                value: Value::SafeText(unescape_string_literal(text, quote)),
                at,
            });
        }

        if let Some(value) = parse_number(text) {
            return Ok(Operand::Literal { value, at });
        }

        if text.starts_with('_') || text.contains("._") {
            return Err(ParseError::UnderscoreAttribute {
                var: text.to_string(),
                at,
            });
        }

        Ok(Operand::Path(VariablePath::new(text, at.start)))
    }
}

/// Strips the quotes from a string literal and undoes `\<quote>` and `\\`.
fn unescape_string_literal(text: &str, quote: char) -> String {
    let inner = &text[1..text.len() - 1];
    let escaped_quote = format!("\\{quote}");
    inner
        .replace(&escaped_quote, &quote.to_string())
        .replace("\\\\", "\\")
}

/// Reads `text` as a numeric literal the way Django does: integers have no
/// `.` or `e`, floats may not end in `.`. Anything else is a path.
///
/// Integers too wide for `i64` are kept as the nearest float.
fn parse_number(text: &str) -> Option<Value> {
    let lower = text.to_ascii_lowercase();
    if !text.contains('.') && !lower.contains('e') {
        if let Ok(int) = text.parse::<i64>() {
            return Some(Value::Integer(int));
        }
        let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        return text.parse::<f64>().ok().map(Value::Float);
    }
    if text.ends_with('.') {
        return None;
    }
    let first = text.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) {
        return None;
    }
    text.parse::<f64>().ok().map(Value::Float)
}
