//! Template lexer (tokenizer).
//!
//! Converts raw template source text into a stream of [`Token`]s representing
//! text literals, variable references (`{{ }}`), block tags (`{% %}`), and
//! comments (`{# #}`). Every token borrows from the source and carries the
//! byte spans of both the whole token and its trimmed contents.

use rusty_templates_core::span::Span;

use crate::error::ParseError;

/// The kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A literal text segment.
    Text,
    /// A variable expression: `{{ expression }}`.
    Variable,
    /// A block tag: `{% tag arg1 arg2 %}`.
    Block,
    /// A comment: `{# comment text #}`.
    Comment,
}

/// A token produced by the template lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The literal text for [`TokenKind::Text`]; the trimmed contents between
    /// the delimiters otherwise.
    pub content: &'src str,
    /// Span of the whole token, delimiters included.
    pub at: Span,
    /// Span of [`Token::content`].
    pub content_at: Span,
}

/// Tokenizes a template source string into a sequence of [`Token`]s.
///
/// # Errors
///
/// Returns [`ParseError::UnclosedTag`] pointing at the opening delimiter if
/// a tag, variable, or comment is opened but never closed.
///
/// A tag must open and close on the same line. An opening delimiter whose
/// close only appears on a later line is kept as literal text.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut search = 0;

    while search < source.len() {
        let Some((offset, kind)) = find_next_open(&source[search..]) else {
            break;
        };

        let open = search + offset;
        let (open_delim, close_delim) = delimiters(kind);
        let inner_start = open + 2;
        let Some(close) = source[inner_start..].find(close_delim) else {
            return Err(ParseError::UnclosedTag {
                open: open_delim,
                close: close_delim,
                at: Span::with_len(open, 2),
            });
        };
        let inner_end = inner_start + close;
        let inner = &source[inner_start..inner_end];

        // Tags never span lines; the delimiter stays part of the text.
        if inner.contains('\n') {
            search = open + 1;
            continue;
        }

        if open > text_start {
            tokens.push(text_token(source, text_start, open));
        }
        let content = inner.trim();
        let content_start = inner_start + (inner.len() - inner.trim_start().len());

        tokens.push(Token {
            kind,
            content,
            at: Span::new(open, inner_end + 2),
            content_at: Span::with_len(content_start, content.len()),
        });
        text_start = inner_end + 2;
        search = text_start;
    }

    if text_start < source.len() {
        tokens.push(text_token(source, text_start, source.len()));
    }
    Ok(tokens)
}

fn text_token(source: &str, start: usize, end: usize) -> Token<'_> {
    let span = Span::new(start, end);
    Token {
        kind: TokenKind::Text,
        content: &source[start..end],
        at: span,
        content_at: span,
    }
}

const fn delimiters(kind: TokenKind) -> (&'static str, &'static str) {
    match kind {
        TokenKind::Variable => ("{{", "}}"),
        TokenKind::Block => ("{%", "%}"),
        TokenKind::Comment => ("{#", "#}"),
        TokenKind::Text => ("", ""),
    }
}

/// Finds the next template tag opening in the source.
fn find_next_open(s: &str) -> Option<(usize, TokenKind)> {
    let mut best: Option<(usize, TokenKind)> = None;

    for (tag_str, kind) in [
        ("{{", TokenKind::Variable),
        ("{%", TokenKind::Block),
        ("{#", TokenKind::Comment),
    ] {
        if let Some(pos) = s.find(tag_str) {
            match best {
                None => best = Some((pos, kind)),
                Some((best_pos, _)) if pos < best_pos => best = Some((pos, kind)),
                _ => {}
            }
        }
    }

    best
}

/// Splits block tag contents into whitespace-separated bits, keeping quoted
/// strings (with backslash escapes) together.
///
/// `offset` is the byte position of `content` in the template source; the
/// returned spans are absolute.
pub fn split_tag_bits(content: &str, offset: usize) -> Vec<(&str, Span)> {
    let mut bits = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in content.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                bits.push((&content[s..i], Span::new(offset + s, offset + i)));
            }
            continue;
        }

        if start.is_none() {
            start = Some(i);
        }
        if ch == '\'' || ch == '"' {
            quote = Some(ch);
        }
    }

    if let Some(s) = start {
        bits.push((&content[s..], Span::new(offset + s, offset + content.len())));
    }

    bits
}
