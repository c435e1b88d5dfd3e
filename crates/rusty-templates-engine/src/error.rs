//! Template error types.
//!
//! Errors are split by phase:
//!
//! - [`ParseError`] is raised while building a template. No template is
//!   produced.
//! - [`RenderError`] aborts a render call. Failed variable lookups carry the
//!   spans needed for a [`Diagnostic`]; errors raised by host code pass
//!   through untouched as [`RenderError::Host`].
//! - [`TemplateError`] groups both for callers that parse and render in one go.
//!
//! The messages match Django's template engine word for word.

use rusty_templates_core::error::HostError;
use rusty_templates_core::span::Span;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, Label};

/// An error raised while lexing or parsing a template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `{{`, `{%` or `{#` without its closing delimiter.
    #[error("Unclosed tag: expected '{close}' to close '{open}'")]
    UnclosedTag {
        /// The opening delimiter.
        open: &'static str,
        /// The delimiter that was expected.
        close: &'static str,
        /// Span of the opening delimiter.
        at: Span,
    },

    /// `{{ }}` with nothing inside.
    #[error("Empty variable tag on line {line}")]
    EmptyVariable { line: usize, at: Span },

    /// `{% %}` with nothing inside.
    #[error("Empty block tag on line {line}")]
    EmptyTag { line: usize, at: Span },

    /// A variable tag that starts with a filter instead of a value.
    #[error("Could not find variable at start of {token}.")]
    MissingVariable { token: String, at: Span },

    /// Trailing text after the last well-formed part of an expression.
    #[error("Could not parse the remainder: '{remainder}' from '{token}'")]
    InvalidRemainder {
        remainder: String,
        token: String,
        at: Span,
    },

    /// A path segment starting with `_`.
    #[error("Variables and attributes may not begin with underscores: '{var}'")]
    UnderscoreAttribute { var: String, at: Span },

    /// A block tag name nobody registered.
    #[error("Invalid block tag on line {line}: '{tag}'. Did you forget to register or load this tag?")]
    UnknownTag { tag: String, line: usize, at: Span },

    /// A `load` naming a library the lookup does not know.
    #[error("'{library}' is not a registered tag library. Must be one of:\n{}", .available.join("\n"))]
    UnknownLibrary {
        library: String,
        /// Known library names, sorted.
        available: Vec<String>,
        at: Span,
    },

    /// A `load ... from lib` naming a filter `lib` does not export.
    #[error("'{filter}' is not a valid tag or filter in tag library '{library}'")]
    UnknownFilterInLibrary {
        filter: String,
        library: String,
        at: Span,
    },

    /// A filter used without being loaded.
    #[error("Invalid filter: '{filter}'")]
    InvalidFilter { filter: String, at: Span },

    /// A filter given the wrong number of arguments. Counts include the
    /// value being filtered.
    #[error("{filter} requires {required} arguments, {provided} provided")]
    FilterArity {
        filter: String,
        required: usize,
        provided: usize,
        at: Span,
    },
}

impl ParseError {
    /// The span the error points at.
    pub const fn span(&self) -> Span {
        match self {
            Self::UnclosedTag { at, .. }
            | Self::EmptyVariable { at, .. }
            | Self::EmptyTag { at, .. }
            | Self::MissingVariable { at, .. }
            | Self::InvalidRemainder { at, .. }
            | Self::UnderscoreAttribute { at, .. }
            | Self::UnknownTag { at, .. }
            | Self::UnknownLibrary { at, .. }
            | Self::UnknownFilterInLibrary { at, .. }
            | Self::InvalidFilter { at, .. }
            | Self::FilterArity { at, .. } => *at,
        }
    }

    /// Labels for the diagnostic excerpt, primary first.
    pub fn labels(&self) -> Vec<Label> {
        let text = match self {
            Self::UnclosedTag { .. } => "unclosed tag",
            Self::EmptyVariable { .. } | Self::EmptyTag { .. } => "empty tag",
            Self::UnknownTag { .. } => "tag",
            Self::UnknownLibrary { .. } => "library",
            Self::UnknownFilterInLibrary { .. } | Self::InvalidFilter { .. } => "filter",
            Self::FilterArity { .. } => "arguments",
            Self::MissingVariable { .. }
            | Self::InvalidRemainder { .. }
            | Self::UnderscoreAttribute { .. } => "here",
        };
        vec![Label::primary(self.span(), text)]
    }

    /// Builds the diagnostic for this error against `source`.
    pub fn to_diagnostic(&self, source: &str) -> Diagnostic {
        let diagnostic = Diagnostic::new(self.to_string(), source).with_labels(self.labels());
        match self {
            Self::InvalidFilter { .. } => {
                diagnostic.with_help("load the library that provides this filter first")
            }
            _ => diagnostic,
        }
    }
}

/// An error raised while rendering a template.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A dotted path could not be resolved.
    #[error("Failed lookup for key [{key}] in {object}")]
    VariableDoesNotExist {
        /// The segment that failed.
        key: String,
        /// `repr()` of the value the segment was looked up in.
        object: String,
        /// Span of the failing segment.
        key_at: Span,
        /// Span of the path prefix that produced `object`. `None` when the
        /// first segment failed and `object` is the context itself.
        object_at: Option<Span>,
    },

    /// An error raised by a filter or attribute accessor, unchanged.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl RenderError {
    /// Returns the host error if this is a passthrough.
    pub const fn as_host(&self) -> Option<&HostError> {
        match self {
            Self::Host(err) => Some(err),
            Self::VariableDoesNotExist { .. } => None,
        }
    }

    /// Labels for the diagnostic excerpt, primary first. Host errors have none.
    pub fn labels(&self) -> Vec<Label> {
        match self {
            Self::VariableDoesNotExist {
                object,
                key_at,
                object_at,
                ..
            } => {
                let mut labels = vec![Label::primary(*key_at, "key")];
                if let Some(object_at) = object_at {
                    labels.push(Label::secondary(*object_at, object.clone()));
                }
                labels
            }
            Self::Host(_) => Vec::new(),
        }
    }

    /// Builds the diagnostic for this error, or `None` for host errors.
    pub fn to_diagnostic(&self, source: &str) -> Option<Diagnostic> {
        match self {
            Self::VariableDoesNotExist { .. } => {
                Some(Diagnostic::new(self.to_string(), source).with_labels(self.labels()))
            }
            Self::Host(_) => None,
        }
    }
}

/// Any error produced by the template engine.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template could not be built.
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// The template could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl TemplateError {
    /// Labels for the diagnostic excerpt.
    pub fn labels(&self) -> Vec<Label> {
        match self {
            Self::Syntax(err) => err.labels(),
            Self::Render(err) => err.labels(),
        }
    }

    /// Builds the diagnostic for this error, or `None` for host errors.
    pub fn to_diagnostic(&self, source: &str) -> Option<Diagnostic> {
        match self {
            Self::Syntax(err) => Some(err.to_diagnostic(source)),
            Self::Render(err) => err.to_diagnostic(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_library_message_lists_names() {
        let err = ParseError::UnknownLibrary {
            library: "nope".to_string(),
            available: vec!["custom_filters".to_string(), "more_filters".to_string()],
            at: Span::new(8, 12),
        };
        assert_eq!(
            err.to_string(),
            "'nope' is not a registered tag library. Must be one of:\ncustom_filters\nmore_filters"
        );
        assert_eq!(err.span(), Span::new(8, 12));
    }

    #[test]
    fn test_arity_message() {
        let err = ParseError::FilterArity {
            filter: "cut".to_string(),
            required: 2,
            provided: 1,
            at: Span::new(0, 3),
        };
        assert_eq!(err.to_string(), "cut requires 2 arguments, 1 provided");
    }

    #[test]
    fn test_unknown_tag_message() {
        let err = ParseError::UnknownTag {
            tag: "if".to_string(),
            line: 3,
            at: Span::new(0, 2),
        };
        assert_eq!(
            err.to_string(),
            "Invalid block tag on line 3: 'if'. Did you forget to register or load this tag?"
        );
    }

    #[test]
    fn test_lookup_labels() {
        let err = RenderError::VariableDoesNotExist {
            key: "1b".to_string(),
            object: "3".to_string(),
            key_at: Span::new(24, 26),
            object_at: Some(Span::new(16, 23)),
        };
        assert_eq!(err.to_string(), "Failed lookup for key [1b] in 3");
        let labels = err.labels();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary);
        assert_eq!(labels[0].text, "key");
        assert_eq!(labels[1].text, "3");
    }

    #[test]
    fn test_lookup_without_object_label() {
        let err = RenderError::VariableDoesNotExist {
            key: "missing".to_string(),
            object: "[{'True': True, 'False': False, 'None': None}, {}]".to_string(),
            key_at: Span::new(3, 10),
            object_at: None,
        };
        assert_eq!(err.labels().len(), 1);
    }

    #[test]
    fn test_host_error_is_transparent() {
        let err = RenderError::from(HostError::msg("division by zero"));
        assert_eq!(err.to_string(), "division by zero");
        assert!(err.as_host().is_some());
        assert!(err.labels().is_empty());
        assert!(err.to_diagnostic("{{ x }}").is_none());
    }

    #[test]
    fn test_template_error_groups_phases() {
        let err = TemplateError::from(ParseError::InvalidFilter {
            filter: "nope".to_string(),
            at: Span::new(5, 9),
        });
        assert_eq!(err.to_string(), "Invalid filter: 'nope'");
        let diagnostic = err.to_diagnostic("{{ x|nope }}").unwrap();
        assert_eq!(diagnostic.highlighted(), vec!["nope"]);
        assert!(diagnostic.help().is_some());
    }
}
