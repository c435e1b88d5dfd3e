//! Engine configuration.
//!
//! [`EngineSettings`] holds the options an engine is built with. The names
//! and defaults follow the options of Django's template backend
//! (`autoescape`, `string_if_invalid`, `builtins`, `debug`) plus the logging
//! and diagnostics knobs this implementation adds.

use serde::{Deserialize, Serialize};

/// What happens when the base of a `{{ variable }}` cannot be resolved.
///
/// Filter arguments are always resolved strictly; this only governs the
/// value being piped into the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedBehavior {
    /// Abort rendering with a `VariableDoesNotExist` error.
    #[default]
    Strict,
    /// Substitute [`EngineSettings::string_if_invalid`], as Django does.
    Lenient,
}

/// Template engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Whether rendered values are HTML-escaped unless marked safe.
    pub autoescape: bool,
    /// Behaviour on a failed lookup of a variable node's base value.
    pub undefined: UndefinedBehavior,
    /// Replacement text used by [`UndefinedBehavior::Lenient`]. A `%s` is
    /// replaced with the variable's source text.
    pub string_if_invalid: String,
    /// Libraries loaded into every template before parsing starts.
    pub builtins: Vec<String>,
    /// Enables pretty, human-readable logging.
    pub debug: bool,
    /// The tracing env-filter directive (e.g. "debug", "`rusty_templates_engine=trace`").
    pub log_level: String,
    /// Column width diagnostics are wrapped at.
    pub diagnostic_width: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            autoescape: true,
            undefined: UndefinedBehavior::Strict,
            string_if_invalid: String::new(),
            builtins: Vec::new(),
            debug: false,
            log_level: "info".to_string(),
            diagnostic_width: 200,
        }
    }
}

impl EngineSettings {
    /// Sets whether auto-escaping is enabled.
    #[must_use]
    pub fn with_autoescape(mut self, enabled: bool) -> Self {
        self.autoescape = enabled;
        self
    }

    /// Sets the undefined-variable behaviour.
    #[must_use]
    pub fn with_undefined(mut self, undefined: UndefinedBehavior) -> Self {
        self.undefined = undefined;
        self
    }

    /// Sets the lenient replacement text.
    #[must_use]
    pub fn with_string_if_invalid(mut self, text: impl Into<String>) -> Self {
        self.string_if_invalid = text.into();
        self
    }

    /// Adds a library to the set loaded into every template.
    #[must_use]
    pub fn with_builtin(mut self, library: impl Into<String>) -> Self {
        self.builtins.push(library.into());
        self
    }

    /// Renders the lenient replacement for a variable, substituting `%s`.
    pub fn invalid_replacement(&self, variable: &str) -> String {
        if self.string_if_invalid.contains("%s") {
            self.string_if_invalid.replace("%s", variable)
        } else {
            self.string_if_invalid.clone()
        }
    }
}
