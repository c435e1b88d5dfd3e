//! Template engine: parsing and rendering templates.
//!
//! The [`Engine`] struct is the central entry point for the template system.
//! It owns the settings and the library lookup, and turns source strings
//! into [`Template`]s that can be rendered any number of times.

use std::fmt;
use std::sync::Arc;

use rusty_templates_core::error::ConfigError;
use rusty_templates_core::logging::{init_logging, render_span};
use rusty_templates_core::settings::EngineSettings;
use rusty_templates_core::settings_loader;

use crate::context::Context;
use crate::diagnostics::{Diagnostic, DiagnosticFormatter};
use crate::error::{ParseError, RenderError, TemplateError};
use crate::filters::FilterRegistry;
use crate::library::LibraryLookup;
use crate::parser::{Node, Parser};
use crate::render::render_nodes;

/// Name given to templates built from a string.
pub const STRING_TEMPLATE_NAME: &str = "<string>";

/// The template engine.
///
/// # Examples
///
/// ```
/// use rusty_templates_core::settings::EngineSettings;
/// use rusty_templates_engine::context::Context;
/// use rusty_templates_engine::engine::Engine;
/// use rusty_templates_engine::library::Libraries;
///
/// let engine = Engine::new(EngineSettings::default(), Libraries::new());
/// let template = engine.from_string("Hello {{ name }}!").unwrap();
///
/// let mut ctx = Context::new();
/// ctx.set("name", "World");
/// assert_eq!(template.render(&ctx).unwrap(), "Hello World!");
/// ```
#[derive(Clone)]
pub struct Engine {
    settings: Arc<EngineSettings>,
    lookup: Arc<dyn LibraryLookup>,
}

impl Engine {
    /// Creates an engine that resolves `{% load %}` through `lookup`.
    pub fn new(settings: EngineSettings, lookup: impl LibraryLookup + 'static) -> Self {
        Self {
            settings: Arc::new(settings),
            lookup: Arc::new(lookup),
        }
    }

    /// Creates an engine from TOML settings text, the way a host sets one
    /// up at startup.
    ///
    /// `RUSTY_TEMPLATES_*` environment variables override the document, and
    /// the global tracing subscriber is installed from the resulting
    /// settings unless the host already installed one.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the settings text is malformed.
    pub fn from_toml_str(
        toml_str: &str,
        lookup: impl LibraryLookup + 'static,
    ) -> Result<Self, ConfigError> {
        let settings = settings_loader::from_toml_str_with_env(toml_str)?;
        if init_logging(&settings) {
            tracing::debug!(log_level = %settings.log_level, "logging installed");
        }
        Ok(Self::new(settings, lookup))
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Parses `source` into a template, with the configured builtin
    /// libraries already in scope.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error in the source.
    pub fn from_string(&self, source: &str) -> Result<Template, ParseError> {
        let mut parser = Parser::new(source, self.lookup.as_ref());
        parser.load_builtins(&self.settings.builtins)?;
        let (nodes, registry) = parser.parse().inspect_err(|err| {
            tracing::debug!(error = %err, "template failed to parse");
        })?;
        tracing::trace!(nodes = nodes.len(), filters = registry.len(), "template parsed");

        Ok(Template {
            name: STRING_TEMPLATE_NAME.to_string(),
            source: Arc::from(source),
            nodes,
            registry,
            settings: Arc::clone(&self.settings),
        })
    }

    /// Parses and renders `source` in one step.
    ///
    /// # Errors
    ///
    /// Returns either the syntax error or the render error.
    pub fn render_string(&self, source: &str, context: &Context) -> Result<String, TemplateError> {
        let template = self.from_string(source)?;
        Ok(template.render(context)?)
    }

    /// A formatter configured with this engine's diagnostic width.
    pub fn formatter(&self) -> DiagnosticFormatter {
        DiagnosticFormatter::new().with_width(self.settings.diagnostic_width)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// A parsed template.
///
/// Templates are immutable once parsed and may be rendered concurrently
/// from several threads.
pub struct Template {
    name: String,
    source: Arc<str>,
    nodes: Vec<Node>,
    registry: FilterRegistry,
    settings: Arc<EngineSettings>,
}

impl Template {
    /// Renders the template against `context`.
    ///
    /// # Errors
    ///
    /// Returns the first failure; no partial output is produced.
    pub fn render(&self, context: &Context) -> Result<String, RenderError> {
        let span = render_span(&self.name);
        let _guard = span.enter();
        render_nodes(&self.nodes, context, &self.settings).inspect_err(|err| {
            tracing::debug!(error = %err, "render failed");
        })
    }

    /// Builds a diagnostic for a render error raised by this template.
    ///
    /// Host errors carry no template location and yield `None`.
    pub fn diagnostic(&self, error: &RenderError) -> Option<Diagnostic> {
        error.to_diagnostic(&self.source)
    }

    /// Renders the diagnostic for `error` as text, if it has one.
    pub fn report(&self, error: &RenderError) -> Option<String> {
        let formatter = DiagnosticFormatter::new().with_width(self.settings.diagnostic_width);
        self.diagnostic(error).map(|diagnostic| formatter.render(&diagnostic))
    }

    /// The template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The template source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The filters in scope at the end of the template.
    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// The settings the template renders with.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("filters", &self.registry.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Parses `source` with default settings.
///
/// # Errors
///
/// Returns the first syntax error in the source.
pub fn parse(source: &str, lookup: &dyn LibraryLookup) -> Result<Template, ParseError> {
    let (nodes, registry) = Parser::new(source, lookup).parse()?;
    Ok(Template {
        name: STRING_TEMPLATE_NAME.to_string(),
        source: Arc::from(source),
        nodes,
        registry,
        settings: Arc::new(EngineSettings::default()),
    })
}

/// Renders a parsed template. Same as [`Template::render`].
///
/// # Errors
///
/// Returns the first failure; no partial output is produced.
pub fn render(template: &Template, context: &Context) -> Result<String, RenderError> {
    template.render(context)
}
