//! Render helpers for tests.
//!
//! These build an [`Engine`] over the fixture [`libraries`] and render a
//! template against a context given as JSON. They panic on misuse, as test
//! helpers do.

use rusty_templates_core::settings::EngineSettings;
use rusty_templates_engine::context::Context;
use rusty_templates_engine::engine::Engine;
use rusty_templates_engine::error::TemplateError;

use crate::libraries::libraries;

/// Builds a context from a JSON object.
///
/// # Panics
///
/// Panics if `json` is not an object.
pub fn context(json: serde_json::Value) -> Context {
    match json {
        serde_json::Value::Object(map) => Context::from(map),
        other => panic!("context must be a JSON object, got {other}"),
    }
}

/// An engine with default settings over the fixture libraries.
pub fn engine() -> Engine {
    engine_with(EngineSettings::default())
}

/// An engine with `settings` over the fixture libraries.
pub fn engine_with(settings: EngineSettings) -> Engine {
    Engine::new(settings, libraries())
}

/// An engine configured from TOML settings text over the fixture libraries.
///
/// # Panics
///
/// Panics if the settings text is malformed.
pub fn engine_from_toml(toml_str: &str) -> Engine {
    match Engine::from_toml_str(toml_str, libraries()) {
        Ok(engine) => engine,
        Err(err) => panic!("invalid engine settings: {err}"),
    }
}

/// Parses and renders `source` with default settings.
///
/// # Errors
///
/// Returns the syntax or render error.
pub fn render_str(source: &str, json: serde_json::Value) -> Result<String, TemplateError> {
    engine().render_string(source, &context(json))
}

/// Renders `source`, expecting it to fail, and returns the formatted
/// diagnostic for the failure.
///
/// # Panics
///
/// Panics if rendering succeeds or the error has no source location.
pub fn render_report(source: &str, json: serde_json::Value) -> String {
    let engine = engine();
    let formatter = engine.formatter();
    let error = match engine.render_string(source, &context(json)) {
        Ok(output) => panic!("expected {source:?} to fail, rendered {output:?}"),
        Err(error) => error,
    };
    match error.to_diagnostic(source) {
        Some(diagnostic) => formatter.render(&diagnostic),
        None => panic!("error has no location: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_json() {
        let ctx = context(serde_json::json!({"a": 1}));
        assert!(ctx.contains("a"));
    }

    #[test]
    #[should_panic(expected = "context must be a JSON object")]
    fn test_context_rejects_non_object() {
        let _ = context(serde_json::json!([1, 2]));
    }

    #[test]
    fn test_render_report_for_parse_error() {
        let report = render_report("{{ x|nope }}", serde_json::json!({}));
        assert!(report.starts_with("  × Invalid filter: 'nope'\n"));
    }
}
