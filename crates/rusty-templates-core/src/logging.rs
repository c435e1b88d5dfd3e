//! Logging integration for rusty-templates.
//!
//! Installs the [`tracing`] subscriber an engine logs through, configured
//! from [`EngineSettings`], and creates the per-render span.

use tracing_subscriber::EnvFilter;

use crate::settings::EngineSettings;

/// Targets the engine emits events under.
const ENGINE_TARGETS: [&str; 2] = ["rusty_templates_engine", "rusty_templates_core"];

/// Builds the event filter for a `log_level` setting.
///
/// A bare level such as `"debug"` applies to the engine's own targets only;
/// everything else stays at `warn` so a host's dependencies do not flood the
/// output. Anything that is not a bare level is taken as a full env-filter
/// directive. An unparsable directive falls back to `info` for the engine.
pub fn engine_filter(log_level: &str) -> EnvFilter {
    let directive = match log_level.trim().parse::<tracing::Level>() {
        Ok(level) => scoped_directive(&level.to_string().to_lowercase()),
        Err(_) => log_level.to_string(),
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(scoped_directive("info")))
}

fn scoped_directive(level: &str) -> String {
    ENGINE_TARGETS
        .iter()
        .fold(String::from("warn"), |directive, target| format!("{directive},{target}={level}"))
}

/// Installs the global tracing subscriber for an engine configured with
/// `settings`. Events go to stderr so they never mix with rendered output.
///
/// Debug mode logs in a compact human-readable form with source locations;
/// otherwise each event is one JSON object that includes the enclosing
/// render span, so entries name the template being rendered.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(settings: &EngineSettings) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(engine_filter(&settings.log_level))
        .with_writer(std::io::stderr);

    let installed = if settings.debug {
        builder
            .compact()
            .with_file(true)
            .with_line_number(true)
            .try_init()
    } else {
        builder.json().with_current_span(true).with_span_list(false).try_init()
    };
    installed.is_ok()
}

/// Creates a tracing span for one template render.
///
/// Everything the engine logs while rendering happens inside this span, so
/// log entries carry the template's name.
///
/// # Examples
///
/// ```
/// use rusty_templates_core::logging::render_span;
///
/// let span = render_span("<string>");
/// let _guard = span.enter();
/// tracing::debug!("rendering");
/// ```
pub fn render_span(template_name: &str) -> tracing::Span {
    tracing::debug_span!("render", template = template_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_installs_once() {
        let settings = EngineSettings::default();
        init_logging(&settings);
        assert!(!init_logging(&settings));
    }

    #[test]
    fn test_bare_level_is_scoped_to_engine() {
        assert_eq!(
            scoped_directive("debug"),
            "warn,rusty_templates_engine=debug,rusty_templates_core=debug"
        );
        let filter = engine_filter("DEBUG").to_string();
        assert!(filter.contains("rusty_templates_engine=debug"));
        assert!(filter.contains("warn"));
    }

    #[test]
    fn test_full_directive_is_kept() {
        let filter = engine_filter("rusty_templates_engine=trace").to_string();
        assert!(filter.contains("rusty_templates_engine=trace"));
        assert!(!filter.contains("warn"));
    }

    #[test]
    fn test_bad_directive_falls_back() {
        let filter = engine_filter("not a [valid filter").to_string();
        assert!(filter.contains("rusty_templates_engine=info"));
    }

    #[test]
    fn test_render_span_enters() {
        let span = render_span("page.html");
        let _guard = span.enter();
        tracing::debug!("inside");
    }
}
