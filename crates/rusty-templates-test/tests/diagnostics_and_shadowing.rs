//! Filter shadowing, host objects, undefined-variable modes, escaping, and
//! syntax error reporting.

use rusty_templates_core::settings::{EngineSettings, UndefinedBehavior};
use rusty_templates_engine::error::{ParseError, RenderError, TemplateError};
use rusty_templates_test::{context, engine, engine_with, render_report, render_str, Article};
use serde_json::json;

// ============================================================================
// Shadowing
// ============================================================================

#[test]
fn test_later_library_wins() {
    let output = render_str(
        "{% load custom_filters shadow_filters %}{{ 2|double }}",
        json!({}),
    )
    .unwrap();
    assert_eq!(output, "6");

    let output = render_str(
        "{% load shadow_filters custom_filters %}{{ 2|double }}",
        json!({}),
    )
    .unwrap();
    assert_eq!(output, "4");
}

#[test]
fn test_later_load_tag_wins() {
    let output = render_str(
        "{% load double from shadow_filters %}{% load custom_filters %}{{ 2|double }}",
        json!({}),
    )
    .unwrap();
    assert_eq!(output, "4");
}

#[test]
fn test_filter_bound_before_use_only() {
    let err = render_str("{{ 2|double }}{% load custom_filters %}", json!({})).unwrap_err();
    assert!(matches!(
        err,
        TemplateError::Syntax(ParseError::InvalidFilter { .. })
    ));
}

#[test]
fn test_template_registry_records_library() {
    let template = engine()
        .from_string("{% load custom_filters %}{% load double from shadow_filters %}")
        .unwrap();
    assert_eq!(template.registry().get("double").unwrap().library, "shadow_filters");
    assert_eq!(template.registry().get("cut").unwrap().library, "custom_filters");
}

// ============================================================================
// Host objects
// ============================================================================

#[test]
fn test_host_object_attributes() {
    let article = Article::new("Hello", &["rust", "templates"]);
    let template = engine()
        .from_string("{{ article }}: {{ article.summary }} [{{ article.tags.1 }}]")
        .unwrap();
    let mut ctx = context(json!({}));
    ctx.set("article", article.clone().into_value());

    assert_eq!(template.render(&ctx).unwrap(), "Hello: About Hello [templates]");
    assert_eq!(article.summary_calls(), 1);
}

#[test]
fn test_host_accessor_error_passes_through() {
    let template = engine().from_string("{{ article.author }}").unwrap();
    let mut ctx = context(json!({}));
    ctx.set("article", Article::new("Hello", &[]).into_value());

    let err = template.render(&ctx).unwrap_err();
    assert!(matches!(err, RenderError::Host(_)));
    assert_eq!(err.to_string(), "author is not loaded");
    assert!(template.report(&err).is_none());
}

#[test]
fn test_host_object_missing_attribute() {
    let source = "{{ article.missing }}";
    let template = engine().from_string(source).unwrap();
    let mut ctx = context(json!({}));
    ctx.set("article", Article::new("Hello", &[]).into_value());

    let err = template.render(&ctx).unwrap_err();
    assert_eq!(err.to_string(), "Failed lookup for key [missing] in <Article: Hello>");
    let diagnostic = template.diagnostic(&err).unwrap();
    assert_eq!(diagnostic.highlighted(), vec!["missing", "article"]);
}

// ============================================================================
// Undefined variables
// ============================================================================

#[test]
fn test_strict_missing_variable_reports_context() {
    let err = render_str("{{ missing }}", json!({"num": 2})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed lookup for key [missing] in [{'True': True, 'False': False, 'None': None}, {'num': 2}]"
    );
}

#[test]
fn test_lenient_empty_replacement() {
    let engine = engine_with(EngineSettings::default().with_undefined(UndefinedBehavior::Lenient));
    let output = engine
        .render_string("{% load custom_filters %}[{{ missing|cut:'x' }}]", &context(json!({})))
        .unwrap();
    assert_eq!(output, "[]");
}

#[test]
fn test_lenient_replacement_text() {
    let settings = EngineSettings::default()
        .with_undefined(UndefinedBehavior::Lenient)
        .with_string_if_invalid("INVALID(%s)");
    let output = engine_with(settings)
        .render_string("{{ foo.bar.baz }}", &context(json!({"foo": {"bar": 1}})))
        .unwrap();
    assert_eq!(output, "INVALID(foo.bar.baz)");
}

#[test]
fn test_lenient_does_not_hide_argument_failures() {
    let engine = engine_with(EngineSettings::default().with_undefined(UndefinedBehavior::Lenient));
    let err = engine
        .render_string(
            "{% load custom_filters %}{{ num|multiply:missing }}",
            &context(json!({"num": 2})),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::Render(RenderError::VariableDoesNotExist { .. })
    ));
}

// ============================================================================
// Escaping
// ============================================================================

#[test]
fn test_autoescape_context_values() {
    let output = render_str("{{ html }}", json!({"html": "<a href=\"x\">&</a>"})).unwrap();
    assert_eq!(output, "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
}

#[test]
fn test_safe_filter_keeps_literal_safe() {
    let output = render_str(
        "{% load custom_filters %}{{ '<B>'|lower }} {{ html|lower }}",
        json!({"html": "<B>"}),
    )
    .unwrap();
    assert_eq!(output, "<b> &lt;b&gt;");
}

#[test]
fn test_autoescape_off() {
    let engine = engine_with(EngineSettings::default().with_autoescape(false));
    let output = engine
        .render_string("{{ html }}", &context(json!({"html": "<i>"})))
        .unwrap();
    assert_eq!(output, "<i>");
}

// ============================================================================
// Syntax errors
// ============================================================================

#[test]
fn test_tags_spanning_lines_render_as_text() {
    let output = render_str("{% load\ncustom_filters %}{{ num }}", json!({"num": 2})).unwrap();
    assert_eq!(output, "{% load\ncustom_filters %}2");

    let err = render_str("{% load\ncustom_filters %}{{ num|double }}", json!({"num": 2})).unwrap_err();
    assert_eq!(err.to_string(), "Invalid filter: 'double'");
}

#[test]
fn test_wide_integer_literal_is_not_a_lookup() {
    let output = render_str("{{ 99999999999999999999 }}", json!({})).unwrap();
    assert_eq!(output, "1e+20");
}

#[test]
fn test_unknown_library() {
    let err = render_str("{% load nope %}", json!({})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "'nope' is not a registered tag library. Must be one of:\ncustom_filters\nmore_filters\nshadow_filters"
    );
}

#[test]
fn test_unknown_filter_in_library() {
    let err = render_str("{% load square from custom_filters %}", json!({})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "'square' is not a valid tag or filter in tag library 'custom_filters'"
    );
}

#[test]
fn test_filter_arity() {
    let err = render_str("{% load custom_filters %}{{ text|cut }}", json!({})).unwrap_err();
    assert_eq!(err.to_string(), "cut requires 2 arguments, 1 provided");

    let err = render_str("{% load custom_filters %}{{ num|double:2 }}", json!({})).unwrap_err();
    assert_eq!(err.to_string(), "double requires 1 arguments, 2 provided");
}

#[test]
fn test_unknown_tag() {
    let err = render_str("line\n{% frobnicate %}", json!({})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid block tag on line 2: 'frobnicate'. Did you forget to register or load this tag?"
    );
}

#[test]
fn test_underscore_attribute() {
    let err = render_str("{{ user._secret }}", json!({})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Variables and attributes may not begin with underscores: 'user._secret'"
    );
}

#[test]
fn test_invalid_filter_report() {
    let report = render_report("{{ text|cut:'x' }}", json!({}));
    assert!(report.starts_with("  × Invalid filter: 'cut'\n"));
    assert_eq!(report.lines().nth(1), Some("   ╭─[1:9]"));
    assert!(report.contains("load the library that provides this filter first"));
}

#[test]
fn test_single_line_lookup_report() {
    let template = "é {{ foo.bar.zz }}";
    let expected = "  × Failed lookup for key [zz] in {}
   ╭─[1:6]
 1 │ é {{ foo.bar.zz }}
";
    let report = render_report(template, json!({"foo": {"bar": {}}}));
    assert!(report.starts_with(expected), "{report}");
    assert!(report.ends_with("   ╰────\n"));
}
