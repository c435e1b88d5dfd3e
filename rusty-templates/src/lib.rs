//! # rusty-templates
//!
//! A Django template language compatible template engine.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `rusty-templates` for everything, or on the individual
//! crates for finer-grained control.
//!
//! ```
//! use rusty_templates::prelude::*;
//!
//! let engine = Engine::new(EngineSettings::default(), Libraries::new());
//! let mut ctx = Context::new();
//! ctx.set("name", "World");
//! assert_eq!(engine.render_string("Hello {{ name }}!", &ctx).unwrap(), "Hello World!");
//! ```

/// Values, settings, spans, logging, and host error types.
pub use rusty_templates_core as core;

/// Lexer, parser, filter libraries, renderer, and diagnostics.
#[cfg(feature = "engine")]
pub use rusty_templates_engine as engine;

/// Fixture libraries and render helpers for tests.
#[cfg(feature = "testing")]
pub use rusty_templates_test as test;

pub use serde_json;
pub use tracing;

/// The types most programs need.
#[cfg(feature = "engine")]
pub mod prelude {
    pub use rusty_templates_core::error::HostError;
    pub use rusty_templates_core::settings::{EngineSettings, UndefinedBehavior};
    pub use rusty_templates_core::value::{Attribute, HostObject, Value};
    pub use rusty_templates_engine::{
        Context, Diagnostic, DiagnosticFormatter, Engine, FnFilter, Libraries, Library,
        LibraryLookup, ParseError, RenderError, Template, TemplateError,
    };
}
