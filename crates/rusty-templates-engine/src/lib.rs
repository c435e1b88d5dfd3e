//! # rusty-templates-engine
//!
//! A Django Template Language compatible template engine. Templates are
//! parsed once into nodes and rendered against a [`Context`] of values.
//!
//! Filters live in named [`Library`]s and become available to a template
//! through `{% load %}`:
//!
//! ```
//! use rusty_templates_core::settings::EngineSettings;
//! use rusty_templates_core::value::Value;
//! use rusty_templates_engine::{Context, Engine, FnFilter, Libraries, Library};
//!
//! let libraries = Libraries::new().with(
//!     Library::new("custom_filters").with_filter(
//!         "cut",
//!         FnFilter::binary(|value, arg| {
//!             let cut = arg.to_display_string();
//!             Ok(Value::from(value.to_display_string().replace(&cut, "")))
//!         }),
//!     ),
//! );
//!
//! let engine = Engine::new(EngineSettings::default(), libraries);
//! let template = engine
//!     .from_string("{% load cut from custom_filters %}{{ text|cut:'ello' }}")
//!     .unwrap();
//!
//! let mut ctx = Context::new();
//! ctx.set("text", "Hello World!");
//! assert_eq!(template.render(&ctx).unwrap(), "H World!");
//! ```
//!
//! Failures carry spans into the source. [`Diagnostic`] turns them into an
//! annotated excerpt:
//!
//! ```
//! use rusty_templates_engine::{parse, Context, Libraries};
//!
//! let template = parse("{{ user.nmae }}", &Libraries::new()).unwrap();
//! let ctx: Context = vec![("user", "ada")].into_iter().collect();
//! let err = template.render(&ctx).unwrap_err();
//! assert_eq!(err.to_string(), "Failed lookup for key [nmae] in 'ada'");
//! assert!(template.report(&err).unwrap().contains("╭─[1:4]"));
//! ```

pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod filters;
pub mod lexer;
pub mod library;
pub mod parser;
pub mod render;
pub mod variable;

pub use context::Context;
pub use diagnostics::{Diagnostic, DiagnosticFormatter, Label};
pub use engine::{parse, render, Engine, Template};
pub use error::{ParseError, RenderError, TemplateError};
pub use filters::{ArgCount, Filter, FilterRegistry, FnFilter};
pub use library::{Libraries, Library, LibraryLookup};
