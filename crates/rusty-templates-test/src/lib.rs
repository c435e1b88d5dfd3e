//! # rusty-templates-test
//!
//! Testing support for rusty-templates. Provides the filter libraries the
//! integration tests load (`custom_filters`, `more_filters`,
//! `shadow_filters`), a sample host object, and helpers for rendering a
//! template against a JSON context.
//!
//! ## Example
//!
//! ```
//! use rusty_templates_test::harness::render_str;
//!
//! let output = render_str(
//!     "{% load custom_filters %}{{ text|cut:'ello' }}",
//!     serde_json::json!({"text": "Hello World!"}),
//! )
//! .unwrap();
//! assert_eq!(output, "H World!");
//! ```

pub mod harness;
pub mod libraries;
pub mod objects;

pub use harness::{context, engine, engine_from_toml, engine_with, render_report, render_str};
pub use libraries::{libraries, TypeError, ZeroDivisionError};
pub use objects::Article;
