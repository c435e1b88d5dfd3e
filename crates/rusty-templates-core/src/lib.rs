//! # rusty-templates-core
//!
//! Foundation types for the rusty-templates engine. This crate knows nothing
//! about template syntax; it provides the runtime value model shared by the
//! engine and by host applications.
//!
//! ## Modules
//!
//! - [`value`] - The [`Value`] tagged union and the [`HostObject`] capability
//! - [`error`] - Host error passthrough and configuration errors
//! - [`span`] - Byte-offset source spans with line/column mapping
//! - [`settings`] - Engine configuration
//! - [`settings_loader`] - Loading settings from TOML/JSON text and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Python-compatible text formatting helpers

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod span;
pub mod utils;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use error::{ConfigError, HostError};
pub use settings::{EngineSettings, UndefinedBehavior};
pub use span::Span;
pub use value::{Attribute, HostObject, Value};
