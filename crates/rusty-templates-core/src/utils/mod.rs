//! Utility functions for rusty-templates.
//!
//! - [`text`]: Python-compatible `repr`/`str` formatting and HTML escaping.

pub mod text;
