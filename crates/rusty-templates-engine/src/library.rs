//! Filter libraries.
//!
//! This module provides the public API for grouping template filters into
//! libraries that templates import with `{% load %}`.
//!
//! ## Overview
//!
//! - [`Library`]: A named collection of filters.
//! - [`LibraryLookup`]: Resolves a library name during parsing. The host
//!   supplies it when building an engine; there is no global registry.
//! - [`Libraries`]: A map-backed [`LibraryLookup`].
//!
//! ## Examples
//!
//! ```
//! use rusty_templates_core::value::Value;
//! use rusty_templates_engine::filters::FnFilter;
//! use rusty_templates_engine::library::{Libraries, Library, LibraryLookup};
//!
//! let mut lib = Library::new("mylib");
//! lib.register_filter("shout", FnFilter::unary(|value| {
//!     Ok(Value::from(value.to_display_string().to_uppercase()))
//! }));
//!
//! let mut libraries = Libraries::new();
//! libraries.register(lib);
//!
//! let lib = libraries.find_library("mylib").unwrap();
//! let shout = lib.filter("shout").unwrap();
//! assert_eq!(shout.apply(&Value::from("hi"), None).unwrap(), Value::from("HI"));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::filters::Filter;

/// A named collection of filters.
#[derive(Clone)]
pub struct Library {
    name: String,
    filters: IndexMap<String, Arc<dyn Filter>>,
}

impl Library {
    /// Creates a new empty library with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: IndexMap::new(),
        }
    }

    /// Returns the library name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a filter, replacing any filter of the same name.
    pub fn register_filter(&mut self, name: impl Into<String>, filter: impl Filter + 'static) {
        self.filters.insert(name.into(), Arc::new(filter));
    }

    /// Builder form of [`Library::register_filter`].
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, filter: impl Filter + 'static) -> Self {
        self.register_filter(name, filter);
        self
    }

    /// Looks up an exported filter.
    pub fn filter(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(name)
    }

    /// Iterates over exported filters in registration order.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &Arc<dyn Filter>)> {
        self.filters.iter().map(|(name, filter)| (name.as_str(), filter))
    }

    /// Returns all filter names in this library.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.keys().map(String::as_str).collect()
    }

    /// Number of exported filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the library exports nothing.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("filters", &self.filter_names())
            .finish()
    }
}

/// Resolves library names for `{% load %}`.
pub trait LibraryLookup: Send + Sync {
    /// Returns the library called `name`, if there is one.
    fn find_library(&self, name: &str) -> Option<Arc<Library>>;

    /// Names of every library this lookup can find. Used in the error for
    /// an unknown library.
    fn library_names(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<F> LibraryLookup for F
where
    F: Fn(&str) -> Option<Arc<Library>> + Send + Sync,
{
    fn find_library(&self, name: &str) -> Option<Arc<Library>> {
        self(name)
    }
}

/// A set of libraries keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Libraries {
    libraries: IndexMap<String, Arc<Library>>,
}

impl Libraries {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a library, replacing any library of the same name.
    pub fn register(&mut self, library: Library) {
        self.libraries
            .insert(library.name().to_string(), Arc::new(library));
    }

    /// Builder form of [`Libraries::register`].
    #[must_use]
    pub fn with(mut self, library: Library) -> Self {
        self.register(library);
        self
    }

    /// Looks up a library by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Library>> {
        self.libraries.get(name)
    }

    /// Number of libraries.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Returns `true` if there are no libraries.
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

impl LibraryLookup for Libraries {
    fn find_library(&self, name: &str) -> Option<Arc<Library>> {
        self.libraries.get(name).cloned()
    }

    fn library_names(&self) -> Vec<String> {
        self.libraries.keys().cloned().collect()
    }
}

impl FromIterator<Library> for Libraries {
    fn from_iter<I: IntoIterator<Item = Library>>(iter: I) -> Self {
        let mut libraries = Self::new();
        for library in iter {
            libraries.register(library);
        }
        libraries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{ArgCount, FnFilter};
    use rusty_templates_core::value::Value;

    fn upper() -> FnFilter {
        FnFilter::unary(|v| Ok(Value::from(v.to_display_string().to_uppercase())))
    }

    #[test]
    fn test_library_new() {
        let lib = Library::new("test_lib");
        assert_eq!(lib.name(), "test_lib");
        assert!(lib.is_empty());
    }

    #[test]
    fn test_register_and_find_filter() {
        let lib = Library::new("test_lib").with_filter("upper", upper());
        assert_eq!(lib.len(), 1);
        let filter = lib.filter("upper").unwrap();
        assert_eq!(filter.arg_count(), ArgCount::UNARY);
        assert!(lib.filter("lower").is_none());
    }

    #[test]
    fn test_filter_names_in_order() {
        let lib = Library::new("lib")
            .with_filter("b", upper())
            .with_filter("a", upper());
        assert_eq!(lib.filter_names(), vec!["b", "a"]);
        assert_eq!(lib.filters().count(), 2);
    }

    #[test]
    fn test_libraries_lookup() {
        let libraries: Libraries = vec![Library::new("one"), Library::new("two")]
            .into_iter()
            .collect();
        assert_eq!(libraries.len(), 2);
        assert!(libraries.find_library("one").is_some());
        assert!(libraries.find_library("three").is_none());
        assert_eq!(libraries.library_names(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_libraries_register_replaces() {
        let mut libraries = Libraries::new();
        libraries.register(Library::new("lib"));
        libraries.register(Library::new("lib").with_filter("upper", upper()));
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries.get("lib").unwrap().len(), 1);
    }

    #[test]
    fn test_closure_lookup() {
        let lib = Arc::new(Library::new("only"));
        let lookup = move |name: &str| (name == "only").then(|| Arc::clone(&lib));
        assert!(lookup.find_library("only").is_some());
        assert!(lookup.find_library("other").is_none());
        assert!(lookup.library_names().is_empty());
    }

    #[test]
    fn test_debug_lists_filters() {
        let lib = Library::new("lib").with_filter("upper", upper());
        assert_eq!(format!("{lib:?}"), "Library { name: \"lib\", filters: [\"upper\"] }");
    }
}
