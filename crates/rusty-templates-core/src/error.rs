//! Core error types for rusty-templates.
//!
//! Two kinds of errors live here:
//!
//! - [`HostError`] wraps an error raised by host-supplied code (a filter
//!   implementation or an attribute accessor). The engine never inspects or
//!   rewrites it; it travels back to the caller with its original type intact
//!   and can be recovered with [`HostError::downcast_ref`].
//! - [`ConfigError`] reports malformed engine settings.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// An error raised by host code during rendering, carried through unchanged.
///
/// # Examples
///
/// ```
/// use rusty_templates_core::error::HostError;
///
/// #[derive(Debug)]
/// struct ZeroDivisionError;
///
/// impl std::fmt::Display for ZeroDivisionError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("division by zero")
///     }
/// }
///
/// impl std::error::Error for ZeroDivisionError {}
///
/// let err = HostError::new(ZeroDivisionError);
/// assert!(err.is::<ZeroDivisionError>());
/// assert_eq!(err.to_string(), "division by zero");
/// ```
pub struct HostError(BoxedError);

impl HostError {
    /// Wraps a host error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }

    /// Wraps an already boxed host error without boxing it again.
    pub fn from_boxed(error: BoxedError) -> Self {
        Self(error)
    }

    /// Creates a host error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }

    /// Returns `true` if the wrapped error is of type `E`.
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.0.is::<E>()
    }

    /// Returns a reference to the wrapped error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// Attempts to take the wrapped error back out as its concrete type.
    pub fn downcast<E>(self) -> Result<E, Self>
    where
        E: StdError + 'static,
    {
        self.0.downcast::<E>().map(|e| *e).map_err(Self)
    }

    /// Returns the wrapped error as a trait object.
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Unwraps the boxed host error.
    pub fn into_inner(self) -> BoxedError {
        self.0
    }
}

impl fmt::Debug for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for HostError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Errors raised while loading [`EngineSettings`](crate::settings::EngineSettings).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    #[error("Failed to parse TOML: {0}")]
    Toml(String),

    /// The JSON text could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    Json(String),

    /// The parsed document does not describe valid settings.
    #[error("Invalid settings: {0}")]
    Invalid(String),
}
