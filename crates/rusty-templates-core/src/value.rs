//! Runtime values.
//!
//! [`Value`] is the only runtime type the engine manipulates. Host-owned
//! objects enter the value model through the [`HostObject`] capability: the
//! engine never reflects over host types, it only asks them for named
//! attributes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::HostError;
use crate::utils::text::{python_float_repr, python_str_repr};

/// A zero-argument accessor exposed by a host object.
pub type AccessorFn = dyn Fn() -> Result<Value, HostError> + Send + Sync;

/// A member exposed by a [`HostObject`].
#[derive(Clone)]
pub enum Attribute {
    /// A plain data member.
    Value(Value),
    /// A callable member; the resolver invokes it with no arguments.
    Method(Arc<AccessorFn>),
}

impl Attribute {
    /// Wraps a zero-argument accessor.
    pub fn method<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self::Method(Arc::new(f))
    }

    /// Produces the attribute's value, invoking it if it is callable.
    pub fn resolve(&self) -> Result<Value, HostError> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Method(f) => f(),
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Method(_) => f.write_str("Method(..)"),
        }
    }
}

impl From<Value> for Attribute {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// The attribute-access capability a host object implements.
///
/// This is the only way the engine looks inside a host-owned value; it is
/// consulted by the variable resolver after mapping-key and sequence-index
/// lookups have failed.
pub trait HostObject: Send + Sync {
    /// A short name for the host type, used in the default `repr`.
    fn type_name(&self) -> &str;

    /// Returns the member called `name`, if the object exposes one.
    fn get_attribute(&self, name: &str) -> Option<Attribute>;

    /// The Python-style `repr()` of the object, used in lookup errors.
    fn repr(&self) -> String {
        format!("<{} object>", self.type_name())
    }

    /// The Python-style `str()` of the object, used when it is rendered.
    fn to_display_string(&self) -> String {
        self.repr()
    }
}

/// Represents a dynamic value in a template context.
///
/// The variants mirror the Python types the reference engine sees: `None`,
/// `bool`, `int`, `float`, `str`, `list`, `dict`, and arbitrary host objects.
#[derive(Clone)]
pub enum Value {
    /// The absence of a value (Python's `None`).
    None,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit integer.
    Integer(i64),
    /// A 64-bit floating point number.
    Float(f64),
    /// A string value.
    Text(String),
    /// A string marked as safe; auto-escaping will not be applied.
    SafeText(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A key-value mapping, kept in insertion order.
    Dict(IndexMap<String, Value>),
    /// A host-owned object reached through [`HostObject`].
    Object(Arc<dyn HostObject>),
}

impl Value {
    /// Wraps a host object.
    pub fn object<T: HostObject + 'static>(object: T) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Returns `true` if this value is considered "truthy" by Python.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) | Self::SafeText(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Dict(d) => !d.is_empty(),
            Self::Object(_) => true,
        }
    }

    /// A short type name for debugging and logs.
    pub fn type_name(&self) -> &str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) | Self::SafeText(_) => "str",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
            Self::Object(o) => o.type_name(),
        }
    }

    /// Converts this value to its rendered form, like Python's `str()`.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Text(s) | Self::SafeText(s) => s.clone(),
            Self::Object(o) => o.to_display_string(),
            other => other.repr(),
        }
    }

    /// Returns a Python-like `repr()` string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rusty_templates_core::value::Value;
    ///
    /// let value = Value::from(serde_json::json!({"bar": 3, "tags": ["a", true, null]}));
    /// assert_eq!(value.repr(), "{'bar': 3, 'tags': ['a', True, None]}");
    /// ```
    pub fn repr(&self) -> String {
        match self {
            Self::None => "None".to_string(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => python_float_repr(*f),
            Self::Text(s) | Self::SafeText(s) => python_str_repr(s),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(Self::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Dict(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", python_str_repr(k), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Self::Object(o) => o.repr(),
        }
    }

    /// Returns `true` if this value is a safe string (auto-escaping bypassed).
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::SafeText(_))
    }

    /// Marks a string value as safe, bypassing auto-escaping.
    #[must_use]
    pub fn mark_safe(self) -> Self {
        match self {
            Self::Text(s) => Self::SafeText(s),
            other => other,
        }
    }

    /// Returns the length of a list, string, or dict.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Text(s) | Self::SafeText(s) => Some(s.chars().count()),
            Self::List(l) => Some(l.len()),
            Self::Dict(d) => Some(d.len()),
            _ => None,
        }
    }

    /// Returns `true` if this is an empty collection or empty string.
    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|l| l == 0)
    }

    /// Returns the integer if this is an `Integer` or a `Bool`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Attempts to convert this value to an f64.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Returns the string contents if this is a `Text` or `SafeText`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::SafeText(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a `List`.
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a `Dict`.
    pub fn as_dict(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Dict(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the host object if this is an `Object`.
    pub fn as_object(&self) -> Option<&Arc<dyn HostObject>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::SafeText(s) => f.debug_tuple("SafeText").field(s).finish(),
            Self::List(l) => f.debug_tuple("List").field(l).finish(),
            Self::Dict(d) => f.debug_tuple("Dict").field(d).finish(),
            Self::Object(o) => write!(f, "Object({})", o.repr()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl PartialEq for Value {
    #[allow(clippy::cast_precision_loss)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a) | Self::SafeText(a), Self::Text(b) | Self::SafeText(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                (*a as f64) == *b
            }
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::None, Self::None) => true,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// -- From implementations --

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_possible_wrap)]
    fn from(i: usize) -> Self {
        Self::Integer(i as i64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<IndexMap<String, T>> for Value {
    fn from(m: IndexMap<String, T>) -> Self {
        Self::Dict(m.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(m: BTreeMap<String, T>) -> Self {
        Self::Dict(m.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(m: HashMap<String, T>) -> Self {
        Self::Dict(m.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Self::None, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::None
                }
            }
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(arr) => Self::List(arr.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Dict(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
