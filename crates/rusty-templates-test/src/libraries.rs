//! Fixture filter libraries.
//!
//! | library          | filters                                              |
//! |------------------|------------------------------------------------------|
//! | `custom_filters` | `cut`, `double`, `multiply`, `divide_by_zero`, `lower` |
//! | `more_filters`   | `square`                                             |
//! | `shadow_filters` | `double` (triples), `square`                         |
//!
//! Arithmetic follows Python: integers stay integers, anything involving a
//! float becomes a float, and dividing by zero raises [`ZeroDivisionError`].

use rusty_templates_core::error::HostError;
use rusty_templates_core::value::Value;
use rusty_templates_engine::filters::FnFilter;
use rusty_templates_engine::library::{Libraries, Library};

/// Raised by `divide_by_zero` when the divisor is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("division by zero")]
pub struct ZeroDivisionError;

/// Raised when an operator is applied to values it does not support.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
pub struct TypeError {
    /// The operator, e.g. `*`.
    pub op: &'static str,
    /// Type of the left operand.
    pub left: String,
    /// Type of the right operand.
    pub right: String,
}

impl TypeError {
    fn new(op: &'static str, left: &Value, right: &Value) -> Self {
        Self {
            op,
            left: left.type_name().to_string(),
            right: right.type_name().to_string(),
        }
    }
}

fn multiply(left: &Value, right: &Value) -> Result<Value, HostError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_mul(*b)
            .map(Value::Integer)
            .ok_or_else(|| HostError::msg("integer overflow")),
        (Value::Text(text) | Value::SafeText(text), Value::Integer(n))
        | (Value::Integer(n), Value::Text(text) | Value::SafeText(text)) => {
            Ok(Value::Text(text.repeat(usize::try_from(*n).unwrap_or(0))))
        }
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(a * b)),
            _ => Err(HostError::new(TypeError::new("*", left, right))),
        },
    }
}

#[allow(clippy::float_cmp)]
fn divide(left: &Value, right: &Value) -> Result<Value, HostError> {
    match (left.as_float(), right.as_float()) {
        (Some(_), Some(b)) if b == 0.0 => Err(HostError::new(ZeroDivisionError)),
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => Err(HostError::new(TypeError::new("/", left, right))),
    }
}

/// `cut`, `double`, `multiply`, `divide_by_zero`, and `lower`.
pub fn custom_filters() -> Library {
    Library::new("custom_filters")
        .with_filter(
            "cut",
            FnFilter::binary(|value, arg| {
                let needle = arg.to_display_string();
                Ok(Value::from(value.to_display_string().replace(&needle, "")))
            }),
        )
        .with_filter(
            "double",
            FnFilter::unary(|value| multiply(value, &Value::Integer(2))),
        )
        .with_filter(
            "multiply",
            FnFilter::optional_arg(|value, by| multiply(value, by.unwrap_or(&Value::Integer(3)))),
        )
        .with_filter(
            "divide_by_zero",
            FnFilter::optional_arg(|value, by| divide(value, by.unwrap_or(&Value::Integer(0)))),
        )
        .with_filter(
            "lower",
            FnFilter::unary(|value| Ok(Value::from(value.to_display_string().to_lowercase())))
                .safe(),
        )
}

/// `square`.
pub fn more_filters() -> Library {
    Library::new("more_filters").with_filter("square", FnFilter::unary(|value| multiply(value, value)))
}

/// Exports a `double` that triples, to observe which definition wins.
pub fn shadow_filters() -> Library {
    Library::new("shadow_filters")
        .with_filter(
            "double",
            FnFilter::unary(|value| multiply(value, &Value::Integer(3))),
        )
        .with_filter("square", FnFilter::unary(|value| multiply(value, value)))
}

/// All fixture libraries.
pub fn libraries() -> Libraries {
    [custom_filters(), more_filters(), shadow_filters()]
        .into_iter()
        .collect()
}
