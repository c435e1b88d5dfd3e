//! Variable resolution.
//!
//! A dotted path is resolved one segment at a time. The first segment is
//! looked up in the [`Context`]; every later segment is tried against the
//! current value in a fixed order:
//!
//! 1. mapping key,
//! 2. sequence index (a non-negative integer in bounds; text is indexed by
//!    character),
//! 3. host attribute via [`HostObject::get_attribute`], invoking it if it is a
//!    method.
//!
//! The first rule that applies wins. When none does, resolution fails with
//! [`RenderError::VariableDoesNotExist`] carrying the failing segment, the
//! `repr()` of the value it was tried against, and both spans.
//!
//! [`HostObject::get_attribute`]: rusty_templates_core::value::HostObject::get_attribute

use rusty_templates_core::error::HostError;
use rusty_templates_core::value::Value;

use crate::context::Context;
use crate::error::RenderError;
use crate::parser::{Operand, VariablePath};

/// Resolves an operand: literals are returned as-is, paths are looked up.
pub fn resolve(operand: &Operand, context: &Context) -> Result<Value, RenderError> {
    match operand {
        Operand::Literal { value, .. } => Ok(value.clone()),
        Operand::Path(path) => resolve_path(path, context),
    }
}

/// Resolves a dotted path against `context`.
///
/// # Errors
///
/// [`RenderError::VariableDoesNotExist`] if a segment cannot be resolved;
/// [`RenderError::Host`] if an attribute accessor fails.
pub fn resolve_path(path: &VariablePath, context: &Context) -> Result<Value, RenderError> {
    let Some((first, rest)) = path.segments.split_first() else {
        return Err(RenderError::VariableDoesNotExist {
            key: String::new(),
            object: context.repr(),
            key_at: path.at,
            object_at: None,
        });
    };

    let mut current = context
        .get(&first.name)
        .cloned()
        .ok_or_else(|| RenderError::VariableDoesNotExist {
            key: first.name.clone(),
            object: context.repr(),
            key_at: first.at,
            object_at: None,
        })?;

    for (i, segment) in rest.iter().enumerate() {
        match lookup(&current, &segment.name)? {
            Some(next) => current = next,
            None => {
                tracing::trace!(path = %path, key = %segment.name, "lookup failed");
                return Err(RenderError::VariableDoesNotExist {
                    key: segment.name.clone(),
                    object: current.repr(),
                    key_at: segment.at,
                    object_at: Some(path.prefix_span(i)),
                });
            }
        }
    }

    Ok(current)
}

/// Looks up one segment on a value, trying key, index, then attribute.
///
/// Returns `Ok(None)` when no rule applies.
pub fn lookup(current: &Value, segment: &str) -> Result<Option<Value>, HostError> {
    if let Value::Dict(map) = current {
        if let Some(value) = map.get(segment) {
            return Ok(Some(value.clone()));
        }
    }

    if let Some(index) = parse_index(segment) {
        match current {
            Value::List(items) => {
                if let Some(value) = items.get(index) {
                    return Ok(Some(value.clone()));
                }
            }
            Value::Text(text) | Value::SafeText(text) => {
                if let Some(ch) = text.chars().nth(index) {
                    return Ok(Some(Value::Text(ch.to_string())));
                }
            }
            _ => {}
        }
    }

    if let Value::Object(object) = current {
        if let Some(attribute) = object.get_attribute(segment) {
            return attribute.resolve().map(Some);
        }
    }

    Ok(None)
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
