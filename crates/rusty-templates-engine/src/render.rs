//! Rendering parsed nodes to text.

use rusty_templates_core::settings::{EngineSettings, UndefinedBehavior};
use rusty_templates_core::utils::text::escape_html;
use rusty_templates_core::value::Value;

use crate::context::Context;
use crate::error::RenderError;
use crate::filters::apply_chain;
use crate::parser::{FilterExpression, Node, Operand};
use crate::variable;

/// Renders `nodes` in order.
///
/// Output is built in a private buffer and only returned if every node
/// renders; on failure the caller sees the error alone.
pub fn render_nodes(
    nodes: &[Node],
    context: &Context,
    settings: &EngineSettings,
) -> Result<String, RenderError> {
    let mut output = String::new();
    for node in nodes {
        match node {
            Node::Text { text, .. } => output.push_str(text),
            Node::Variable { expression, at } => {
                tracing::trace!(expression = %expression.token, at = %at, "render variable");
                output.push_str(&render_expression(expression, context, settings)?);
            }
            // Loads took effect during parsing.
            Node::Tag { .. } => {}
        }
    }
    Ok(output)
}

fn render_expression(
    expression: &FilterExpression,
    context: &Context,
    settings: &EngineSettings,
) -> Result<String, RenderError> {
    let base = match (&expression.base, settings.undefined) {
        (Operand::Path(path), UndefinedBehavior::Lenient) => {
            match variable::resolve_path(path, context) {
                Ok(value) => value,
                Err(RenderError::VariableDoesNotExist { .. }) => {
                    if !settings.string_if_invalid.is_empty() {
                        let replacement = settings.invalid_replacement(&path.to_string());
                        return Ok(render_value(&Value::Text(replacement), settings.autoescape));
                    }
                    Value::Text(String::new())
                }
                Err(err) => return Err(err),
            }
        }
        (operand, _) => variable::resolve(operand, context)?,
    };

    let value = apply_chain(base, &expression.filters, context)?;
    Ok(render_value(&value, settings.autoescape))
}

/// Converts a value to output text, escaping it unless it is safe or
/// `autoescape` is off.
pub fn render_value(value: &Value, autoescape: bool) -> String {
    let text = value.to_display_string();
    if autoescape && !value.is_safe() {
        escape_html(&text)
    } else {
        text
    }
}
