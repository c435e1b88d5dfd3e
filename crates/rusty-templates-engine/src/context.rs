//! Template context for variable resolution and rendering.
//!
//! Provides [`Context`] for holding template variables in a stack-based scope.

use indexmap::IndexMap;
use rusty_templates_core::value::Value;

/// A template context that holds variables in a stack of scopes.
///
/// The bottom scope always holds Django's builtins `True`, `False`, and
/// `None`. Variable lookup searches from the top of the stack downward.
///
/// # Examples
///
/// ```
/// use rusty_templates_core::value::Value;
/// use rusty_templates_engine::context::Context;
///
/// let mut ctx = Context::new();
/// ctx.set("name", Value::from("Ada"));
/// assert_eq!(ctx.get("name").unwrap().to_display_string(), "Ada");
///
/// ctx.push();
/// ctx.set("name", Value::from("Overridden"));
/// assert_eq!(ctx.get("name").unwrap().to_display_string(), "Overridden");
///
/// ctx.pop();
/// assert_eq!(ctx.get("name").unwrap().to_display_string(), "Ada");
/// assert_eq!(ctx.get("True"), Some(&Value::Bool(true)));
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    stack: Vec<IndexMap<String, Value>>,
}

fn builtins() -> IndexMap<String, Value> {
    let mut scope = IndexMap::with_capacity(3);
    scope.insert("True".to_string(), Value::Bool(true));
    scope.insert("False".to_string(), Value::Bool(false));
    scope.insert("None".to_string(), Value::None);
    scope
}

impl Context {
    /// Creates a context with the builtins scope and one empty scope.
    pub fn new() -> Self {
        Self::with_scope(IndexMap::new())
    }

    /// Creates a context whose first user scope is `scope`.
    pub fn with_scope(scope: IndexMap<String, Value>) -> Self {
        Self {
            stack: vec![builtins(), scope],
        }
    }

    /// Pushes a new scope onto the context stack.
    pub fn push(&mut self) {
        self.stack.push(IndexMap::new());
    }

    /// Pops the top scope from the context stack.
    ///
    /// The first user scope and the builtins are never popped.
    pub fn pop(&mut self) -> Option<IndexMap<String, Value>> {
        if self.stack.len() > 2 {
            self.stack.pop()
        } else {
            None
        }
    }

    /// Sets a variable in the current (top) scope.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if let Some(top) = self.stack.last_mut() {
            top.insert(key.into(), value.into());
        }
    }

    /// Looks up a single name, searching from the top scope downward.
    ///
    /// Dotted paths are not split here; see [`crate::variable`].
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.stack.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Returns `true` if any scope binds `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of scopes, builtins included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Flattens all scopes into a single map, with later scopes overriding earlier ones.
    pub fn flatten(&self) -> IndexMap<String, Value> {
        let mut result = IndexMap::new();
        for scope in &self.stack {
            for (k, v) in scope {
                result.insert(k.clone(), v.clone());
            }
        }
        result
    }

    /// The Python `repr()` of the scope stack, bottom first.
    ///
    /// This is what a failed lookup of a path's first segment reports.
    pub fn repr(&self) -> String {
        let scopes: Vec<String> = self
            .stack
            .iter()
            .map(|scope| Value::Dict(scope.clone()).repr())
            .collect();
        format!("[{}]", scopes.join(", "))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl From<IndexMap<String, Value>> for Context {
    fn from(scope: IndexMap<String, Value>) -> Self {
        Self::with_scope(scope)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Context {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::with_scope(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builtins() {
        let ctx = Context::new();
        assert_eq!(ctx.get("True"), Some(&Value::Bool(true)));
        assert_eq!(ctx.get("False"), Some(&Value::Bool(false)));
        assert_eq!(ctx.get("None"), Some(&Value::None));
        assert_eq!(ctx.depth(), 2);
    }

    #[test]
    fn test_context_push_pop() {
        let mut ctx = Context::new();
        ctx.set("x", 1);
        ctx.push();
        ctx.set("x", 2);
        assert_eq!(ctx.get("x"), Some(&Value::Integer(2)));
        let popped = ctx.pop().unwrap();
        assert_eq!(popped.get("x"), Some(&Value::Integer(2)));
        assert_eq!(ctx.get("x"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_context_pop_minimum_scope() {
        let mut ctx = Context::new();
        assert!(ctx.pop().is_none());
        assert_eq!(ctx.depth(), 2);
        assert!(ctx.contains("True"));
    }

    #[test]
    fn test_context_get_missing() {
        let ctx = Context::new();
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn test_context_shadows_builtins() {
        let mut ctx = Context::new();
        ctx.set("True", "yes");
        assert_eq!(ctx.get("True"), Some(&Value::from("yes")));
    }

    #[test]
    fn test_context_get_does_not_split_dots() {
        let mut ctx = Context::new();
        ctx.set("a", Value::from(serde_json::json!({"b": 1})));
        assert!(ctx.get("a.b").is_none());
    }

    #[test]
    fn test_context_flatten() {
        let mut ctx = Context::new();
        ctx.set("a", 1);
        ctx.push();
        ctx.set("a", 2);
        ctx.set("b", 3);
        let flat = ctx.flatten();
        assert_eq!(flat.get("a"), Some(&Value::Integer(2)));
        assert_eq!(flat.get("b"), Some(&Value::Integer(3)));
        assert_eq!(flat.get("None"), Some(&Value::None));
    }

    #[test]
    fn test_context_repr() {
        let serde_json::Value::Object(map) = serde_json::json!({"num": 2, "foo": {"bar": 3}}) else {
            panic!("expected object");
        };
        let ctx = Context::from(map);
        assert_eq!(
            ctx.repr(),
            "[{'True': True, 'False': False, 'None': None}, {'num': 2, 'foo': {'bar': 3}}]"
        );
    }

    #[test]
    fn test_context_from_iter() {
        let ctx: Context = vec![("text", "Hello World!")].into_iter().collect();
        assert_eq!(ctx.get("text"), Some(&Value::from("Hello World!")));
    }
}
