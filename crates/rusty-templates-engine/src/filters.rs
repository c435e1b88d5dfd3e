//! Template filters and the per-template filter scope.
//!
//! A [`Filter`] is a host-supplied value transform. Filters are grouped into
//! [`Library`](crate::library::Library)s and bound into a template's
//! [`FilterRegistry`] by `{% load %}` tags while the template is parsed. At
//! render time [`apply_chain`] runs a variable's filters left to right.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rusty_templates_core::error::HostError;
use rusty_templates_core::value::Value;

use crate::context::Context;
use crate::error::RenderError;
use crate::parser::FilterInvocation;
use crate::variable;

/// How many arguments a filter accepts, counting the value being filtered.
///
/// This is the count Django reports in its arity errors, so a filter taking
/// one template argument has `min == max == 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgCount {
    /// Fewest arguments accepted.
    pub min: usize,
    /// Most arguments accepted.
    pub max: usize,
}

impl ArgCount {
    /// Takes only the piped value: `{{ value|upper }}`.
    pub const UNARY: Self = Self::new(1, 1);
    /// Requires one template argument: `{{ value|cut:' ' }}`.
    pub const BINARY: Self = Self::new(2, 2);
    /// Accepts an optional template argument: `{{ value|multiply }}` or `{{ value|multiply:4 }}`.
    pub const OPTIONAL_ARG: Self = Self::new(1, 2);

    /// Creates an argument count.
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `provided` arguments (including the value) are accepted.
    pub const fn accepts(self, provided: usize) -> bool {
        provided >= self.min && provided <= self.max
    }
}

/// A template filter.
///
/// Takes a value and an optional argument and returns a transformed value.
/// Any error returned is handed back to the caller of `render` unchanged.
pub trait Filter: Send + Sync {
    /// How many arguments the filter accepts.
    fn arg_count(&self) -> ArgCount;

    /// Applies the filter.
    fn apply(&self, value: &Value, arg: Option<&Value>) -> Result<Value, HostError>;

    /// Whether the filter preserves safeness: a safe input produces a safe
    /// output.
    fn is_safe(&self) -> bool {
        false
    }
}

type FilterFn = dyn Fn(&Value, Option<&Value>) -> Result<Value, HostError> + Send + Sync;

/// A [`Filter`] backed by a closure.
///
/// # Examples
///
/// ```
/// use rusty_templates_core::value::Value;
/// use rusty_templates_engine::filters::{ArgCount, Filter, FnFilter};
///
/// let double = FnFilter::unary(|value| {
///     Ok(Value::from(value.as_integer().unwrap_or_default() * 2))
/// });
/// assert_eq!(double.arg_count(), ArgCount::UNARY);
/// assert_eq!(double.apply(&Value::from(2), None).unwrap(), Value::from(4));
/// ```
pub struct FnFilter {
    func: Box<FilterFn>,
    arg_count: ArgCount,
    is_safe: bool,
}

impl FnFilter {
    /// A filter taking only the piped value.
    pub fn unary<F>(func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(move |value, _| func(value)),
            arg_count: ArgCount::UNARY,
            is_safe: false,
        }
    }

    /// A filter requiring one argument.
    pub fn binary<F>(func: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(move |value, arg| func(value, arg.unwrap_or(&Value::None))),
            arg_count: ArgCount::BINARY,
            is_safe: false,
        }
    }

    /// A filter whose argument may be omitted.
    pub fn optional_arg<F>(func: F) -> Self
    where
        F: Fn(&Value, Option<&Value>) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
            arg_count: ArgCount::OPTIONAL_ARG,
            is_safe: false,
        }
    }

    /// Marks the filter as preserving safe strings.
    #[must_use]
    pub const fn safe(mut self) -> Self {
        self.is_safe = true;
        self
    }
}

impl Filter for FnFilter {
    fn arg_count(&self) -> ArgCount {
        self.arg_count
    }

    fn apply(&self, value: &Value, arg: Option<&Value>) -> Result<Value, HostError> {
        (self.func)(value, arg)
    }

    fn is_safe(&self) -> bool {
        self.is_safe
    }
}

impl fmt::Debug for FnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter")
            .field("arg_count", &self.arg_count)
            .field("is_safe", &self.is_safe)
            .finish_non_exhaustive()
    }
}

/// A filter bound into a template's scope, with the library it came from.
#[derive(Clone)]
pub struct BoundFilter {
    /// The implementation.
    pub filter: Arc<dyn Filter>,
    /// Name of the library that provided it.
    pub library: String,
}

impl fmt::Debug for BoundFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFilter")
            .field("library", &self.library)
            .field("arg_count", &self.filter.arg_count())
            .finish_non_exhaustive()
    }
}

/// The filters in scope for one template.
///
/// Built while the template is parsed and frozen afterwards. Binding a name
/// that is already present replaces it, so later loads shadow earlier ones.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: IndexMap<String, BoundFilter>,
}

impl FilterRegistry {
    /// Creates a new empty filter registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a single filter under `name`, replacing any earlier binding.
    pub fn bind(&mut self, name: impl Into<String>, filter: Arc<dyn Filter>, library: impl Into<String>) {
        let name = name.into();
        let library = library.into();
        if let Some(previous) = self.filters.get(&name) {
            tracing::trace!(filter = %name, from = %previous.library, to = %library, "filter shadowed");
        }
        self.filters.insert(name, BoundFilter { filter, library });
    }

    /// Looks up a filter by name.
    pub fn get(&self, name: &str) -> Option<&BoundFilter> {
        self.filters.get(name)
    }

    /// Returns `true` if a filter called `name` is in scope.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Names of all filters in scope, in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Number of filters in scope.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filter is in scope.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Applies a filter chain to `value`, left to right.
///
/// Arguments given as paths are resolved against `context` first and fail
/// with [`RenderError::VariableDoesNotExist`]. Errors raised by a filter are
/// returned as [`RenderError::Host`] without modification.
pub fn apply_chain(
    mut value: Value,
    chain: &[FilterInvocation],
    context: &Context,
) -> Result<Value, RenderError> {
    for invocation in chain {
        let arg = invocation
            .argument
            .as_ref()
            .map(|argument| variable::resolve(argument, context))
            .transpose()?;

        let filter = &invocation.filter;
        let output = filter.apply(&value, arg.as_ref())?;
        value = if filter.is_safe() && value.is_safe() {
            output.mark_safe()
        } else {
            output
        };
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Operand, Segment, VariablePath};
    use rusty_templates_core::span::Span;

    fn double() -> Arc<dyn Filter> {
        Arc::new(FnFilter::unary(|v| {
            Ok(Value::from(v.as_integer().unwrap_or_default() * 2))
        }))
    }

    fn triple() -> Arc<dyn Filter> {
        Arc::new(FnFilter::unary(|v| {
            Ok(Value::from(v.as_integer().unwrap_or_default() * 3))
        }))
    }

    #[test]
    fn test_arg_count_accepts() {
        assert!(ArgCount::UNARY.accepts(1));
        assert!(!ArgCount::UNARY.accepts(2));
        assert!(ArgCount::BINARY.accepts(2));
        assert!(!ArgCount::BINARY.accepts(1));
        assert!(ArgCount::OPTIONAL_ARG.accepts(1));
        assert!(ArgCount::OPTIONAL_ARG.accepts(2));
        assert!(!ArgCount::OPTIONAL_ARG.accepts(3));
    }

    #[test]
    fn test_fn_filter_binary() {
        let cut = FnFilter::binary(|v, arg| {
            Ok(Value::from(
                v.to_display_string().replace(&arg.to_display_string(), ""),
            ))
        });
        assert_eq!(cut.arg_count(), ArgCount::BINARY);
        let out = cut
            .apply(&Value::from("Hello World!"), Some(&Value::from("ello")))
            .unwrap();
        assert_eq!(out, Value::from("H World!"));
    }

    #[test]
    fn test_fn_filter_optional_arg() {
        let multiply = FnFilter::optional_arg(|v, arg| {
            let factor = arg.and_then(Value::as_integer).unwrap_or(3);
            Ok(Value::from(v.as_integer().unwrap_or_default() * factor))
        });
        assert_eq!(multiply.apply(&Value::from(2), None).unwrap(), Value::from(6));
        assert_eq!(
            multiply.apply(&Value::from(2), Some(&Value::from(4))).unwrap(),
            Value::from(8)
        );
    }

    #[test]
    fn test_fn_filter_error_passes_through() {
        let failing = FnFilter::unary(|_| Err(HostError::msg("boom")));
        assert_eq!(failing.apply(&Value::None, None).unwrap_err().to_string(), "boom");
    }

    #[test]
    fn test_registry_bind_and_get() {
        let mut registry = FilterRegistry::new();
        assert!(registry.is_empty());
        registry.bind("double", double(), "custom_filters");
        assert!(registry.contains("double"));
        assert_eq!(registry.get("double").unwrap().library, "custom_filters");
        assert!(registry.get("square").is_none());
    }

    #[test]
    fn test_registry_later_binding_wins() {
        let mut registry = FilterRegistry::new();
        registry.bind("double", double(), "custom_filters");
        registry.bind("double", triple(), "shadow_filters");
        assert_eq!(registry.len(), 1);
        let bound = registry.get("double").unwrap();
        assert_eq!(bound.library, "shadow_filters");
        assert_eq!(bound.filter.apply(&Value::from(2), None).unwrap(), Value::from(6));
    }

    #[test]
    fn test_registry_names_in_order() {
        let mut registry = FilterRegistry::new();
        registry.bind("b", double(), "lib");
        registry.bind("a", triple(), "lib");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_safe_filter_flag() {
        let filter = FnFilter::unary(|v| Ok(v.clone())).safe();
        assert!(filter.is_safe());
        assert!(!FnFilter::unary(|v| Ok(v.clone())).is_safe());
    }

    fn invocation(name: &str, filter: Arc<dyn Filter>, argument: Option<Operand>) -> FilterInvocation {
        FilterInvocation {
            name: name.to_string(),
            library: "lib".to_string(),
            filter,
            argument,
            at: Span::default(),
        }
    }

    fn add() -> Arc<dyn Filter> {
        Arc::new(FnFilter::binary(|v, arg| {
            let sum = v.as_integer().unwrap_or_default() + arg.as_integer().unwrap_or_default();
            Ok(Value::from(sum))
        }))
    }

    fn literal(value: i64) -> Option<Operand> {
        Some(Operand::Literal {
            value: Value::from(value),
            at: Span::default(),
        })
    }

    #[test]
    fn test_apply_chain_left_to_right() {
        let chain = vec![
            invocation("add", add(), literal(1)),
            invocation("double", double(), None),
        ];
        let out = apply_chain(Value::from(2), &chain, &Context::new()).unwrap();
        assert_eq!(out, Value::from(6));
    }

    #[test]
    fn test_apply_chain_resolves_path_argument() {
        let path = Operand::Path(VariablePath {
            segments: vec![Segment {
                name: "step".to_string(),
                at: Span::new(0, 4),
            }],
            at: Span::new(0, 4),
        });
        let chain = vec![invocation("add", add(), Some(path))];

        let mut ctx = Context::new();
        ctx.set("step", 5);
        assert_eq!(apply_chain(Value::from(1), &chain, &ctx).unwrap(), Value::from(6));

        let err = apply_chain(Value::from(1), &chain, &Context::new()).unwrap_err();
        assert!(matches!(err, RenderError::VariableDoesNotExist { ref key, .. } if key == "step"));
    }

    #[test]
    fn test_apply_chain_stops_at_host_error() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let chain = vec![
            invocation("fail", Arc::new(FnFilter::unary(|_| Err(HostError::msg("nope")))), None),
            invocation(
                "count",
                Arc::new(FnFilter::unary(move |v| {
                    counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(v.clone())
                })),
                None,
            ),
        ];
        let err = apply_chain(Value::None, &chain, &Context::new()).unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_apply_chain_safeness() {
        let identity: Arc<dyn Filter> = Arc::new(FnFilter::unary(|v| Ok(v.clone())));
        let safe_identity: Arc<dyn Filter> = Arc::new(FnFilter::unary(|v| Ok(v.clone())).safe());
        let ctx = Context::new();
        let safe_input = Value::from("<b>").mark_safe();

        let chain = vec![invocation("keep", Arc::clone(&safe_identity), None)];
        assert!(apply_chain(safe_input.clone(), &chain, &ctx).unwrap().is_safe());
        assert!(!apply_chain(Value::from("<b>"), &chain, &ctx).unwrap().is_safe());

        let upper: Arc<dyn Filter> = Arc::new(FnFilter::unary(|v| {
            Ok(Value::from(v.to_display_string().to_uppercase()))
        }));
        let chain = vec![invocation("upper", upper, None)];
        assert!(!apply_chain(safe_input.clone(), &chain, &ctx).unwrap().is_safe());

        // A filter that returns safe text keeps it safe even when unflagged.
        let chain = vec![invocation("id", identity, None)];
        assert!(apply_chain(safe_input, &chain, &ctx).unwrap().is_safe());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn chain_equals_nested_calls(
                start in -1000i64..1000,
                a1 in -1000i64..1000,
                a2 in -1000i64..1000,
            ) {
                let chain = vec![
                    invocation("add", add(), literal(a1)),
                    invocation("double", double(), None),
                    invocation("add", add(), literal(a2)),
                ];
                let chained = apply_chain(Value::from(start), &chain, &Context::new()).unwrap();

                let (add, double) = (add(), double());
                let nested = add
                    .apply(
                        &double
                            .apply(&add.apply(&Value::from(start), Some(&Value::from(a1))).unwrap(), None)
                            .unwrap(),
                        Some(&Value::from(a2)),
                    )
                    .unwrap();
                prop_assert_eq!(chained, nested);
            }
        }
    }
}
