//! Two threads of ambient context a running `Story` needs beyond its own
//! state: the bindings to host-language external functions, and the
//! combined view over every `LIST` origin declared in the document.

use std::collections::HashMap;

use crate::error::RuntimeErrorKind;
use crate::ink_list::InkListItem;
use crate::runtime::value::Value;
use crate::runtime_graph::ListDefinition;

/// A host-bound external function (§4.7): takes the arguments already
/// popped off the evaluation stack and returns the value to push back.
pub type ExternalFunction = Box<dyn Fn(&[Value]) -> Value>;

struct Binding {
    function: ExternalFunction,
    lookahead_safe: bool,
}

/// The set of external functions bound for the lifetime of a `Story`
/// (§4.7). A function not marked lookahead-safe is never invoked while
/// the engine is speculatively stepping ahead to resolve a glue/newline
/// lookahead (§4.4) — calling it there would run side effects the host
/// hasn't actually committed to yet.
#[derive(Default)]
pub struct ExternalFunctionsRegistry {
    bindings: HashMap<String, Binding>,
}

impl ExternalFunctionsRegistry {
    pub fn new() -> Self {
        ExternalFunctionsRegistry::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, lookahead_safe: bool, function: ExternalFunction) {
        self.bindings.insert(
            name.into(),
            Binding {
                function,
                lookahead_safe,
            },
        );
    }

    pub fn unbind(&mut self, name: &str) {
        self.bindings.remove(name);
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn is_lookahead_safe(&self, name: &str) -> bool {
        self.bindings
            .get(name)
            .map(|b| b.lookahead_safe)
            .unwrap_or(false)
    }

    /// Invokes a bound function. Fails with `MissingExternal` if nothing's
    /// bound, or if the call happens during lookahead and the binding
    /// isn't marked safe for that.
    pub fn call(
        &self,
        name: &str,
        args: &[Value],
        during_lookahead: bool,
    ) -> Result<Value, RuntimeErrorKind> {
        let binding = self
            .bindings
            .get(name)
            .ok_or_else(|| RuntimeErrorKind::MissingExternal(name.to_string()))?;
        if during_lookahead && !binding.lookahead_safe {
            return Err(RuntimeErrorKind::MissingExternal(name.to_string()));
        }
        Ok((binding.function)(args))
    }
}

/// The combined view over every `LIST` origin declared in a document
/// (§4 Data Model, list values). Beyond per-origin lookup, it resolves a
/// bare item name (no `Origin.` qualifier) to the single origin that
/// declares it, when exactly one does — the convention ink source uses
/// for list literals like `(a, b)` with no origin prefix.
pub struct ListDefinitionsOrigin {
    origins: HashMap<String, ListDefinition>,
    single_item_cache: HashMap<String, (String, i32)>,
}

impl ListDefinitionsOrigin {
    pub fn new(origins: HashMap<String, ListDefinition>) -> Self {
        let mut name_counts: HashMap<&str, u32> = HashMap::new();
        for def in origins.values() {
            for (item_name, _) in &def.items {
                *name_counts.entry(item_name.as_str()).or_insert(0) += 1;
            }
        }

        let mut single_item_cache = HashMap::new();
        for (origin_name, def) in &origins {
            for (item_name, value) in &def.items {
                if name_counts.get(item_name.as_str()) == Some(&1) {
                    single_item_cache.insert(item_name.clone(), (origin_name.clone(), *value));
                }
            }
        }

        ListDefinitionsOrigin {
            origins,
            single_item_cache,
        }
    }

    pub fn origin_named(&self, name: &str) -> Option<&ListDefinition> {
        self.origins.get(name)
    }

    /// Resolves a bare item name to its (origin, value) pair, only when
    /// exactly one declared origin contains it.
    pub fn find_single_item_list_with_name(&self, item_name: &str) -> Option<(InkListItem, i32)> {
        let (origin_name, value) = self.single_item_cache.get(item_name)?;
        Some((InkListItem::new(origin_name.clone(), item_name.to_string()), *value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn call_invokes_bound_function() {
        let mut registry = ExternalFunctionsRegistry::new();
        registry.bind(
            "double",
            true,
            Box::new(|args| match args.first() {
                Some(Value::Int(i)) => Value::Int(i * 2),
                _ => Value::Int(0),
            }),
        );
        let result = registry.call("double", &[Value::Int(21)], false).unwrap();
        assert_eq!(result, Value::Int(42));
    }

    #[test]
    fn unsafe_binding_rejected_during_lookahead() {
        let mut registry = ExternalFunctionsRegistry::new();
        registry.bind("sideEffect", false, Box::new(|_| Value::Int(0)));
        assert!(registry.call("sideEffect", &[], true).is_err());
        assert!(registry.call("sideEffect", &[], false).is_ok());
    }

    #[test]
    fn call_counter_increments_exactly_once() {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        let mut registry = ExternalFunctionsRegistry::new();
        registry.bind(
            "count",
            true,
            Box::new(move |_| {
                calls_clone.set(calls_clone.get() + 1);
                Value::Int(0)
            }),
        );
        registry.call("count", &[], false).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn single_origin_item_resolves_unqualified() {
        let mut origins = HashMap::new();
        origins.insert(
            "Colors".to_string(),
            ListDefinition {
                items: vec![("red".to_string(), 1), ("blue".to_string(), 2)],
            },
        );
        let view = ListDefinitionsOrigin::new(origins);
        let (item, value) = view.find_single_item_list_with_name("red").unwrap();
        assert_eq!(item.item_name, "red");
        assert_eq!(value, 1);
    }

    #[test]
    fn ambiguous_item_name_does_not_resolve() {
        let mut origins = HashMap::new();
        origins.insert(
            "Colors".to_string(),
            ListDefinition {
                items: vec![("active".to_string(), 1)],
            },
        );
        origins.insert(
            "States".to_string(),
            ListDefinition {
                items: vec![("active".to_string(), 5)],
            },
        );
        let view = ListDefinitionsOrigin::new(origins);
        assert!(view.find_single_item_list_with_name("active").is_none());
    }
}
