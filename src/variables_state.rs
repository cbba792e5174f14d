use std::collections::HashMap;

use crate::ink_list::ListDefinitions;
use crate::patch::Patch;
use crate::runtime::value::Value;
use crate::runtime_graph::RuntimeGraph;

/// The type callers see through the public get/set-variable API. An alias
/// today, kept distinct from [`crate::runtime::value::Value`] so the
/// public surface can diverge from the interpreter's internal
/// representation (e.g. variable pointers) without a breaking rename.
pub type VariableValue = Value;

/// A callback invoked whenever a named global variable changes, bound via
/// `Story::observe_variable` (§4 Collaborators).
pub type VariableObserver = Box<dyn Fn(&str, &VariableValue)>;

/// Global variable storage plus, while a save is in flight, the patch
/// overlay shadowing it (§4.9). Default values are captured at
/// construction so the engine can answer "has this changed since the
/// story started" without re-running initializer content.
pub struct VariablesState {
    globals: HashMap<String, Value>,
    default_globals: HashMap<String, Value>,
    pub patch: Option<Patch>,
    observers: HashMap<String, Vec<VariableObserver>>,
    pub batch_observing_variable_changes: bool,
    batched_changes: Vec<String>,
}

impl std::fmt::Debug for VariablesState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariablesState")
            .field("globals", &self.globals)
            .field("patch", &self.patch)
            .field("batch_observing_variable_changes", &self.batch_observing_variable_changes)
            .finish()
    }
}

impl VariablesState {
    pub fn new() -> Self {
        VariablesState {
            globals: HashMap::new(),
            default_globals: HashMap::new(),
            patch: None,
            observers: HashMap::new(),
            batch_observing_variable_changes: false,
            batched_changes: Vec::new(),
        }
    }

    /// Runs the `Container::global_declaration` list's initial assignment
    /// content (done by `Story` at construction) and snapshots the result
    /// as `default_globals`, used to answer "does the save diverge from a
    /// freshly-started story".
    pub fn snapshot_defaults(&mut self) {
        self.default_globals = self.globals.clone();
    }

    pub fn all_globals(&self) -> HashMap<String, Value> {
        self.globals.clone()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(patch) = &self.patch {
            if let Some(value) = patch.get_global(name) {
                return Some(value);
            }
        }
        self.globals.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match &mut self.patch {
            Some(patch) => {
                patch.set_global(name.clone(), value.clone());
                patch.mark_changed(name.clone());
            }
            None => {
                self.globals.insert(name.clone(), value.clone());
            }
        }
        self.notify_observers(&name, &value);
    }

    /// Global-variable-style lookup used for list-item-name resolution
    /// when a bare `LIST` origin name doubles as a global's value (ink's
    /// "global variable that holds a single-origin list" convention).
    pub fn has_global(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn default_value_changed(&self, name: &str) -> bool {
        self.default_globals.get(name) != self.get(name)
    }

    pub fn observe(&mut self, name: impl Into<String>, observer: VariableObserver) {
        self.observers.entry(name.into()).or_default().push(observer);
    }

    pub fn remove_observers(&mut self, name: &str) {
        self.observers.remove(name);
    }

    fn notify_observers(&mut self, name: &str, value: &Value) {
        if self.batch_observing_variable_changes {
            if !self.batched_changes.contains(&name.to_string()) {
                self.batched_changes.push(name.to_string());
            }
            return;
        }
        if let Some(observers) = self.observers.get(name) {
            for observer in observers {
                observer(name, value);
            }
        }
    }

    /// Fires every observer queued up while `batch_observing_variable_changes`
    /// was set, then clears the queue (§4.1 batch-apply semantics for
    /// `VAR=`/`temp=` runs within a single step).
    pub fn flush_batched_observers(&mut self) {
        let names = std::mem::take(&mut self.batched_changes);
        for name in names {
            if let Some(value) = self.get(&name).cloned() {
                if let Some(observers) = self.observers.get(&name) {
                    for observer in observers {
                        observer(&name, &value);
                    }
                }
            }
        }
    }

    /// Begins background save by handing the current patch (if any) back
    /// to the caller and installing a fresh empty one, so subsequent
    /// writes land in the new patch while the old one is serialized
    /// (§4.9 ownership-transfer).
    pub fn start_patch(&mut self) -> Option<Patch> {
        self.patch.replace(Patch::new())
    }

    pub fn discard_patch(&mut self) {
        self.patch = None;
    }

    pub fn apply_and_clear_patch(&mut self) {
        if let Some(patch) = self.patch.take() {
            for (name, value) in patch_globals(&patch) {
                self.globals.insert(name, value);
            }
        }
    }

    /// Seeds the globals table from the content tree's `VAR=` assignments
    /// (run once by `Story` at construction, before any user code runs).
    pub fn set_initial(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    pub fn resolve_list_origin<'a>(
        &self,
        graph: &'a RuntimeGraph,
        origin_name: &str,
    ) -> Option<&'a dyn ListDefinitions> {
        let _ = origin_name;
        Some(graph as &dyn ListDefinitions)
    }
}

impl Default for VariablesState {
    fn default() -> Self {
        VariablesState::new()
    }
}

fn patch_globals(patch: &Patch) -> Vec<(String, Value)> {
    patch
        .changed_variables()
        .filter_map(|name| patch.get_global(name).cloned().map(|v| (name.clone(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn set_then_get_round_trips() {
        let mut state = VariablesState::new();
        state.set("x", Value::Int(5));
        assert_eq!(state.get("x"), Some(&Value::Int(5)));
    }

    #[test]
    fn patch_shadows_base_until_applied() {
        let mut state = VariablesState::new();
        state.set("x", Value::Int(1));
        state.start_patch();
        state.set("x", Value::Int(2));
        assert_eq!(state.get("x"), Some(&Value::Int(2)));
        state.apply_and_clear_patch();
        assert_eq!(state.get("x"), Some(&Value::Int(2)));
        assert!(state.patch.is_none());
    }

    #[test]
    fn observer_fires_on_set() {
        use std::cell::RefCell;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let mut state = VariablesState::new();
        state.observe(
            "x",
            Box::new(move |name, value| seen_clone.borrow_mut().push((name.to_string(), value.clone()))),
        );
        state.set("x", Value::Int(9));
        assert_eq!(seen.borrow().len(), 1);
    }
}
