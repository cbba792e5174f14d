use std::collections::{HashMap, HashSet};

use crate::path::Path;
use crate::runtime::value::Value;

/// A copy-on-write overlay recording everything a save-in-progress has
/// changed, kept separate from the base `VariablesState`/visit-count
/// tables until the save completes (§4.9). Lets the game keep mutating
/// state on the main thread while a background task serializes the
/// pre-patch values.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    globals: HashMap<String, Value>,
    visit_counts: HashMap<Path, u32>,
    turn_indices: HashMap<Path, i32>,
    changed_variables: HashSet<String>,
}

impl Patch {
    pub fn new() -> Self {
        Patch::default()
    }

    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    pub fn mark_changed(&mut self, name: impl Into<String>) {
        self.changed_variables.insert(name.into());
    }

    pub fn changed_variables(&self) -> impl Iterator<Item = &String> {
        self.changed_variables.iter()
    }

    pub fn get_visit_count(&self, path: &Path) -> Option<u32> {
        self.visit_counts.get(path).copied()
    }

    pub fn set_visit_count(&mut self, path: Path, count: u32) {
        self.visit_counts.insert(path, count);
    }

    pub fn get_turn_index(&self, path: &Path) -> Option<i32> {
        self.turn_indices.get(path).copied()
    }

    pub fn set_turn_index(&mut self, path: Path, index: i32) {
        self.turn_indices.insert(path, index);
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty() && self.visit_counts.is_empty() && self.turn_indices.is_empty()
    }

    /// Merges this patch's entries into the base tables, consuming it.
    /// Called when a background save completes successfully.
    pub fn apply_to(
        self,
        globals: &mut HashMap<String, Value>,
        visit_counts: &mut HashMap<Path, u32>,
        turn_indices: &mut HashMap<Path, i32>,
    ) {
        for (name, value) in self.globals {
            globals.insert(name, value);
        }
        for (path, count) in self.visit_counts {
            visit_counts.insert(path, count);
        }
        for (path, index) in self.turn_indices {
            turn_indices.insert(path, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_overlays_without_touching_base() {
        let mut globals = HashMap::new();
        globals.insert("x".to_string(), Value::Int(1));

        let mut patch = Patch::new();
        patch.set_global("x", Value::Int(2));
        patch.mark_changed("x");

        assert_eq!(globals.get("x"), Some(&Value::Int(1)));
        assert_eq!(patch.get_global("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn apply_to_merges_into_base() {
        let mut globals = HashMap::new();
        let mut visit_counts = HashMap::new();
        let mut turn_indices = HashMap::new();

        let mut patch = Patch::new();
        patch.set_global("x", Value::Int(2));
        let path = Path::from_str("a.b").unwrap();
        patch.set_visit_count(path.clone(), 3);

        patch.apply_to(&mut globals, &mut visit_counts, &mut turn_indices);

        assert_eq!(globals.get("x"), Some(&Value::Int(2)));
        assert_eq!(visit_counts.get(&path), Some(&3));
    }
}
