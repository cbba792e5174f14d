use std::collections::HashMap;

use crate::patch::Patch;
use crate::path::Path;

/// The base visit/turn-index tables plus, while a background save is in
/// flight, a patch overlay that shadows them (§4.9). Reads check the
/// patch first and fall back to the base table, so in-progress gameplay
/// always sees the latest value regardless of what's mid-serialization.
#[derive(Debug, Clone, Default)]
pub struct VisitCounts {
    visit_counts: HashMap<Path, u32>,
    turn_indices: HashMap<Path, i32>,
}

impl VisitCounts {
    pub fn new() -> Self {
        VisitCounts::default()
    }

    pub fn visits(&self, path: &Path, patch: Option<&Patch>) -> u32 {
        if let Some(patch) = patch {
            if let Some(count) = patch.get_visit_count(path) {
                return count;
            }
        }
        self.visit_counts.get(path).copied().unwrap_or(0)
    }

    pub fn turn_index(&self, path: &Path, patch: Option<&Patch>) -> i32 {
        if let Some(patch) = patch {
            if let Some(index) = patch.get_turn_index(path) {
                return index;
            }
        }
        self.turn_indices.get(path).copied().unwrap_or(-1)
    }

    /// Increments a container's visit count, writing through the patch if
    /// one is active, otherwise straight to the base table.
    pub fn increment_visit(&mut self, path: &Path, patch: Option<&mut Patch>) {
        let current = self.visits(path, patch.as_deref());
        match patch {
            Some(patch) => patch.set_visit_count(path.clone(), current + 1),
            None => {
                self.visit_counts.insert(path.clone(), current + 1);
            }
        }
    }

    pub fn record_turn_index(&mut self, path: &Path, turn_number: i32, patch: Option<&mut Patch>) {
        match patch {
            Some(patch) => patch.set_turn_index(path.clone(), turn_number),
            None => {
                self.turn_indices.insert(path.clone(), turn_number);
            }
        }
    }

    pub fn all_visits(&self) -> HashMap<Path, u32> {
        self.visit_counts.clone()
    }

    pub fn all_turn_indices(&self) -> HashMap<Path, i32> {
        self.turn_indices.clone()
    }

    pub fn apply_patch(&mut self, patch: Patch) {
        let mut globals = HashMap::new();
        patch.apply_to(&mut globals, &mut self.visit_counts, &mut self.turn_indices);
    }
}

trait PatchOptionExt {
    fn as_deref(&self) -> Option<&Patch>;
}

impl PatchOptionExt for Option<&mut Patch> {
    fn as_deref(&self) -> Option<&Patch> {
        match self {
            Some(patch) => Some(&**patch),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_visit_without_patch_writes_base() {
        let mut visits = VisitCounts::new();
        let path = Path::from_str("a").unwrap();
        visits.increment_visit(&path, None);
        visits.increment_visit(&path, None);
        assert_eq!(visits.visits(&path, None), 2);
    }

    #[test]
    fn increment_visit_with_patch_shadows_base() {
        let mut visits = VisitCounts::new();
        let path = Path::from_str("a").unwrap();
        visits.increment_visit(&path, None);

        let mut patch = Patch::new();
        visits.increment_visit(&path, Some(&mut patch));

        assert_eq!(visits.visits(&path, None), 1);
        assert_eq!(visits.visits(&path, Some(&patch)), 2);
    }
}
