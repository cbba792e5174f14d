use std::collections::HashMap;
use std::rc::Rc;

use crate::config::{CURRENT_INK_VERSION, MIN_COMPAT_INK_VERSION};
use crate::error::LoadError;
use crate::ink_list::{InkListItem, ListDefinitions};
use crate::path::{Fragment, Path};
use crate::runtime::container::Container;
use crate::runtime::RuntimeObject;

/// One named list definition: the ordered items an ink `LIST` declares,
/// each carrying the integer value assigned by declaration order.
#[derive(Debug, Clone, Default)]
pub struct ListDefinition {
    pub items: Vec<(String, i32)>,
}

/// The immutable, shared content tree materialized from a compiled
/// document, plus the list-definitions table. Both outlive and are shared
/// across every `Story` session built from them.
pub struct RuntimeGraph {
    pub ink_version: u32,
    pub root_container: Rc<Container>,
    pub list_definitions: HashMap<String, ListDefinition>,
}

impl RuntimeGraph {
    /// Loads a compiled document from its JSON text, validating the
    /// `inkVersion` envelope and wiring up container paths/parents.
    pub fn from_json_str(json: &str) -> Result<RuntimeGraph, LoadError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(LoadError::Malformed)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<RuntimeGraph, LoadError> {
        let object = value.as_object().ok_or(LoadError::MissingRoot)?;

        let ink_version = object
            .get("inkVersion")
            .and_then(|v| v.as_u64())
            .ok_or(LoadError::MissingRoot)? as u32;

        if ink_version < MIN_COMPAT_INK_VERSION {
            return Err(LoadError::VersionTooOld(ink_version));
        }
        if ink_version > CURRENT_INK_VERSION {
            return Err(LoadError::VersionTooNew(ink_version));
        }

        let root_json = object.get("root").cloned().ok_or(LoadError::MissingRoot)?;
        let root_object = crate::json_parser::runtime_object_from_json(root_json)
            .map_err(|_| LoadError::MissingRoot)?;
        let root_container = match root_object {
            RuntimeObject::Container(c) => c,
            _ => return Err(LoadError::MissingRoot),
        };

        Container::assign_paths(&root_container, Path::root());

        let list_definitions = object
            .get("listDefs")
            .and_then(|v| v.as_object())
            .map(parse_list_defs)
            .unwrap_or_default();

        Ok(RuntimeGraph {
            ink_version,
            root_container,
            list_definitions,
        })
    }

    /// Resolves an absolute path against the tree root. Relative paths
    /// (produced by `.foo`-style compiled output) must first be made
    /// absolute with [`crate::path::Path::resolve_against`].
    pub fn resolve_path(&self, path: &Path) -> Option<RuntimeObject> {
        let mut current_container = self.root_container.clone();
        let mut runtime_object: Option<RuntimeObject> =
            Some(RuntimeObject::Container(self.root_container.clone()));

        for fragment in &path.fragments {
            match fragment {
                Fragment::Index(index) => match current_container.content.get(*index) {
                    Some(child) => {
                        if let RuntimeObject::Container(container) = child {
                            current_container = container.clone();
                        }
                        runtime_object = Some(child.clone());
                    }
                    None => return None,
                },
                Fragment::Name(name) => match current_container.search_by_name(name) {
                    Some(child) => {
                        if let RuntimeObject::Container(container) = child {
                            current_container = container.clone();
                        }
                        runtime_object = Some(child.clone());
                    }
                    None => return None,
                },
                Fragment::Parent => {
                    let parent = current_container.parent()?;
                    current_container = parent;
                    runtime_object = Some(RuntimeObject::Container(current_container.clone()));
                }
            }
        }

        runtime_object
    }
}

impl ListDefinitions for RuntimeGraph {
    fn item_named(&self, origin_name: &str, item_name: &str) -> Option<i32> {
        self.list_definitions
            .get(origin_name)?
            .items
            .iter()
            .find(|(name, _)| name == item_name)
            .map(|(_, v)| *v)
    }

    fn item_with_value(&self, origin_name: &str, value: i32) -> Option<String> {
        self.list_definitions
            .get(origin_name)?
            .items
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.clone())
    }

    fn all_items_in(&self, origin_name: &str) -> Vec<(InkListItem, i32)> {
        self.list_definitions
            .get(origin_name)
            .map(|def| {
                def.items
                    .iter()
                    .map(|(name, value)| (InkListItem::new(origin_name, name.clone()), *value))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn parse_list_defs(
    defs: &serde_json::Map<String, serde_json::Value>,
) -> HashMap<String, ListDefinition> {
    let mut out = HashMap::new();
    for (origin_name, items) in defs {
        if let Some(items) = items.as_object() {
            let mut def = ListDefinition::default();
            for (item_name, value) in items {
                if let Some(value) = value.as_i64() {
                    def.items.push((item_name.clone(), value as i32));
                }
            }
            out.insert(origin_name.clone(), def);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn resolve_path_by_name_test() {
        let path = Path::from_str("a.b.c").unwrap();

        let mut child_level_3 = Container::new();
        child_level_3.name = Some("c".to_owned());

        let mut child_level_2 = Container::new();
        child_level_2.name = Some("b".to_owned());
        child_level_2.add_child(RuntimeObject::Container(Rc::new(child_level_3)));

        let mut child_level_1 = Container::new();
        child_level_1.name = Some("a".to_owned());
        child_level_1.add_child(RuntimeObject::Container(Rc::new(child_level_2)));

        let mut root_container = Container::new();
        root_container.add_child(RuntimeObject::Container(Rc::new(child_level_1)));
        let root_container = Rc::new(root_container);
        Container::assign_paths(&root_container, Path::root());

        let graph = RuntimeGraph {
            ink_version: 19,
            root_container,
            list_definitions: HashMap::new(),
        };

        match graph.resolve_path(&path) {
            Some(RuntimeObject::Container(container)) => {
                assert_eq!(container.name.as_ref().unwrap(), "c")
            }
            other => panic!("expected container, got {other:?}"),
        }
    }

    #[test]
    fn resolve_path_by_index_test() {
        use crate::runtime::divert::{Divert, TargetType};

        let path = Path::from_str("a.b.1").unwrap();

        let mut child_level_3_1 = Container::new();
        child_level_3_1.name = Some("c".to_owned());

        let child_level_3_2 = Divert::new(TargetType::VarName("mytarget".to_owned()));

        let mut child_level_2 = Container::new();
        child_level_2.name = Some("b".to_owned());
        child_level_2.add_child(RuntimeObject::Container(Rc::new(child_level_3_1)));
        child_level_2.add_child(RuntimeObject::Divert(child_level_3_2));

        let mut child_level_1 = Container::new();
        child_level_1.name = Some("a".to_owned());
        child_level_1.add_child(RuntimeObject::Container(Rc::new(child_level_2)));

        let mut root_container = Container::new();
        root_container.add_child(RuntimeObject::Container(Rc::new(child_level_1)));
        let root_container = Rc::new(root_container);
        Container::assign_paths(&root_container, Path::root());

        let graph = RuntimeGraph {
            ink_version: 19,
            root_container,
            list_definitions: HashMap::new(),
        };

        match graph.resolve_path(&path) {
            Some(RuntimeObject::Divert(divert)) => match &divert.target {
                TargetType::VarName(name) => assert_eq!(name, "mytarget"),
                _ => panic!("expected var-name target"),
            },
            other => panic!("expected divert, got {other:?}"),
        }
    }
}
