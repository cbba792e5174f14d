use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use thiserror::Error;

use crate::path::{Fragment, Path};
use crate::runtime::RuntimeObject;

/// An immutable (after load) node in the content tree. `content` is the
/// ordered, positionally-addressable children; `named_subelements` is the
/// keyed overlay used for name-based addressing (knots, stitches, labeled
/// gathers). `path`/`parent` are populated by `assign_paths` once the whole
/// tree has been deserialized, since a container doesn't know its own
/// position until its owner places it.
#[derive(Debug, Deserialize)]
#[serde(try_from = "Vec<ContainerElement>")]
pub struct Container {
    pub content: Vec<RuntimeObject>,
    pub named_subelements: HashMap<String, RuntimeObject>,
    pub name: Option<String>,
    pub visits_should_be_counted: bool,
    pub turn_index_should_be_counted: bool,
    pub count_at_start_only: bool,
    #[serde(skip)]
    path: RefCell<Path>,
    #[serde(skip)]
    parent: RefCell<Option<Weak<Container>>>,
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
            && self.named_subelements == other.named_subelements
            && self.name == other.name
            && self.visits_should_be_counted == other.visits_should_be_counted
            && self.turn_index_should_be_counted == other.turn_index_should_be_counted
            && self.count_at_start_only == other.count_at_start_only
    }
}

impl Default for Container {
    fn default() -> Self {
        Container {
            content: Vec::new(),
            named_subelements: HashMap::new(),
            name: None,
            visits_should_be_counted: false,
            turn_index_should_be_counted: false,
            count_at_start_only: false,
            path: RefCell::new(Path::root()),
            parent: RefCell::new(None),
        }
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Container {
            content: self.content.clone(),
            named_subelements: self.named_subelements.clone(),
            name: self.name.clone(),
            visits_should_be_counted: self.visits_should_be_counted,
            turn_index_should_be_counted: self.turn_index_should_be_counted,
            count_at_start_only: self.count_at_start_only,
            path: RefCell::new(self.path.borrow().clone()),
            parent: RefCell::new(self.parent.borrow().clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContainerElement {
    RuntimeObject(RuntimeObject),
    SpecialFinal(Option<ContainerData>),
}

#[derive(Debug, Deserialize, Default)]
struct ContainerData {
    #[serde(rename = "#n")]
    name: Option<String>,
    #[serde(rename = "#f", default)]
    flags: u8,
    #[serde(flatten)]
    named_subelements: HashMap<String, RuntimeObject>,
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Failed to deserialize Container, expected object or null, found {0}")]
    UnexpectedRuntimeObject(RuntimeObject),
    #[error("Failed to deserialize Container, no elements")]
    NoElements,
    #[error("Failed to deserialize Container element as RuntimeObject, found null")]
    UnexpectedNull,
    #[error("Failed to deserialize Container element as RuntimeObject, found map")]
    UnexpectedMapObject(ContainerData),
}

impl Container {
    pub fn new() -> Container {
        Container::default()
    }

    pub fn count_flags(&self) -> u8 {
        let mut count_flags: u8 = 0;

        if self.visits_should_be_counted {
            count_flags |= 0x1;
        }

        if self.turn_index_should_be_counted {
            count_flags |= 0x2;
        }

        if self.count_at_start_only {
            count_flags |= 0x4;
        }

        count_flags
    }

    pub fn set_count_flags(&mut self, count_flags: u8) {
        self.visits_should_be_counted = count_flags & 0x1 > 0;
        self.turn_index_should_be_counted = count_flags & 0x2 > 0;
        self.count_at_start_only = count_flags & 0x4 > 0;
    }

    pub fn add_child(&mut self, obj: RuntimeObject) {
        self.content.push(obj);
    }

    pub fn prepend(&mut self, mut objects: Vec<RuntimeObject>) {
        objects.append(&mut self.content);
        self.content = objects;
    }

    pub fn search_by_name(&self, name: &str) -> Option<&RuntimeObject> {
        if let Some(found) = self.named_subelements.get(name) {
            return Some(found);
        }

        for runtime_object in &self.content {
            if let Some(other_name) = runtime_object.name() {
                if name == other_name {
                    return Some(runtime_object);
                }
            }
        }

        None
    }

    /// Path of this container, as computed by the last `assign_paths` pass
    /// from the tree's root.
    pub fn path(&self) -> Path {
        self.path.borrow().clone()
    }

    /// Parent container, if any (the root has none).
    pub fn parent(&self) -> Option<Rc<Container>> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// This container's index within its parent's `content`, used to
    /// advance a pointer to the next sibling (§4.3). `None` for the root,
    /// or if this container is only reachable by name.
    pub fn index_in_parent(&self) -> Option<usize> {
        self.parent()?;
        match self.path().fragments.last()? {
            Fragment::Index(i) => Some(*i),
            _ => None,
        }
    }

    /// Recomputes `path`/`parent` for this container and every descendant,
    /// called once by `RuntimeGraph::from_json` immediately after the tree
    /// deserializes. Named children (whether or not they also live in
    /// `content`) are addressed by name rather than by index.
    pub fn assign_paths(self_rc: &Rc<Container>, path: Path) {
        *self_rc.path.borrow_mut() = path.clone();

        for (index, child) in self_rc.content.iter().enumerate() {
            if let RuntimeObject::Container(child_container) = child {
                *child_container.parent.borrow_mut() = Some(Rc::downgrade(self_rc));
                let child_path = if let Some(name) = &child_container.name {
                    path.with_appended(Fragment::Name(name.clone()))
                } else {
                    path.with_appended(Fragment::Index(index))
                };
                Container::assign_paths(child_container, child_path);
            }
        }

        for (name, child) in self_rc.named_subelements.iter() {
            if let RuntimeObject::Container(child_container) = child {
                if child_container.path().is_empty() || child_container.parent().is_none() {
                    *child_container.parent.borrow_mut() = Some(Rc::downgrade(self_rc));
                    Container::assign_paths(
                        child_container,
                        path.with_appended(Fragment::Name(name.clone())),
                    );
                }
            }
        }
    }
}

impl TryFrom<Vec<ContainerElement>> for Container {
    type Error = ContainerError;

    fn try_from(mut elements: Vec<ContainerElement>) -> Result<Container, ContainerError> {
        // take last element of Container
        let data = match elements.pop() {
            Some(ContainerElement::SpecialFinal(Some(data))) => data,
            Some(ContainerElement::SpecialFinal(None)) => ContainerData::default(),
            Some(ContainerElement::RuntimeObject(object)) => {
                return Err(ContainerError::UnexpectedRuntimeObject(object))
            }
            None => return Err(ContainerError::NoElements),
        };
        // map other elements to RuntimeObject
        let content = elements
            .into_iter()
            .map(|item| match item {
                ContainerElement::RuntimeObject(element) => Ok(element),
                ContainerElement::SpecialFinal(None) => Err(ContainerError::UnexpectedNull),
                ContainerElement::SpecialFinal(Some(found)) => {
                    Err(ContainerError::UnexpectedMapObject(found))
                }
            })
            .collect::<Result<_, _>>()?;
        let visits_should_be_counted = data.flags & 0x1 > 0;
        let turn_index_should_be_counted = data.flags & 0x2 > 0;
        let count_at_start_only = data.flags & 0x4 > 0;
        Ok(Container {
            content,
            named_subelements: data.named_subelements,
            name: data.name,
            visits_should_be_counted,
            turn_index_should_be_counted,
            count_at_start_only,
            path: RefCell::new(Path::root()),
            parent: RefCell::new(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_flags_round_trip() {
        let mut container = Container::new();
        container.set_count_flags(0b101);
        assert!(container.visits_should_be_counted);
        assert!(!container.turn_index_should_be_counted);
        assert!(container.count_at_start_only);
        assert_eq!(container.count_flags(), 0b101);
    }
}
