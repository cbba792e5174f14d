use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One member of a list, identified by the list it originates from plus its
/// item name, e.g. `Weekday.Monday`. Two items with the same name but
/// different origins are distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InkListItem {
    pub origin_name: String,
    pub item_name: String,
}

impl InkListItem {
    pub fn new(origin_name: impl Into<String>, item_name: impl Into<String>) -> Self {
        InkListItem {
            origin_name: origin_name.into(),
            item_name: item_name.into(),
        }
    }
}

impl fmt::Display for InkListItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.origin_name, self.item_name)
    }
}

/// A set-valued ink list: a bitflag-style value where each member carries
/// the integer value assigned by its list definition's declaration order.
/// Arithmetic between lists is set arithmetic (union, intersection,
/// difference); arithmetic against an int reads as "the list whose single
/// item has that value".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InkList {
    /// Ordered by item so iteration and display are deterministic.
    pub items: BTreeMap<InkListItem, i32>,
    /// Names of the list definitions this value is allowed to draw new
    /// items from when constructed via `LIST_ALL`/`listFromInt` — kept so
    /// an empty list still remembers "I am a Weekday list with no items".
    pub origin_names: Vec<String>,
}

impl InkList {
    pub fn new() -> Self {
        InkList::default()
    }

    pub fn single(item: InkListItem, value: i32) -> Self {
        let mut list = InkList::new();
        list.origin_names.push(item.origin_name.clone());
        list.items.insert(item, value);
        list
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn union(&self, other: &InkList) -> InkList {
        let mut items = self.items.clone();
        items.extend(other.items.clone());
        InkList {
            items,
            origin_names: merge_origins(&self.origin_names, &other.origin_names),
        }
    }

    pub fn intersect(&self, other: &InkList) -> InkList {
        let items = self
            .items
            .iter()
            .filter(|(item, _)| other.items.contains_key(*item))
            .map(|(item, value)| (item.clone(), *value))
            .collect();
        InkList {
            items,
            origin_names: merge_origins(&self.origin_names, &other.origin_names),
        }
    }

    /// `self - other`: every item of `self` not present in `other`.
    pub fn without(&self, other: &InkList) -> InkList {
        let items = self
            .items
            .iter()
            .filter(|(item, _)| !other.items.contains_key(*item))
            .map(|(item, value)| (item.clone(), *value))
            .collect();
        InkList {
            items,
            origin_names: self.origin_names.clone(),
        }
    }

    /// Whether every item in `other` is present in `self`.
    pub fn has(&self, other: &InkList) -> bool {
        other.items.keys().all(|item| self.items.contains_key(item))
    }

    pub fn has_not(&self, other: &InkList) -> bool {
        !self.has(other)
    }

    pub fn max_item(&self) -> Option<(InkListItem, i32)> {
        self.items
            .iter()
            .max_by_key(|(_, v)| *v)
            .map(|(item, v)| (item.clone(), *v))
    }

    pub fn min_item(&self) -> Option<(InkListItem, i32)> {
        self.items
            .iter()
            .min_by_key(|(_, v)| *v)
            .map(|(item, v)| (item.clone(), *v))
    }

    pub fn contains_value(&self, value: i32) -> bool {
        self.items.values().any(|v| *v == value)
    }
}

fn merge_origins(a: &[String], b: &[String]) -> Vec<String> {
    let mut merged = a.to_vec();
    for name in b {
        if !merged.contains(name) {
            merged.push(name.clone());
        }
    }
    merged
}

impl fmt::Display for InkList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rendered: Vec<String> = self.items.keys().map(|item| item.item_name.clone()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// Query interface onto the out-of-scope list-definitions collaborator
/// (the compiled `listDefs` table). The story engine only ever needs to
/// look items up by origin/name or by origin/value; storage and parsing of
/// list definitions is the loader's concern.
pub trait ListDefinitions {
    fn item_named(&self, origin_name: &str, item_name: &str) -> Option<i32>;
    fn item_with_value(&self, origin_name: &str, value: i32) -> Option<String>;
    fn all_items_in(&self, origin_name: &str) -> Vec<(InkListItem, i32)>;
}
