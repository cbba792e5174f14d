use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub enum Fragment {
    Index(usize),
    Name(String),
    Parent,
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Fragment::Index(ref index) => write!(f, "{}", index),
            Fragment::Name(ref name) => write!(f, "{}", name),
            Fragment::Parent => write!(f, "^"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(try_from = "&str")]
pub struct Path {
    pub fragments: Vec<Fragment>,
    pub is_relative: bool,
}

#[derive(Debug, Error)]
#[error("Failed to deserialize path")]
pub struct PathError;

impl Path {
    fn from_fragments(fragments: Vec<Fragment>, is_relative: bool) -> Path {
        Path {
            fragments: fragments,
            is_relative: is_relative,
        }
    }

    pub fn from_str(path: &str) -> Option<Path> {
        if path.is_empty() {
            return None;
        }

        let is_relative = path.starts_with('.');

        // If the path is relative remove the first dot
        let new_path = if is_relative {
            let mut iter = path.chars();
            iter.next();
            iter.as_str()
        } else {
            path
        };

        let fragments: Vec<Fragment> = new_path
            .split('.')
            .map(|token| match token.parse::<usize>() {
                Ok(index) => Fragment::Index(index),
                Err(_) => {
                    if token == "^" {
                        Fragment::Parent
                    } else {
                        Fragment::Name(token.to_string())
                    }
                }
            })
            .collect();

        Some(Path::from_fragments(fragments, is_relative))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_relative {
            write!(f, ".")?;
        }

        write!(
            f,
            "{}",
            self.fragments
                .iter()
                .map(|ref fragment| fragment.to_string())
                .collect::<Vec<_>>()
                .join(".")
        )
    }
}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl TryFrom<&str> for Path {
    type Error = PathError;

    fn try_from(string: &str) -> Result<Path, PathError> {
        Self::from_str(string).ok_or(PathError)
    }
}

impl Default for Path {
    fn default() -> Self {
        Path::root()
    }
}

impl Path {
    /// An absolute path with no components, denoting "the root container itself".
    pub fn root() -> Path {
        Path::from_fragments(Vec::new(), false)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Every non-empty prefix of this path, shortest first. Each prefix
    /// addresses one container on the way down from the root to the
    /// container this path addresses; used to enumerate the containers a
    /// divert enters or leaves (`VisitChangedContainersDueToDivert`).
    pub fn ancestors(&self) -> Vec<Path> {
        (1..=self.fragments.len())
            .map(|n| Path::from_fragments(self.fragments[..n].to_vec(), self.is_relative))
            .collect()
    }

    /// Whether `self` addresses `other` or a descendant of it.
    pub fn contains_or_equals(&self, other: &Path) -> bool {
        other.fragments.len() <= self.fragments.len()
            && self.fragments[..other.fragments.len()] == other.fragments[..]
    }

    /// The path with its final component removed, or `None` at the root.
    pub fn parent(&self) -> Option<Path> {
        if self.fragments.is_empty() {
            None
        } else {
            Some(Path::from_fragments(
                self.fragments[..self.fragments.len() - 1].to_vec(),
                self.is_relative,
            ))
        }
    }

    pub fn with_appended(&self, fragment: Fragment) -> Path {
        let mut fragments = self.fragments.clone();
        fragments.push(fragment);
        Path::from_fragments(fragments, self.is_relative)
    }

    /// Resolves a path that may be relative (produced by `.foo` syntax, or
    /// containing `^` "go up" components) against the path of its owning
    /// container, yielding an absolute path.
    pub fn resolve_against(&self, base: &Path) -> Path {
        if !self.is_relative {
            return self.clone();
        }

        let mut resolved = base.fragments.clone();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Parent => {
                    resolved.pop();
                }
                other => resolved.push(other.clone()),
            }
        }

        Path::from_fragments(resolved, false)
    }
}
