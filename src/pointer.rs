use std::fmt;
use std::rc::Rc;

use crate::path::{Fragment, Path};
use crate::runtime::container::Container;
use crate::runtime::RuntimeObject;

/// A cursor into the content tree: the container currently being stepped
/// through, plus an index into its children. `index == -1` means "the
/// container itself" (used when a divert lands directly on a container,
/// before its first child has been visited).
#[derive(Clone)]
pub struct Pointer {
    pub container: Option<Rc<Container>>,
    pub index: i64,
}

impl Pointer {
    pub fn null() -> Pointer {
        Pointer {
            container: None,
            index: -1,
        }
    }

    pub fn is_null(&self) -> bool {
        self.container.is_none()
    }

    pub fn start_of(container: Rc<Container>) -> Pointer {
        Pointer {
            container: Some(container),
            index: -1,
        }
    }

    pub fn new(container: Option<Rc<Container>>, index: i64) -> Pointer {
        Pointer { container, index }
    }

    /// Resolves this pointer to the runtime object it addresses: the
    /// container itself at `index == -1`, the child at `index`, or `None`
    /// once `index` has run past the end of the container's content.
    pub fn resolve(&self) -> Option<RuntimeObject> {
        let container = self.container.as_ref()?;

        if self.index < 0 {
            return Some(RuntimeObject::Container(container.clone()));
        }

        container.content.get(self.index as usize).cloned()
    }

    /// The path this pointer addresses, for diagnostics and for
    /// `VisitChangedContainersDueToDivert` comparisons.
    pub fn path(&self) -> Option<Path> {
        let container = self.container.as_ref()?;
        let base = container.path();
        if self.index < 0 {
            Some(base)
        } else {
            Some(base.with_appended(Fragment::Index(self.index as usize)))
        }
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.path() {
            Some(path) => write!(f, "Pointer({})", path),
            None => write!(f, "Pointer(null)"),
        }
    }
}
