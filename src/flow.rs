use std::collections::HashMap;

use crate::callstack::CallStack;
use crate::choice::Choice;
use crate::output_stream::OutputStream;
use crate::pointer::Pointer;

pub const DEFAULT_FLOW_NAME: &str = "DEFAULT_FLOW";

/// One independent execution context: its own callstack, output stream,
/// and generated-choices list (§4.8). `Story::switch_flow` swaps which
/// flow is "current"; every flow other than the one active at save time
/// keeps ticking over across sessions.
#[derive(Debug, Clone)]
pub struct Flow {
    pub name: String,
    pub callstack: CallStack,
    pub output_stream: OutputStream,
    pub current_choices: Vec<Choice>,
}

impl Flow {
    pub fn new(name: impl Into<String>, root_pointer: Pointer) -> Self {
        Flow {
            name: name.into(),
            callstack: CallStack::new(root_pointer),
            output_stream: OutputStream::new(),
            current_choices: Vec::new(),
        }
    }
}

/// The registry of named flows plus which one is current (§4.8). The
/// `"DEFAULT_FLOW"` entry always exists and can never be removed while
/// active; removing the active flow falls back to it.
#[derive(Debug, Clone)]
pub struct FlowRegistry {
    flows: HashMap<String, Flow>,
    current_flow_name: String,
}

impl FlowRegistry {
    pub fn new(root_pointer: Pointer) -> Self {
        let mut flows = HashMap::new();
        flows.insert(
            DEFAULT_FLOW_NAME.to_string(),
            Flow::new(DEFAULT_FLOW_NAME, root_pointer),
        );
        FlowRegistry {
            flows,
            current_flow_name: DEFAULT_FLOW_NAME.to_string(),
        }
    }

    pub fn current(&self) -> &Flow {
        self.flows
            .get(&self.current_flow_name)
            .expect("current flow always exists")
    }

    pub fn current_mut(&mut self) -> &mut Flow {
        self.flows
            .get_mut(&self.current_flow_name)
            .expect("current flow always exists")
    }

    pub fn current_name(&self) -> &str {
        &self.current_flow_name
    }

    /// Switches to `name`, creating a fresh flow rooted at `root_pointer`
    /// if it doesn't exist yet.
    pub fn switch_to(&mut self, name: impl Into<String>, root_pointer: Pointer) {
        let name = name.into();
        self.flows
            .entry(name.clone())
            .or_insert_with(|| Flow::new(name.clone(), root_pointer));
        self.current_flow_name = name;
    }

    /// Removes a non-active, non-default flow. Returns an error string if
    /// the caller asked to remove the active flow or the default flow
    /// (§4.8 invariant).
    pub fn remove(&mut self, name: &str) -> Result<(), String> {
        if name == DEFAULT_FLOW_NAME {
            return Err(format!("cannot remove the default flow '{DEFAULT_FLOW_NAME}'"));
        }
        if name == self.current_flow_name {
            return Err(format!("cannot remove the active flow '{name}'"));
        }
        if self.flows.remove(name).is_none() {
            return Err(format!("no such flow '{name}'"));
        }
        Ok(())
    }

    pub fn flow_names(&self) -> impl Iterator<Item = &String> {
        self.flows.keys()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_default_flow() {
        let registry = FlowRegistry::new(Pointer::null());
        assert_eq!(registry.current_name(), DEFAULT_FLOW_NAME);
    }

    #[test]
    fn switch_to_creates_and_activates_a_new_flow() {
        let mut registry = FlowRegistry::new(Pointer::null());
        registry.switch_to("side_quest", Pointer::null());
        assert_eq!(registry.current_name(), "side_quest");
        assert!(registry.contains(DEFAULT_FLOW_NAME));
    }

    #[test]
    fn cannot_remove_default_or_active_flow() {
        let mut registry = FlowRegistry::new(Pointer::null());
        assert!(registry.remove(DEFAULT_FLOW_NAME).is_err());

        registry.switch_to("side_quest", Pointer::null());
        assert!(registry.remove("side_quest").is_err());

        registry.switch_to(DEFAULT_FLOW_NAME, Pointer::null());
        assert!(registry.remove("side_quest").is_ok());
    }
}
