use std::fmt;

use crate::path::Path;

/// Where a divert jumps: either a fixed path baked in at compile time, or a
/// variable name resolved at runtime (`-> {someVar}` in ink source).
#[derive(Debug, Clone, PartialEq)]
pub enum TargetType {
    Path(Path),
    VarName(String),
}

/// An unconditional jump: whether it pushes a callstack frame, and if so
/// of which kind, whether it's conditional on the top of the evaluation
/// stack, and whether it calls out to an external function.
#[derive(Debug, Clone, PartialEq)]
pub struct Divert {
    pub target: TargetType,
    pub pushes_to_callstack: bool,
    pub is_function: bool,
    pub is_tunnel: bool,
    pub is_external: bool,
    pub is_conditional: bool,
    /// Declared argument count for an external-function divert.
    pub external_args: usize,
}

impl Divert {
    pub fn new(target: TargetType) -> Self {
        Divert {
            target,
            pushes_to_callstack: false,
            is_function: false,
            is_tunnel: false,
            is_external: false,
            is_conditional: false,
            external_args: 0,
        }
    }
}

impl fmt::Display for Divert {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.target {
            TargetType::Path(path) => write!(f, "-> {path}"),
            TargetType::VarName(name) => write!(f, "-> {{{name}}}"),
        }
    }
}
