#[macro_use]
mod macros;

mod callstack;
mod choice;
mod config;
mod error;
mod eval_stack;
mod flow;
mod ink_list;
mod json_parser;
mod output_stream;
mod patch;
mod path;
mod pointer;
mod runtime;
mod runtime_context;
mod runtime_graph;
mod story;
mod story_state;
mod variables_state;
mod visit_counts;

pub use choice::Choice;
pub use config::{CURRENT_INK_VERSION, MIN_COMPAT_INK_VERSION};
pub use error::{
    LoadError, RuntimeErrorKind, SessionError, Severity, StoryError, StoryWarning, WarningKind,
};
pub use path::{Fragment, Path};
pub use runtime_context::{ExternalFunction, ExternalFunctionsRegistry, ListDefinitionsOrigin};
pub use runtime_graph::RuntimeGraph;
pub use story::Story;
pub use variables_state::VariableValue;
