use colored::Colorize;
use std::fmt;

use thiserror::Error;

use crate::config::{CURRENT_INK_VERSION, MIN_COMPAT_INK_VERSION};

/// Fatal errors raised while materializing a [`crate::RuntimeGraph`] from a
/// compiled document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "ink version {0} is older than the minimum supported version {MIN_COMPAT_INK_VERSION}"
    )]
    VersionTooOld(u32),
    #[error(
        "ink version {0} is newer than the version this runtime supports ({CURRENT_INK_VERSION})"
    )]
    VersionTooNew(u32),
    #[error("document has no root container")]
    MissingRoot,
    #[error("malformed ink document")]
    Malformed(#[from] serde_json::Error),
}

/// Fatal-to-the-call errors raised by [`crate::Story`] session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot continue: no content left to execute")]
    CannotContinueNoContent,
    #[error("choice index {index} is out of range (0..{count})")]
    OutOfRangeChoice { index: usize, count: usize },
    #[error("no flow named '{0}'")]
    UnknownFlow(String),
    #[error("path '{0}' does not address an addressable container")]
    InvalidPath(String),
    #[error("cannot remove the default flow")]
    CannotRemoveDefaultFlow,
    #[error("cannot switch flow while a background save is in progress")]
    CannotSwitchFlowWhileSaving,
    #[error("a background save is already in progress")]
    SaveInProgress,
    #[error("an asynchronous continue is already in progress")]
    AsyncOperationInProgress,
}

/// Non-fatal errors accumulated during a `continue` and dispatched to
/// `on_error` subscribers at the end of the outermost call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    #[error("unresolved variable '{0}'")]
    UnresolvedVariable(String),
    #[error("missing external function '{0}'")]
    MissingExternal(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("evaluation stack underflow")]
    StackUnderflow,
    #[error("unexpected end of content")]
    UnexpectedEndOfContent,
    #[error("invalid divert target: {0}")]
    InvalidDivertTarget(String),
    #[error("thread was not popped before the story ended")]
    ThreadNotPopped,
    #[error("variable '{0}' was already declared")]
    DuplicateDeclaration(String),
}

/// Non-fatal advisories accumulated alongside runtime errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WarningKind {
    #[error("path '{0}' was approximated to the nearest addressable content")]
    PathApproximated(String),
    #[error("ink version mismatch is non-critical: {0}")]
    VersionMismatchNoncritical(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "{}", "ERROR".red().bold()),
            Severity::Warning => write!(f, "{}", "WARNING".yellow().bold()),
        }
    }
}

/// A runtime error collected during stepping; `Display` renders it the way
/// an embedder printing diagnostics straight to a terminal would want it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} {kind}", Severity::Error)]
pub struct StoryError {
    pub kind: RuntimeErrorKind,
}

impl StoryError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        StoryError { kind }
    }
}

/// A warning collected alongside [`StoryError`]s in the same reporting pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} {kind}", Severity::Warning)]
pub struct StoryWarning {
    pub kind: WarningKind,
}

impl StoryWarning {
    pub fn new(kind: WarningKind) -> Self {
        StoryWarning { kind }
    }
}
