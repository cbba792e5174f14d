//! Runtime-wide constants. Ink stories are not configured, they are loaded;
//! this module holds the handful of fixed values a compiled document and
//! its runtime agree on, rather than a config-file layer.

/// Oldest `inkVersion` this runtime will still load.
pub const MIN_COMPAT_INK_VERSION: u32 = 18;

/// Newest `inkVersion` this runtime understands.
pub const CURRENT_INK_VERSION: u32 = 21;

/// Story seed used when a document is loaded without an explicit one
/// (no save data to resume, no caller-supplied override).
pub const DEFAULT_STORY_SEED: i32 = 0;
