use crate::path::Path;

/// Bit layout of the `"flg"` field in the compiled document (§6).
mod flag {
    pub const HAS_CONDITION: u8 = 0x1;
    pub const HAS_START_CONTENT: u8 = 0x2;
    pub const HAS_CHOICE_ONLY_CONTENT: u8 = 0x4;
    pub const IS_INVISIBLE_DEFAULT: u8 = 0x8;
    pub const ONCE_ONLY: u8 = 0x10;
}

/// A choice point encountered during stepping. If its condition (when
/// present) is satisfied, stepping creates a [`crate::choice::Choice`] from
/// it and appends it to the generated-choices list (§4.2, §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoicePoint {
    pub path_on_choice: Path,
    pub has_condition: bool,
    pub has_start_content: bool,
    pub has_choice_only_content: bool,
    pub once_only: bool,
    pub is_invisible_default: bool,
}

impl ChoicePoint {
    pub fn new(path_on_choice: Path, flags: u8) -> Self {
        ChoicePoint {
            path_on_choice,
            has_condition: flags & flag::HAS_CONDITION != 0,
            has_start_content: flags & flag::HAS_START_CONTENT != 0,
            has_choice_only_content: flags & flag::HAS_CHOICE_ONLY_CONTENT != 0,
            is_invisible_default: flags & flag::IS_INVISIBLE_DEFAULT != 0,
            once_only: flags & flag::ONCE_ONLY != 0,
        }
    }
}
