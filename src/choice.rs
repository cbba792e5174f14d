use crate::callstack::Thread;
use crate::path::Path;

/// A presented choice: text plus everything needed to resume play if it's
/// picked (§4.6). `thread_at_generation` is a full snapshot of the thread
/// the choice point ran in, restored on selection so any `startThread`
/// forks or temporary-variable scoping in effect when the choice was
/// generated are still in effect when it's followed up.
#[derive(Debug, Clone)]
pub struct Choice {
    pub text: String,
    pub source_path: Path,
    pub target_path: Path,
    pub thread_at_generation: Thread,
    pub original_thread_index: usize,
    pub is_invisible_default: bool,
    pub index_assigned_on_presentation: Option<usize>,
    pub tags: Vec<String>,
}

impl Choice {
    pub fn new(
        text: impl Into<String>,
        source_path: Path,
        target_path: Path,
        thread_at_generation: Thread,
        is_invisible_default: bool,
    ) -> Self {
        let original_thread_index = thread_at_generation.thread_index;
        Choice {
            text: text.into(),
            source_path,
            target_path,
            thread_at_generation,
            original_thread_index,
            is_invisible_default,
            index_assigned_on_presentation: None,
            tags: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_the_thread_it_was_generated_in() {
        let thread = Thread::new(3);
        let choice = Choice::new(
            "Open the door",
            Path::from_str("knot.0").unwrap(),
            Path::from_str("knot.door").unwrap(),
            thread,
            false,
        );
        assert_eq!(choice.original_thread_index, 3);
        assert!(!choice.is_invisible_default);
    }
}
