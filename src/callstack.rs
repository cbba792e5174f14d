use std::collections::HashMap;

use crate::pointer::Pointer;
use crate::runtime::value::Value;

/// Which kind of frame a callstack element is — governs how `->->`/`~ret`
/// and implicit end-of-content returns (§4.3) are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPopType {
    Tunnel,
    Function,
    FunctionEvaluationFromGame,
}

/// One nested callstack frame. Temporary variables are scoped to the
/// frame; a function call additionally remembers where in the output
/// stream it started, so its return value can be captured as the text
/// produced since the call (used by `Story::evaluate_function`).
#[derive(Debug, Clone)]
pub struct Frame {
    pub frame_type: PushPopType,
    pub current_pointer: Pointer,
    pub temporary_variables: HashMap<String, Value>,
    pub evaluation_stack_height_on_entry: usize,
    pub function_start_in_output_stream: usize,
    pub in_expression_evaluation: bool,
}

impl Frame {
    pub fn new(frame_type: PushPopType, current_pointer: Pointer) -> Self {
        Frame {
            frame_type,
            current_pointer,
            temporary_variables: HashMap::new(),
            evaluation_stack_height_on_entry: 0,
            function_start_in_output_stream: 0,
            in_expression_evaluation: false,
        }
    }
}

/// An independently advancing slice of frames, forked from another
/// thread's top-of-stack by `startThread` (§4.8). Threads carry their own
/// numeric index so choices generated within them can restore the correct
/// thread on selection.
#[derive(Debug, Clone)]
pub struct Thread {
    pub frames: Vec<Frame>,
    pub thread_index: usize,
}

impl Thread {
    pub fn new(thread_index: usize) -> Self {
        Thread {
            frames: Vec::new(),
            thread_index,
        }
    }
}

/// A stack of threads; the active thread is always the top. At a terminal
/// step only one thread may remain (§3 invariant).
#[derive(Debug, Clone)]
pub struct CallStack {
    pub threads: Vec<Thread>,
    next_thread_index: usize,
}

impl CallStack {
    pub fn new(root_pointer: Pointer) -> Self {
        let mut thread = Thread::new(0);
        thread
            .frames
            .push(Frame::new(PushPopType::Tunnel, root_pointer));
        // The base frame is not a real tunnel; it exists purely so the
        // callstack is never empty. It is distinguished by depth == 1.
        CallStack {
            threads: vec![thread],
            next_thread_index: 1,
        }
    }

    pub fn active_thread(&self) -> &Thread {
        self.threads.last().expect("callstack has no active thread")
    }

    pub fn active_thread_mut(&mut self) -> &mut Thread {
        self.threads.last_mut().expect("callstack has no active thread")
    }

    pub fn current_frame(&self) -> &Frame {
        self.active_thread()
            .frames
            .last()
            .expect("active thread has no frames")
    }

    pub fn current_frame_mut(&mut self) -> &mut Frame {
        self.active_thread_mut()
            .frames
            .last_mut()
            .expect("active thread has no frames")
    }

    pub fn current_pointer(&self) -> Pointer {
        self.current_frame().current_pointer.clone()
    }

    pub fn set_current_pointer(&mut self, pointer: Pointer) {
        self.current_frame_mut().current_pointer = pointer;
    }

    pub fn depth(&self) -> usize {
        self.active_thread().frames.len()
    }

    /// True once only the implicit base frame remains in the one surviving
    /// thread — i.e. no tunnel/function call is outstanding.
    pub fn can_pop(&self) -> bool {
        self.depth() > 1
    }

    pub fn push(&mut self, frame_type: PushPopType, return_pointer: Pointer, eval_height: usize) {
        let mut frame = Frame::new(frame_type, return_pointer);
        frame.evaluation_stack_height_on_entry = eval_height;
        self.active_thread_mut().frames.push(frame);
    }

    /// Pops a frame, checking it was pushed as the expected kind. Returns
    /// the popped frame so callers can restore the pointer/eval-height it
    /// carried as a return point.
    pub fn pop(&mut self, expected: PushPopType) -> Result<Frame, String> {
        if !self.can_pop() {
            return Err("tried to pop the base callstack frame".to_string());
        }
        let top_type = self.current_frame().frame_type;
        if top_type != expected {
            return Err(format!(
                "expected to pop a {expected:?} frame but found a {top_type:?} frame"
            ));
        }
        Ok(self.active_thread_mut().frames.pop().unwrap())
    }

    /// Forks the active thread (`startThread`, §4.8): the new thread
    /// shares nothing mutable with its parent going forward, but starts
    /// with a snapshot of the parent's current frame stack.
    pub fn fork_thread(&mut self) {
        let index = self.next_thread_index;
        self.next_thread_index += 1;
        let mut forked = Thread::new(index);
        forked.frames = self.active_thread().frames.clone();
        self.threads.push(forked);
    }

    /// Closes the active thread (`done` with more than one thread left, or
    /// the end of a forked thread's content). No-op on the last thread.
    pub fn pop_thread(&mut self) -> bool {
        if self.threads.len() > 1 {
            self.threads.pop();
            true
        } else {
            false
        }
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Restores a thread that was saved when a choice was generated
    /// (§4.6), replacing the whole thread stack so the restored thread is
    /// the only one left active — choosing a choice does not fork a new
    /// thread on top of whatever was active before it.
    pub fn set_active_thread(&mut self, thread: Thread) {
        self.threads = vec![thread];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::Pointer;

    #[test]
    fn starts_with_a_single_unpoppable_frame() {
        let stack = CallStack::new(Pointer::null());
        assert_eq!(stack.depth(), 1);
        assert!(!stack.can_pop());
    }

    #[test]
    fn push_then_pop_round_trips() {
        let mut stack = CallStack::new(Pointer::null());
        stack.push(PushPopType::Function, Pointer::null(), 0);
        assert!(stack.can_pop());
        let popped = stack.pop(PushPopType::Function).unwrap();
        assert_eq!(popped.frame_type, PushPopType::Function);
        assert!(!stack.can_pop());
    }

    #[test]
    fn pop_rejects_mismatched_kind() {
        let mut stack = CallStack::new(Pointer::null());
        stack.push(PushPopType::Tunnel, Pointer::null(), 0);
        assert!(stack.pop(PushPopType::Function).is_err());
    }

    #[test]
    fn fork_thread_adds_a_new_active_thread() {
        let mut stack = CallStack::new(Pointer::null());
        stack.fork_thread();
        assert_eq!(stack.thread_count(), 2);
        assert!(stack.pop_thread());
        assert_eq!(stack.thread_count(), 1);
        assert!(!stack.pop_thread());
    }
}
