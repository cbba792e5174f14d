//! The top-level interpreter: owns a story's state and external-function
//! bindings and drives the step loop that executes content out of a
//! [`RuntimeGraph`] (§4.1–§4.9).

use std::rc::Rc;

use crate::callstack::PushPopType;
use crate::choice::Choice;
use crate::error::{RuntimeErrorKind, SessionError, WarningKind};
use crate::ink_list::{InkList, InkListItem};
use crate::path::Path;
use crate::pointer::Pointer;
use crate::runtime::divert::{Divert, TargetType};
use crate::runtime::value::{StringValue, Value};
use crate::runtime::RuntimeObject;
use crate::runtime_context::{ExternalFunction, ExternalFunctionsRegistry, ListDefinitionsOrigin};
use crate::runtime_graph::RuntimeGraph;
use crate::story_state::{StateSnapshot, StoryState};

/// A running instance of a compiled document. Cheap to construct more
/// than one of against the same [`RuntimeGraph`]: the graph is
/// reference-counted and shared read-only, while each `Story` owns its
/// own mutable [`StoryState`] and external-function table.
pub struct Story {
    graph: Rc<RuntimeGraph>,
    list_definitions: ListDefinitionsOrigin,
    state: StoryState,
    eval_stack: crate::eval_stack::EvaluationStack,
    external_functions: ExternalFunctionsRegistry,
    async_continue_active: bool,
    line_start_output_len: usize,
}

impl Story {
    pub fn new(graph: RuntimeGraph) -> Self {
        let graph = Rc::new(graph);
        let list_definitions = ListDefinitionsOrigin::new(clone_list_defs(&graph));
        let root_pointer = Pointer::new(Some(graph.root_container.clone()), -1);
        Story {
            state: StoryState::new(root_pointer, crate::config::DEFAULT_STORY_SEED),
            graph,
            list_definitions,
            eval_stack: crate::eval_stack::EvaluationStack::new(),
            external_functions: ExternalFunctionsRegistry::new(),
            async_continue_active: false,
            line_start_output_len: 0,
        }
    }

    pub fn state(&self) -> &StoryState {
        &self.state
    }

    /// Text produced by the most recent `continue_one_line` (or the line
    /// currently in progress), not the story's whole history — mirrors
    /// what a single ink `Continue()` call returns.
    pub fn current_text(&self) -> String {
        self.state.flows.current().output_stream.text_since(self.line_start_output_len)
    }

    pub fn current_tags(&self) -> Vec<String> {
        self.state.flows.current().output_stream.tags_since(self.line_start_output_len)
    }

    pub fn current_choices(&self) -> &[Choice] {
        &self.state.flows.current().current_choices
    }

    pub fn current_errors(&self) -> &[crate::error::StoryError] {
        &self.state.current_errors
    }

    pub fn current_warnings(&self) -> &[crate::error::StoryWarning] {
        &self.state.current_warnings
    }

    pub fn can_continue(&self) -> bool {
        !self.current_pointer().is_null()
    }

    fn current_pointer(&self) -> Pointer {
        self.state.flows.current().callstack.current_pointer()
    }

    fn set_current_pointer(&mut self, pointer: Pointer) {
        self.state.flows.current_mut().callstack.set_current_pointer(pointer);
    }

    /// Executes content until a full line has been produced or the story
    /// runs out of content (§4.1, §4.4).
    pub fn continue_one_line(&mut self) -> Result<(), SessionError> {
        if !self.can_continue() {
            return Err(SessionError::CannotContinueNoContent);
        }
        self.state.reset_output();
        self.state.current_turn_index += 1;
        self.line_start_output_len = self.state.flows.current().output_stream.len();

        loop {
            loop {
                let outcome = self.micro_step();
                match outcome {
                    StepOutcome::Continuing => {}
                    StepOutcome::EndOfFlow => break,
                }
                if self.line_is_complete() {
                    break;
                }
                if !self.can_continue() {
                    break;
                }
            }

            if self.can_continue() || !self.auto_advance_invisible_default_choice() {
                break;
            }
        }

        Ok(())
    }

    /// A story that runs out of content with only invisible-default
    /// choices pending (fallback branches the player never sees) follows
    /// the first one itself and keeps stepping, rather than surfacing a
    /// choice prompt with nothing visible to show (§8 boundary behavior).
    fn auto_advance_invisible_default_choice(&mut self) -> bool {
        let choices = &self.state.flows.current().current_choices;
        if choices.is_empty() || !choices.iter().all(|c| c.is_invisible_default) {
            return false;
        }
        self.choose_choice(0).is_ok()
    }

    /// Executes lines until the story runs out of content entirely,
    /// returning their concatenated text (each line's own `current_text`
    /// joined in order, matching what repeated `continue_one_line` calls
    /// would report individually).
    pub fn continue_maximally(&mut self) -> Result<String, SessionError> {
        let mut text = String::new();
        while self.can_continue() {
            self.continue_one_line()?;
            text.push_str(&self.current_text());
        }
        Ok(text)
    }

    /// True once the output stream ends in a real newline that a
    /// lookahead pass has confirmed won't be cancelled by trailing glue
    /// (§4.4). Rather than speculatively executing content and rolling
    /// state back, this only ever looks one content object ahead and
    /// consumes it if it is glue, whitespace-only text, or a choice point
    /// (generating a choice has no effect that needs undoing). If that
    /// peek runs into glue and then finds real content behind it, the
    /// glue has just cancelled the pending newline, so this reports the
    /// line as *not* complete yet and lets the same call keep stepping
    /// into that content — otherwise the cancellation and the content
    /// that triggers it would land in two different `continue_one_line`
    /// windows and `text_since` would never see them together.
    fn line_is_complete(&mut self) -> bool {
        if !self.state.flows.current().output_stream.ends_in_newline() {
            return false;
        }

        let mut glue_pending = false;
        loop {
            let pointer = self.current_pointer();
            if pointer.is_null() {
                return true;
            }
            match pointer.resolve() {
                Some(RuntimeObject::Glue(_)) => {
                    self.state.flows.current_mut().output_stream.push_glue();
                    self.advance_from(pointer);
                    glue_pending = true;
                }
                Some(RuntimeObject::Value(Value::String(s))) if s.is_whitespace_only() => {
                    self.advance_from(pointer);
                }
                Some(RuntimeObject::Choice(choice_point)) => {
                    self.dispatch_choice_point(&choice_point, &pointer);
                    self.advance_from(pointer);
                }
                _ => return !glue_pending,
            }
        }
    }

    fn advance_from(&mut self, pointer: Pointer) {
        match next_content_pointer(pointer.container.clone(), pointer.index + 1) {
            Some(next) => self.set_current_pointer(next),
            None => self.handle_exhausted_content(),
        }
    }

    /// Executes exactly one content object (or one control-flow step when
    /// content is exhausted at the current depth).
    fn micro_step(&mut self) -> StepOutcome {
        let pointer = self.current_pointer();

        let object = match pointer.resolve() {
            Some(object) => object,
            None => {
                self.handle_exhausted_content();
                return if self.can_continue() {
                    StepOutcome::Continuing
                } else {
                    StepOutcome::EndOfFlow
                };
            }
        };

        if let RuntimeObject::Container(container) = &object {
            self.enter_container(container.clone());
            return StepOutcome::Continuing;
        }

        let redirected = self.dispatch(&object, &pointer);
        if !redirected {
            self.advance_from(pointer);
        }
        StepOutcome::Continuing
    }

    fn enter_container(&mut self, container: Rc<crate::runtime::container::Container>) {
        if container.visits_should_be_counted {
            let increment = !container.count_at_start_only
                || self.state.visit_counts.visits(&container.path(), self.state.variables.patch.as_ref()) == 0;
            if increment {
                self.state
                    .visit_counts
                    .increment_visit(&container.path(), self.state.variables.patch.as_mut());
            }
        }
        if container.turn_index_should_be_counted {
            let turn = self.state.current_turn_index;
            self.state
                .visit_counts
                .record_turn_index(&container.path(), turn, self.state.variables.patch.as_mut());
        }
        self.set_current_pointer(Pointer::new(Some(container), 0));
    }

    fn handle_exhausted_content(&mut self) {
        let flow = self.state.flows.current_mut();
        if flow.callstack.can_pop() {
            let frame_type = flow.callstack.current_frame().frame_type;
            if let Ok(popped) = flow.callstack.pop(frame_type) {
                flow.callstack.set_current_pointer(popped.current_pointer);
                self.eval_stack.truncate_to(popped.evaluation_stack_height_on_entry);
            }
        } else if flow.callstack.thread_count() > 1 {
            flow.callstack.pop_thread();
        } else {
            flow.callstack.set_current_pointer(Pointer::null());
            self.state.did_safe_exit = true;
        }
    }

    /// Runs one non-container object's effect. Returns whether it changed
    /// the current pointer itself (a divert, or a callstack pop), in
    /// which case the main loop must not also auto-advance to the next
    /// sibling.
    fn dispatch(&mut self, object: &RuntimeObject, pointer: &Pointer) -> bool {
        match object {
            RuntimeObject::Value(value) => {
                self.push_value_to_context(value.clone());
                false
            }
            RuntimeObject::Glue(_) => {
                self.state.flows.current_mut().output_stream.push_glue();
                false
            }
            RuntimeObject::Tag(tag) => {
                self.state.flows.current_mut().output_stream.push_literal_tag(tag.text.clone());
                false
            }
            RuntimeObject::ControlCommand(command) => self.dispatch_control_command(*command),
            RuntimeObject::Divert(divert) => self.dispatch_divert(divert, pointer),
            RuntimeObject::NativeFunctionCall(native) => {
                self.dispatch_native_function(*native);
                false
            }
            RuntimeObject::VariableReference(reference) => {
                self.dispatch_variable_reference(&reference.name);
                false
            }
            RuntimeObject::VariableAssignment(assignment) => {
                self.dispatch_variable_assignment(assignment);
                false
            }
            RuntimeObject::ReadCount(read_count) => {
                let count = self
                    .state
                    .visit_counts
                    .visits(&read_count.target, self.state.variables.patch.as_ref());
                self.eval_stack_mut().push(Value::Int(count as i32));
                false
            }
            RuntimeObject::Choice(choice_point) => {
                self.dispatch_choice_point(choice_point, pointer);
                false
            }
            RuntimeObject::Container(_) => unreachable!("containers handled before dispatch"),
            RuntimeObject::Void | RuntimeObject::Null => false,
        }
    }

    fn in_expression_evaluation(&self) -> bool {
        self.state.flows.current().callstack.current_frame().in_expression_evaluation
    }

    fn eval_stack_mut(&mut self) -> &mut crate::eval_stack::EvaluationStack {
        &mut self.eval_stack
    }

    fn push_value_to_context(&mut self, value: Value) {
        if self.in_expression_evaluation() {
            self.eval_stack_mut().push(value);
        } else {
            self.state
                .flows
                .current_mut()
                .output_stream
                .push_text(value.to_output_string());
        }
    }

    fn dispatch_control_command(&mut self, command: crate::runtime::control_command::ControlCommand) -> bool {
        use crate::runtime::control_command::ControlCommand::*;
        match command {
            EvalStart => {
                self.state.flows.current_mut().callstack.current_frame_mut().in_expression_evaluation = true;
            }
            EvalEnd => {
                self.state.flows.current_mut().callstack.current_frame_mut().in_expression_evaluation = false;
            }
            EvalOutput => {
                if let Ok(value) = self.eval_stack_mut().pop() {
                    let text = value.to_output_string();
                    if !text.is_empty() {
                        self.state.flows.current_mut().output_stream.push_text(text);
                    }
                }
            }
            Duplicate => {
                let _ = self.eval_stack_mut().duplicate_top();
            }
            PopEvaluatedValue => {
                let _ = self.eval_stack_mut().pop();
            }
            PopFunction => return self.pop_frame(PushPopType::Function),
            PopTunnel => return self.pop_frame(PushPopType::Tunnel),
            BeginString => {
                self.state.flows.current_mut().output_stream.begin_string();
            }
            EndString => {
                let text = self.state.flows.current_mut().output_stream.end_string();
                self.eval_stack_mut().push(Value::String(StringValue::new(text)));
            }
            NoOp => {}
            ChoiceCount => {
                let count = self.state.flows.current().current_choices.len() as i32;
                self.eval_stack_mut().push(Value::Int(count));
            }
            TurnsSince => {
                if let Some(path) = self.pop_divert_target_path() {
                    let turn_index = self.state.visit_counts.turn_index(&path, self.state.variables.patch.as_ref());
                    let result = if turn_index < 0 { -1 } else { self.state.current_turn_index - turn_index };
                    self.eval_stack_mut().push(Value::Int(result));
                }
            }
            Visit => {
                if let Some(path) = self.pop_divert_target_path() {
                    let count = self.state.visit_counts.visits(&path, self.state.variables.patch.as_ref());
                    self.eval_stack_mut().push(Value::Int(count as i32));
                }
            }
            SequenceShuffleIndex => {
                if let Ok(Value::Int(len)) = self.eval_stack_mut().pop() {
                    let index = self.state.random().next_bounded(len.max(0) as usize);
                    self.eval_stack_mut().push(Value::Int(index as i32));
                }
            }
            StartThread => {
                self.state.flows.current_mut().callstack.fork_thread();
            }
            Done => {
                let flow = self.state.flows.current_mut();
                if flow.callstack.thread_count() > 1 {
                    flow.callstack.pop_thread();
                    return true;
                }
                self.state.did_safe_exit = true;
            }
            End => {
                self.state.did_safe_exit = true;
                self.set_current_pointer(Pointer::null());
                return true;
            }
            ListFromInt => {
                self.native_list_from_int();
            }
            ListRange => {
                self.native_list_range();
            }
            ListRandom => {
                self.native_list_random();
            }
            BeginTag => {
                self.state.flows.current_mut().output_stream.begin_tag();
            }
            EndTag => {
                self.state.flows.current_mut().output_stream.end_tag();
            }
        }
        false
    }

    fn pop_frame(&mut self, expected: PushPopType) -> bool {
        let flow = self.state.flows.current_mut();
        match flow.callstack.pop(expected) {
            Ok(popped) => {
                flow.callstack.set_current_pointer(popped.current_pointer);
                self.eval_stack.truncate_to(popped.evaluation_stack_height_on_entry);
                true
            }
            Err(message) => {
                self.state.record_runtime_error(RuntimeErrorKind::InvalidDivertTarget(message));
                false
            }
        }
    }

    fn pop_divert_target_path(&mut self) -> Option<Path> {
        match self.eval_stack_mut().pop() {
            Ok(Value::DivertTarget(path)) => Some(path),
            Ok(_) => {
                self.state.record_runtime_error(RuntimeErrorKind::TypeMismatch(
                    "expected a divert-target value".to_string(),
                ));
                None
            }
            Err(_) => None,
        }
    }

    fn native_list_from_int(&mut self) {
        let int_value = match self.eval_stack_mut().pop() {
            Ok(Value::Int(i)) => i,
            _ => return,
        };
        let origin_name = match self.eval_stack_mut().pop() {
            Ok(Value::String(s)) => s.string,
            _ => return,
        };
        let list = match self.graph.list_definitions.get(&origin_name) {
            Some(def) => match def.items.iter().find(|(_, v)| *v == int_value) {
                Some((name, value)) => InkList::single(InkListItem::new(origin_name, name.clone()), *value),
                None => InkList::new(),
            },
            None => InkList::new(),
        };
        self.eval_stack_mut().push(Value::List(list));
    }

    fn native_list_range(&mut self) {
        let upper = match self.eval_stack_mut().pop() {
            Ok(Value::List(list)) => list,
            _ => return,
        };
        let lower = match self.eval_stack_mut().pop() {
            Ok(Value::List(list)) => list,
            _ => return,
        };
        let min = lower.min_item().map(|(_, v)| v).unwrap_or(i32::MIN);
        let max = upper.max_item().map(|(_, v)| v).unwrap_or(i32::MAX);
        let origin_names = if !lower.origin_names.is_empty() { lower.origin_names } else { upper.origin_names };

        let mut items = std::collections::BTreeMap::new();
        for origin_name in &origin_names {
            if let Some(def) = self.graph.list_definitions.get(origin_name) {
                for (name, value) in &def.items {
                    if *value >= min && *value <= max {
                        items.insert(InkListItem::new(origin_name.clone(), name.clone()), *value);
                    }
                }
            }
        }
        self.eval_stack_mut().push(Value::List(InkList { items, origin_names }));
    }

    fn native_list_random(&mut self) {
        let list = match self.eval_stack_mut().pop() {
            Ok(Value::List(list)) => list,
            _ => return,
        };
        if list.is_empty() {
            self.eval_stack_mut().push(Value::List(list));
            return;
        }
        let index = self.state.random().next_bounded(list.items.len());
        let (item, value) = list.items.iter().nth(index).map(|(k, v)| (k.clone(), *v)).unwrap();
        self.eval_stack_mut().push(Value::List(InkList::single(item, value)));
    }

    fn dispatch_divert(&mut self, divert: &Divert, pointer: &Pointer) -> bool {
        if divert.is_conditional {
            let condition = match self.eval_stack_mut().pop() {
                Ok(v) => v,
                Err(_) => return false,
            };
            if !condition.is_truthy() {
                return false;
            }
        }

        let base_path = pointer.container.as_ref().map(|c| c.path()).unwrap_or_default();

        let target_path = match &divert.target {
            TargetType::Path(path) => path.resolve_against(&base_path),
            TargetType::VarName(name) => match self.lookup_variable(name) {
                Some(Value::DivertTarget(path)) => path,
                _ => {
                    self.state.record_runtime_error(RuntimeErrorKind::InvalidDivertTarget(name.clone()));
                    return false;
                }
            },
        };

        if divert.is_external {
            let args = self.eval_stack_mut().pop_n(divert.external_args).unwrap_or_default();
            let name = target_path.to_string();
            match self.external_functions.call(&name, &args, false) {
                Ok(result) => self.eval_stack_mut().push(result),
                Err(kind) => self.state.record_runtime_error(kind),
            }
            return false;
        }

        let target_object = self.graph.resolve_path(&target_path);
        let target_container = match target_object {
            Some(RuntimeObject::Container(c)) => c,
            Some(_) => {
                self.state.record_runtime_error(RuntimeErrorKind::InvalidDivertTarget(target_path.to_string()));
                return false;
            }
            None => {
                self.state.record_warning(WarningKind::PathApproximated(target_path.to_string()));
                return false;
            }
        };

        if divert.pushes_to_callstack {
            let frame_type = if divert.is_tunnel { PushPopType::Tunnel } else { PushPopType::Function };
            let return_pointer =
                next_content_pointer(pointer.container.clone(), pointer.index + 1).unwrap_or_else(Pointer::null);
            let eval_height = self.eval_stack.height();
            self.state.flows.current_mut().callstack.push(frame_type, return_pointer, eval_height);
        }

        let previous_path = self.state.previous_pointer.path();
        self.visit_changed_containers(previous_path.as_ref(), &target_container.path());
        self.state.previous_pointer = pointer.clone();
        self.set_current_pointer(Pointer::new(Some(target_container), -1));
        true
    }

    /// Backfills visit counts for ancestor containers a divert jumps
    /// straight into without passing through their container-entry step.
    fn visit_changed_containers(&mut self, previous_path: Option<&Path>, new_path: &Path) {
        let old_ancestors: Vec<Path> = previous_path.map(|p| p.ancestors()).unwrap_or_default();
        for ancestor in new_path.ancestors() {
            if old_ancestors.contains(&ancestor) {
                continue;
            }
            if let Some(RuntimeObject::Container(container)) = self.graph.resolve_path(&ancestor) {
                if container.visits_should_be_counted {
                    let increment = !container.count_at_start_only
                        || self.state.visit_counts.visits(&container.path(), self.state.variables.patch.as_ref()) == 0;
                    if increment {
                        self.state
                            .visit_counts
                            .increment_visit(&container.path(), self.state.variables.patch.as_mut());
                    }
                }
                if container.turn_index_should_be_counted {
                    let turn = self.state.current_turn_index;
                    self.state
                        .visit_counts
                        .record_turn_index(&container.path(), turn, self.state.variables.patch.as_mut());
                }
            }
        }
    }

    fn lookup_variable(&self, name: &str) -> Option<Value> {
        let flow = self.state.flows.current();
        if let Some(value) = flow.callstack.current_frame().temporary_variables.get(name) {
            return Some(value.clone());
        }
        if let Some(value) = self.state.variables.get(name) {
            return Some(value.clone());
        }
        self.list_definitions
            .find_single_item_list_with_name(name)
            .map(|(item, value)| Value::List(InkList::single(item, value)))
    }

    fn dispatch_variable_reference(&mut self, name: &str) {
        match self.lookup_variable(name) {
            Some(value) => self.eval_stack_mut().push(value),
            None => self.state.record_runtime_error(RuntimeErrorKind::UnresolvedVariable(name.to_string())),
        }
    }

    fn dispatch_variable_assignment(&mut self, assignment: &crate::runtime::variable::VariableAssignment) {
        let value = match self.eval_stack_mut().pop() {
            Ok(v) => v,
            Err(_) => return,
        };
        if assignment.is_global {
            if assignment.is_new_declaration
                && !assignment.is_reassignment
                && self.state.variables.get(&assignment.name).is_some()
            {
                self.state
                    .record_runtime_error(RuntimeErrorKind::DuplicateDeclaration(assignment.name.clone()));
                return;
            }
            self.state.variables.set(assignment.name.clone(), value);
        } else {
            self.state
                .flows
                .current_mut()
                .callstack
                .current_frame_mut()
                .temporary_variables
                .insert(assignment.name.clone(), value);
        }
    }

    fn dispatch_native_function(&mut self, native: crate::runtime::native_function_call::NativeFunctionCall) {
        let args = match self.eval_stack_mut().pop_n(native.arity()) {
            Ok(args) => args,
            Err(_) => return,
        };
        match native.call(args) {
            Ok(result) => self.eval_stack_mut().push(result),
            Err(kind) => {
                self.state.record_runtime_error(kind);
                self.eval_stack_mut().push(Value::Int(0));
            }
        }
    }

    fn dispatch_choice_point(&mut self, choice_point: &crate::runtime::choice_point::ChoicePoint, pointer: &Pointer) {
        let source_path = pointer.path().unwrap_or_default();

        if choice_point.once_only
            && self.state.visit_counts.visits(&source_path, self.state.variables.patch.as_ref()) > 0
        {
            return;
        }

        if choice_point.has_condition {
            let condition = match self.eval_stack_mut().pop() {
                Ok(v) => v,
                Err(_) => return,
            };
            if !condition.is_truthy() {
                return;
            }
        }

        let choice_text = self
            .state
            .flows
            .current()
            .output_stream
            .text_since(self.line_start_output_len);

        if choice_point.has_choice_only_content {
            self.state.flows.current_mut().output_stream.truncate(self.line_start_output_len);
        }

        let base_path = pointer.container.as_ref().map(|c| c.path()).unwrap_or_default();
        let target_path = choice_point.path_on_choice.resolve_against(&base_path);
        let thread = self.state.flows.current().callstack.active_thread().clone();

        let choice = Choice::new(choice_text, source_path, target_path, thread, choice_point.is_invisible_default);
        self.state.flows.current_mut().current_choices.push(choice);
    }

    /// Selects a generated choice, restoring the thread it was generated
    /// in and diverting to its target (§4.6).
    pub fn choose_choice(&mut self, index: usize) -> Result<(), SessionError> {
        let flow = self.state.flows.current_mut();
        if index >= flow.current_choices.len() {
            return Err(SessionError::OutOfRangeChoice { index, count: flow.current_choices.len() });
        }
        let choice = flow.current_choices.remove(index);
        flow.current_choices.clear();

        self.state.visit_counts.increment_visit(&choice.source_path, self.state.variables.patch.as_mut());

        let flow = self.state.flows.current_mut();
        flow.callstack.set_active_thread(choice.thread_at_generation);

        self.choose_path(choice.target_path)
    }

    /// Diverts directly to a path, discarding any in-flight tunnels
    /// (used for `choose_choice` and for jumping straight to a knot by
    /// name).
    pub fn choose_path(&mut self, path: Path) -> Result<(), SessionError> {
        match self.graph.resolve_path(&path) {
            Some(RuntimeObject::Container(container)) => {
                self.set_current_pointer(Pointer::new(Some(container), -1));
                Ok(())
            }
            _ => Err(SessionError::InvalidPath(path.to_string())),
        }
    }

    pub fn switch_flow(&mut self, name: impl Into<String>) -> Result<(), SessionError> {
        if self.state.is_background_saving() {
            return Err(SessionError::CannotSwitchFlowWhileSaving);
        }
        let root_pointer = Pointer::new(Some(self.graph.root_container.clone()), -1);
        self.state.flows.switch_to(name, root_pointer);
        Ok(())
    }

    pub fn remove_flow(&mut self, name: &str) -> Result<(), SessionError> {
        self.state.flows.remove(name).map_err(|_| SessionError::UnknownFlow(name.to_string()))
    }

    pub fn bind_external(&mut self, name: impl Into<String>, lookahead_safe: bool, function: ExternalFunction) {
        self.external_functions.bind(name, lookahead_safe, function);
    }

    pub fn unbind_external(&mut self, name: &str) {
        self.external_functions.unbind(name);
    }

    /// Evaluates a knot/stitch as a function call from outside normal
    /// story flow (§4.7): pushes a function frame, runs to completion,
    /// and returns the text produced plus any value left on the eval
    /// stack.
    pub fn evaluate_function(&mut self, path: Path, args: Vec<Value>) -> Result<(Option<Value>, String), SessionError> {
        let target = self.graph.resolve_path(&path);
        let container = match target {
            Some(RuntimeObject::Container(c)) => c,
            _ => return Err(SessionError::InvalidPath(path.to_string())),
        };

        for arg in args.into_iter().rev() {
            self.eval_stack.push(arg);
        }

        let return_pointer = Pointer::null();
        let eval_height = self.eval_stack.height();
        let output_start = self.state.flows.current().output_stream.len();
        self.state.flows.current_mut().callstack.push(PushPopType::Function, return_pointer, eval_height);
        self.state.flows.current_mut().callstack.current_frame_mut().function_start_in_output_stream = output_start;
        self.set_current_pointer(Pointer::new(Some(container), -1));

        while self.can_continue() {
            self.micro_step();
        }

        let produced_text = {
            let flow = self.state.flows.current_mut();
            let text = flow.output_stream.text_since(output_start);
            flow.output_stream.truncate(output_start);
            text
        };
        let result = self.eval_stack.pop().ok();

        Ok((result, produced_text))
    }

    pub fn reset_state(&mut self) {
        let root_pointer = Pointer::new(Some(self.graph.root_container.clone()), -1);
        self.state = StoryState::new(root_pointer, self.state.story_seed);
    }

    pub fn reset_callstack(&mut self) {
        let root_pointer = Pointer::new(Some(self.graph.root_container.clone()), -1);
        self.state.flows.current_mut().callstack = crate::callstack::CallStack::new(root_pointer);
    }

    pub fn begin_async_continue(&mut self) -> Result<(), SessionError> {
        if self.async_continue_active {
            return Err(SessionError::AsyncOperationInProgress);
        }
        self.async_continue_active = true;
        Ok(())
    }

    pub fn async_continue_complete(&mut self) {
        self.async_continue_active = false;
    }

    pub fn copy_state_for_background_save(&mut self) -> Result<StateSnapshot, SessionError> {
        if self.state.is_background_saving() {
            return Err(SessionError::SaveInProgress);
        }
        Ok(self.state.begin_background_save())
    }

    pub fn background_save_complete(&mut self) {
        self.state.complete_background_save();
    }

    pub fn discard_background_save(&mut self) {
        self.state.discard_background_save();
    }
}

enum StepOutcome {
    Continuing,
    EndOfFlow,
}

fn clone_list_defs(graph: &RuntimeGraph) -> std::collections::HashMap<String, crate::runtime_graph::ListDefinition> {
    graph
        .list_definitions
        .iter()
        .map(|(k, v)| (k.clone(), crate::runtime_graph::ListDefinition { items: v.items.clone() }))
        .collect()
}

/// The core pointer-advancement algorithm (§4.3 "NextContent"): walks
/// forward from `(container, index)`, climbing out to the parent's next
/// sibling position whenever `index` runs past the end of `container`'s
/// content, until it lands on a real index or runs off the root.
fn next_content_pointer(container: Option<Rc<crate::runtime::container::Container>>, index: i64) -> Option<Pointer> {
    let mut container = container?;
    let mut index = index;
    loop {
        if index >= 0 && (index as usize) < container.content.len() {
            return Some(Pointer::new(Some(container), index));
        }
        match container.parent() {
            Some(parent) => {
                let my_index = container.index_in_parent();
                index = match my_index {
                    Some(i) => i as i64 + 1,
                    None => parent.content.len() as i64,
                };
                container = parent;
            }
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::container::Container;
    use crate::runtime::value::StringValue;

    fn single_text_story(text: &str) -> Story {
        let mut root = Container::new();
        root.add_child(RuntimeObject::Value(Value::String(StringValue::new(text))));
        let root = Rc::new(root);
        Container::assign_paths(&root, Path::root());

        let graph = RuntimeGraph {
            ink_version: crate::config::CURRENT_INK_VERSION,
            root_container: root,
            list_definitions: Default::default(),
        };
        Story::new(graph)
    }

    #[test]
    fn continues_through_plain_text() {
        let mut story = single_text_story("Hello, world!\n");
        assert!(story.can_continue());
        story.continue_one_line().unwrap();
        assert_eq!(story.current_text(), "Hello, world!\n");
        assert!(!story.can_continue());
    }

    #[test]
    fn glue_suppresses_newline_across_lookahead() {
        let mut root = Container::new();
        root.add_child(RuntimeObject::Value(Value::String(StringValue::new("left\n"))));
        root.add_child(RuntimeObject::Glue(crate::runtime::glue::Glue));
        root.add_child(RuntimeObject::Value(Value::String(StringValue::new("right"))));
        let root = Rc::new(root);
        Container::assign_paths(&root, Path::root());

        let graph = RuntimeGraph {
            ink_version: crate::config::CURRENT_INK_VERSION,
            root_container: root,
            list_definitions: Default::default(),
        };
        let mut story = Story::new(graph);
        let text = story.continue_maximally().unwrap();
        assert_eq!(text, "leftright");
    }
}
