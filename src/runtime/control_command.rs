use std::fmt;

/// A fixed-effect flow-control instruction (§4.2). Every variant here has a
/// single, context-independent effect on the engine's stacks/streams; the
/// dispatch table that interprets them lives in `story.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Begin logical evaluation mode. In evaluation mode, objects that are
    /// encountered are added to an evaluation stack, rather than simply
    /// echoed into the main text output stream.
    EvalStart,

    /// The topmost object on the evaluation stack is popped and appended
    /// to the output stream, if it is non-empty after string conversion.
    EvalOutput,

    /// End logical evaluation mode.
    EvalEnd,

    /// Duplicate the topmost object on the evaluation stack.
    Duplicate,

    /// Pop a value from the evaluation stack, without appending to the
    /// output stream.
    PopEvaluatedValue,

    /// Pop a `function`-type callstack frame (`~ return`). Specified
    /// separately from `PopTunnel` so the callstack can error if the frame
    /// it's about to pop was pushed as the other kind.
    PopFunction,

    /// Pop a `tunnel`-type callstack frame (`->->`).
    PopTunnel,

    /// Begin string-building mode: subsequent output-stream entries are
    /// collected rather than emitted, until the matching `EndString`.
    BeginString,

    /// Collect all output-stream entries back to the matching
    /// `BeginString` into a single string value, pushed to the evaluation
    /// stack. Re-enters evaluation mode afterwards.
    EndString,

    /// No-operation; addressable content to divert to.
    NoOp,

    /// Push an integer with the current number of generated choices.
    ChoiceCount,

    /// Pop a divert-target value; push the number of turns since that
    /// target was last visited.
    TurnsSince,

    /// Pop a divert-target value; push the target container's visit count
    /// (patch-aware).
    Visit,

    /// Pop an integer (sequence length); push the next shuffle index for
    /// the sequence being entered, derived from the story's random seed.
    SequenceShuffleIndex,

    /// Fork the active thread.
    StartThread,

    /// Close the active thread, or mark the flow safe to exit if none
    /// remain.
    Done,

    /// End the story flow immediately.
    End,

    /// Pop an integer and a list-definition origin name; push the list
    /// value for the item with that integer's value in that origin.
    ListFromInt,

    /// Pop two list values; push the list of items in the inclusive
    /// numeric range between their min/max values.
    ListRange,

    /// Pop a list value; push a list containing one randomly-chosen item
    /// from it.
    ListRandom,

    /// Begin a tag region.
    BeginTag,

    /// Collect all output-stream entries back to the matching `BeginTag`
    /// into a tag entry.
    EndTag,
}

impl ControlCommand {
    pub fn from_code(code: &str) -> Option<ControlCommand> {
        use ControlCommand::*;
        Some(match code {
            "ev" => EvalStart,
            "out" => EvalOutput,
            "/ev" => EvalEnd,
            "du" => Duplicate,
            "pop" => PopEvaluatedValue,
            "~ret" => PopFunction,
            "->->" => PopTunnel,
            "str" => BeginString,
            "/str" => EndString,
            "nop" => NoOp,
            "choiceCnt" => ChoiceCount,
            "turns" => TurnsSince,
            "visit" => Visit,
            "seq" => SequenceShuffleIndex,
            "thread" => StartThread,
            "done" => Done,
            "end" => End,
            "listInt" => ListFromInt,
            "range" => ListRange,
            "lrnd" => ListRandom,
            "tag" => BeginTag,
            "/tag" => EndTag,
            _ => return None,
        })
    }

    pub fn code(self) -> &'static str {
        use ControlCommand::*;
        match self {
            EvalStart => "ev",
            EvalOutput => "out",
            EvalEnd => "/ev",
            Duplicate => "du",
            PopEvaluatedValue => "pop",
            PopFunction => "~ret",
            PopTunnel => "->->",
            BeginString => "str",
            EndString => "/str",
            NoOp => "nop",
            ChoiceCount => "choiceCnt",
            TurnsSince => "turns",
            Visit => "visit",
            SequenceShuffleIndex => "seq",
            StartThread => "thread",
            Done => "done",
            End => "end",
            ListFromInt => "listInt",
            ListRange => "range",
            ListRandom => "lrnd",
            BeginTag => "tag",
            EndTag => "/tag",
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_code() {
        let commands = [
            ControlCommand::EvalStart,
            ControlCommand::EvalOutput,
            ControlCommand::EvalEnd,
            ControlCommand::Duplicate,
            ControlCommand::PopEvaluatedValue,
            ControlCommand::PopFunction,
            ControlCommand::PopTunnel,
            ControlCommand::BeginString,
            ControlCommand::EndString,
            ControlCommand::NoOp,
            ControlCommand::ChoiceCount,
            ControlCommand::TurnsSince,
            ControlCommand::Visit,
            ControlCommand::SequenceShuffleIndex,
            ControlCommand::StartThread,
            ControlCommand::Done,
            ControlCommand::End,
            ControlCommand::ListFromInt,
            ControlCommand::ListRange,
            ControlCommand::ListRandom,
            ControlCommand::BeginTag,
            ControlCommand::EndTag,
        ];

        for command in commands {
            assert_eq!(ControlCommand::from_code(command.code()), Some(command));
        }
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(ControlCommand::from_code("nonsense"), None);
    }
}
