pub mod choice_point;
pub mod container;
pub mod control_command;
pub mod divert;
pub mod glue;
pub mod native_function_call;
pub mod tag;
pub mod value;
pub mod variable;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer};

use crate::runtime::choice_point::ChoicePoint;
use crate::runtime::container::Container;
use crate::runtime::control_command::ControlCommand;
use crate::runtime::divert::Divert;
use crate::runtime::glue::Glue;
use crate::runtime::native_function_call::NativeFunctionCall;
use crate::runtime::tag::Tag;
use crate::runtime::value::Value;
use crate::runtime::variable::{ReadCount, VariableAssignment, VariableReference};

/// The closed set of object kinds that can appear in the content tree
/// (§3 Data Model). Container-membership (parent link, position) is a
/// uniform adornment tracked on `Container` itself rather than by
/// inheritance — see `container.rs::assign_paths`.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeObject {
    Choice(ChoicePoint),
    Container(Rc<Container>),
    ControlCommand(ControlCommand),
    Divert(Divert),
    Glue(Glue),
    NativeFunctionCall(NativeFunctionCall),
    Tag(Tag),
    Value(Value),
    VariableAssignment(VariableAssignment),
    VariableReference(VariableReference),
    ReadCount(ReadCount),
    Void,
    Null,
}

impl fmt::Display for RuntimeObject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeObject::ControlCommand(control_command) => write!(f, "{control_command}"),
            RuntimeObject::Divert(divert) => write!(f, "{divert}"),
            RuntimeObject::Value(value) => write!(f, "{value}"),
            RuntimeObject::Tag(tag) => write!(f, "#{}", tag.text),
            RuntimeObject::Glue(_) => write!(f, "<>"),
            RuntimeObject::Void => write!(f, "void"),
            RuntimeObject::Null => write!(f, "null"),
            RuntimeObject::Container(container) => write!(f, "Container({})", container.path()),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl RuntimeObject {
    variant_accessors!(RuntimeObject::Container(Rc<Container>) => as_container, is_container);
    variant_accessors!(RuntimeObject::Value(Value) => as_value, is_value);
    variant_accessors!(RuntimeObject::Divert(Divert) => as_divert, is_divert);
    variant_accessors!(RuntimeObject::ControlCommand(ControlCommand) => as_control_command, is_control_command);
    variant_accessors!(RuntimeObject::Choice(ChoicePoint) => as_choice_point, is_choice_point);
    variant_accessors!(RuntimeObject::VariableReference(VariableReference) => as_variable_reference, is_variable_reference);
    variant_accessors!(RuntimeObject::VariableAssignment(VariableAssignment) => as_variable_assignment, is_variable_assignment);
    variant_accessors!(RuntimeObject::NativeFunctionCall(NativeFunctionCall) => as_native_function_call, is_native_function_call);
    variant_accessors!(RuntimeObject::ReadCount(ReadCount) => as_read_count, is_read_count);

    pub fn name(&self) -> Option<&str> {
        match self {
            RuntimeObject::Container(container) => container.name.as_deref(),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for RuntimeObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        crate::json_parser::runtime_object_from_json(value).map_err(serde::de::Error::custom)
    }
}
