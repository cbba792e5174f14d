use std::fmt;

use crate::ink_list::InkList;
use crate::path::Path;

/// A scalar or compound literal living on the evaluation stack or embedded
/// directly in the content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    String(StringValue),
    Bool(bool),
    DivertTarget(Path),
    VariablePointer(VariablePointerValue),
    List(InkList),
}

/// A string value. `is_newline`/`is_inline_whitespace` classify glue-adjacent
/// whitespace-only strings so the output stream can special-case them during
/// trimming without re-parsing the text every time (see `output_stream.rs`).
#[derive(Debug, Clone, PartialEq)]
pub struct StringValue {
    pub string: String,
    pub is_newline: bool,
    pub is_inline_whitespace: bool,
}

impl StringValue {
    pub fn new(string: impl Into<String>) -> Self {
        let string = string.into();
        let is_newline = string == "\n";
        let is_inline_whitespace =
            !string.is_empty() && string.chars().all(|c| c == ' ' || c == '\t');
        StringValue {
            string,
            is_newline,
            is_inline_whitespace,
        }
    }

    pub fn is_whitespace_only(&self) -> bool {
        self.is_newline || self.is_inline_whitespace
    }
}

/// A variable-pointer value: a by-reference handle to a named variable,
/// optionally resolved to a specific callstack depth (`context_index`,
/// `-1` meaning "resolve dynamically at point of use").
#[derive(Debug, Clone, PartialEq)]
pub struct VariablePointerValue {
    pub variable_name: String,
    pub context_index: i32,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::DivertTarget(_) => "divert target",
            Value::VariablePointer(_) => "variable pointer",
            Value::List(_) => "list",
        }
    }

    /// Truthiness used by conditional diverts and `&&`/`||`/`!`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::String(s) => !s.string.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::DivertTarget(_) | Value::VariablePointer(_) => true,
        }
    }

    /// String conversion used when a value is pushed to the output stream
    /// via `evalOutput`, and by string concatenation.
    pub fn to_output_string(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.string.clone(),
            Value::Bool(b) => b.to_string(),
            Value::DivertTarget(path) => path.to_string(),
            Value::VariablePointer(v) => v.variable_name.clone(),
            Value::List(l) => l.to_string(),
        }
    }
}

fn format_float(f: f32) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_output_string())
    }
}
