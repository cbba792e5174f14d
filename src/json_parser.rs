//! Materializes `RuntimeObject`s out of a compiled document's tagged-JSON
//! encoding: the envelope (`inkVersion`/`root`/`listDefs`) plus one
//! concrete, internally-consistent reading of the object tagging scheme,
//! which is the part of document emission this crate actually needs in
//! order to have a tree to execute.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value as Json;

use crate::ink_list::{InkList, InkListItem};
use crate::path::Path;
use crate::runtime::choice_point::ChoicePoint;
use crate::runtime::container::Container;
use crate::runtime::control_command::ControlCommand;
use crate::runtime::divert::{Divert, TargetType};
use crate::runtime::glue::Glue;
use crate::runtime::native_function_call::NativeFunctionCall;
use crate::runtime::tag::Tag;
use crate::runtime::value::{StringValue, Value, VariablePointerValue};
use crate::runtime::variable::{ReadCount, VariableAssignment, VariableReference};
use crate::runtime::RuntimeObject;

pub fn runtime_object_from_json(value: Json) -> Result<RuntimeObject, String> {
    match value {
        Json::Null => Ok(RuntimeObject::Null),
        Json::Bool(b) => Ok(RuntimeObject::Value(Value::Bool(b))),
        Json::Number(n) => Ok(RuntimeObject::Value(number_to_value(&n))),
        Json::String(s) => string_to_object(&s),
        Json::Array(_) => {
            let container: Container =
                Deserialize::deserialize(value).map_err(|e| e.to_string())?;
            Ok(RuntimeObject::Container(Rc::new(container)))
        }
        Json::Object(map) => object_to_runtime_object(map),
    }
}

fn number_to_value(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i as i32)
    } else {
        Value::Float(n.as_f64().unwrap_or(0.0) as f32)
    }
}

fn string_to_object(s: &str) -> Result<RuntimeObject, String> {
    if let Some(literal) = s.strip_prefix('^') {
        return Ok(RuntimeObject::Value(Value::String(StringValue::new(
            literal,
        ))));
    }
    if s == "\n" {
        return Ok(RuntimeObject::Value(Value::String(StringValue::new("\n"))));
    }
    if s == "<>" {
        return Ok(RuntimeObject::Glue(Glue));
    }
    if let Some(command) = ControlCommand::from_code(s) {
        return Ok(RuntimeObject::ControlCommand(command));
    }
    if let Some(target) = s.strip_prefix("->") {
        return Ok(RuntimeObject::Value(Value::DivertTarget(
            Path::from_str(target).ok_or_else(|| format!("bad divert target path '{target}'"))?,
        )));
    }

    Err(format!("unrecognized string-encoded runtime object '{s}'"))
}

fn object_to_runtime_object(
    mut map: serde_json::Map<String, Json>,
) -> Result<RuntimeObject, String> {
    if let Some(target) = map.remove("->") {
        return parse_divert(target, &mut map);
    }
    if let Some(Json::String(name)) = map.remove("VAR?") {
        return Ok(RuntimeObject::VariableReference(VariableReference::new(
            name,
        )));
    }
    if let Some(Json::String(target)) = map.remove("CNT?") {
        let path =
            Path::from_str(&target).ok_or_else(|| format!("bad read-count path '{target}'"))?;
        return Ok(RuntimeObject::ReadCount(ReadCount::new(path)));
    }
    if let Some(Json::String(name)) = map.remove("VAR=") {
        let reassignment = map
            .remove("re")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        return Ok(RuntimeObject::VariableAssignment(
            VariableAssignment::new(name, true, !reassignment),
        ));
    }
    if let Some(Json::String(name)) = map.remove("temp=") {
        return Ok(RuntimeObject::VariableAssignment(
            VariableAssignment::new(name, false, true),
        ));
    }
    if let Some(Json::String(text)) = map.remove("#") {
        return Ok(RuntimeObject::Tag(Tag::new(text)));
    }
    if let Some(Json::String(target)) = map.remove("*") {
        let path = Path::from_str(&target).ok_or_else(|| format!("bad choice path '{target}'"))?;
        let flags = map.remove("flg").and_then(|v| v.as_u64()).unwrap_or(0) as u8;
        return Ok(RuntimeObject::Choice(ChoicePoint::new(path, flags)));
    }
    if let Some(Json::String(item_name)) = map.remove("list") {
        return parse_list_literal(item_name, &mut map);
    }

    for (key, value) in map.iter() {
        if let Some(native) = native_function_from_symbol(key) {
            let _ = value;
            return Ok(RuntimeObject::NativeFunctionCall(native));
        }
    }

    Err("unrecognized object-encoded runtime object".to_string())
}

fn parse_divert(
    target: Json,
    map: &mut serde_json::Map<String, Json>,
) -> Result<RuntimeObject, String> {
    let is_var = map.remove("var").and_then(|v| v.as_bool()).unwrap_or(false);
    let target_type = match target {
        Json::String(ref path_string) if is_var => TargetType::VarName(path_string.clone()),
        Json::String(ref path_string) => TargetType::Path(
            Path::from_str(path_string).ok_or_else(|| format!("bad divert path '{path_string}'"))?,
        ),
        other => return Err(format!("divert target must be a string, found {other}")),
    };

    let mut divert = Divert::new(target_type);
    divert.is_conditional = map.remove("c").and_then(|v| v.as_bool()).unwrap_or(false);
    divert.is_tunnel = map.remove("tun").and_then(|v| v.as_bool()).unwrap_or(false);
    divert.is_function = map.remove("f").and_then(|v| v.as_bool()).unwrap_or(false);
    divert.is_external = map.remove("x").and_then(|v| v.as_bool()).unwrap_or(false);
    divert.pushes_to_callstack = divert.is_tunnel || divert.is_function;
    if let Some(args) = map.remove("exArgs").and_then(|v| v.as_u64()) {
        divert.external_args = args as usize;
    }

    Ok(RuntimeObject::Divert(divert))
}

fn parse_list_literal(
    origin_name: String,
    map: &mut serde_json::Map<String, Json>,
) -> Result<RuntimeObject, String> {
    // `{"list": {"Origin.item": value, ...}, "origins": [...]}`.
    let mut list = InkList::new();
    if let Some(Json::Object(items)) = map.remove("items") {
        for (key, value) in items {
            let (origin, item_name) = key
                .split_once('.')
                .unwrap_or((origin_name.as_str(), key.as_str()));
            let value = value.as_i64().unwrap_or(0) as i32;
            list.items
                .insert(InkListItem::new(origin, item_name), value);
        }
    }
    if let Some(Json::Array(origins)) = map.remove("origins") {
        for origin in origins {
            if let Json::String(name) = origin {
                if !list.origin_names.contains(&name) {
                    list.origin_names.push(name);
                }
            }
        }
    }
    Ok(RuntimeObject::Value(Value::List(list)))
}

fn native_function_from_symbol(symbol: &str) -> Option<NativeFunctionCall> {
    use NativeFunctionCall::*;
    Some(match symbol {
        "+" => Add,
        "-" => Subtract,
        "*" => Multiply,
        "/" => Divide,
        "%" => Mod,
        "_" => Negate,
        "==" => Equal,
        ">" => Greater,
        "<" => Less,
        ">=" => GreaterOrEqual,
        "<=" => LessOrEqual,
        "!=" => NotEqual,
        "!" => Not,
        "&&" => And,
        "||" => Or,
        "MIN" => Min,
        "MAX" => Max,
        "POW" => Pow,
        "FLOOR" => Floor,
        "CEILING" => Ceiling,
        "INT" => Int,
        "FLOAT" => Float,
        "?" => Has,
        "!?" => HasNot,
        "^" => Intersection,
        _ => return None,
    })
}

/// Parses a variable-pointer value, used where the loader encodes a
/// by-reference argument (`{"^var": name, "ci": index}`).
pub fn parse_variable_pointer(map: &serde_json::Map<String, Json>) -> Option<VariablePointerValue> {
    let name = map.get("^var")?.as_str()?.to_string();
    let context_index = map.get("ci").and_then(|v| v.as_i64()).unwrap_or(-1) as i32;
    Some(VariablePointerValue {
        variable_name: name,
        context_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_string() {
        let object = runtime_object_from_json(Json::String("^Hello".into())).unwrap();
        assert_eq!(
            object,
            RuntimeObject::Value(Value::String(StringValue::new("Hello")))
        );
    }

    #[test]
    fn parses_control_command() {
        let object = runtime_object_from_json(Json::String("ev".into())).unwrap();
        assert_eq!(
            object,
            RuntimeObject::ControlCommand(ControlCommand::EvalStart)
        );
    }

    #[test]
    fn parses_glue() {
        let object = runtime_object_from_json(Json::String("<>".into())).unwrap();
        assert_eq!(object, RuntimeObject::Glue(Glue));
    }

    #[test]
    fn parses_divert_target_value() {
        let object = runtime_object_from_json(Json::String("->a.b".into())).unwrap();
        assert_eq!(
            object,
            RuntimeObject::Value(Value::DivertTarget(Path::from_str("a.b").unwrap()))
        );
    }

    #[test]
    fn parses_divert_object() {
        let json = serde_json::json!({"->": "knot", "f": true});
        let object = runtime_object_from_json(json).unwrap();
        match object {
            RuntimeObject::Divert(d) => {
                assert!(d.is_function);
                assert!(d.pushes_to_callstack);
            }
            other => panic!("expected divert, got {other:?}"),
        }
    }

    #[test]
    fn parses_native_function() {
        let json = serde_json::json!({"+": 0});
        let object = runtime_object_from_json(json).unwrap();
        assert_eq!(
            object,
            RuntimeObject::NativeFunctionCall(NativeFunctionCall::Add)
        );
    }
}
