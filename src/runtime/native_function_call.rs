use std::fmt;

use crate::error::RuntimeErrorKind;
use crate::runtime::value::{StringValue, Value};

/// A built-in operator or function invoked by popping its declared number
/// of arguments off the evaluation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFunctionCall {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Negate,
    Equal,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    NotEqual,
    Not,
    And,
    Or,
    Min,
    Max,
    Pow,
    Floor,
    Ceiling,
    Int,
    Float,
    Has,
    HasNot,
    Intersection,
}

impl NativeFunctionCall {
    /// Number of operands this function pops from the evaluation stack.
    pub fn arity(self) -> usize {
        use NativeFunctionCall::*;
        match self {
            Negate | Not | Floor | Ceiling | Int | Float => 1,
            _ => 2,
        }
    }

    pub fn call(self, mut args: Vec<Value>) -> Result<Value, RuntimeErrorKind> {
        use NativeFunctionCall::*;

        if args.len() != self.arity() {
            return Err(RuntimeErrorKind::TypeMismatch(format!(
                "{self} expects {} argument(s), got {}",
                self.arity(),
                args.len()
            )));
        }

        if self.arity() == 1 {
            let a = args.remove(0);
            return self.call_unary(a);
        }

        let b = args.remove(1);
        let a = args.remove(0);
        self.call_binary(a, b)
    }

    fn call_unary(self, a: Value) -> Result<Value, RuntimeErrorKind> {
        use NativeFunctionCall::*;
        match (self, &a) {
            (Negate, Value::Int(i)) => Ok(Value::Int(-i)),
            (Negate, Value::Float(f)) => Ok(Value::Float(-f)),
            (Not, other) => Ok(Value::Int(if other.is_truthy() { 0 } else { 1 })),
            (Floor, Value::Float(f)) => Ok(Value::Float(f.floor())),
            (Floor, Value::Int(i)) => Ok(Value::Int(*i)),
            (Ceiling, Value::Float(f)) => Ok(Value::Float(f.ceil())),
            (Ceiling, Value::Int(i)) => Ok(Value::Int(*i)),
            (Int, Value::Float(f)) => Ok(Value::Int(*f as i32)),
            (Int, Value::Int(i)) => Ok(Value::Int(*i)),
            (Float, Value::Int(i)) => Ok(Value::Float(*i as f32)),
            (Float, Value::Float(f)) => Ok(Value::Float(*f)),
            _ => Err(RuntimeErrorKind::TypeMismatch(format!(
                "{self} cannot apply to a {}",
                a.type_name()
            ))),
        }
    }

    fn call_binary(self, a: Value, b: Value) -> Result<Value, RuntimeErrorKind> {
        use NativeFunctionCall::*;

        match self {
            Has => return Ok(Value::Int(bool_int(list_has(&a, &b)?))),
            HasNot => return Ok(Value::Int(bool_int(!list_has(&a, &b)?))),
            Intersection => return list_intersect(&a, &b),
            _ => {}
        }

        if let (Value::String(sa), Value::String(sb)) = (&a, &b) {
            return self.call_string(sa, sb);
        }

        if let (Value::List(la), Value::List(lb)) = (&a, &b) {
            return self.call_list(la, lb);
        }

        let (fa, fb) = (numeric(&a)?, numeric(&b)?);
        let both_int = matches!(a, Value::Int(_)) && matches!(b, Value::Int(_));

        let result = match self {
            Add => fa + fb,
            Subtract => fa - fb,
            Multiply => fa * fb,
            Divide => {
                if both_int {
                    return int_divide(self, &a, &b);
                }
                fa / fb
            }
            Mod => {
                if both_int {
                    return int_divide(self, &a, &b);
                }
                fa % fb
            }
            Equal => return Ok(Value::Int(bool_int(fa == fb))),
            Greater => return Ok(Value::Int(bool_int(fa > fb))),
            Less => return Ok(Value::Int(bool_int(fa < fb))),
            GreaterOrEqual => return Ok(Value::Int(bool_int(fa >= fb))),
            LessOrEqual => return Ok(Value::Int(bool_int(fa <= fb))),
            NotEqual => return Ok(Value::Int(bool_int(fa != fb))),
            And => return Ok(Value::Int(bool_int(a.is_truthy() && b.is_truthy()))),
            Or => return Ok(Value::Int(bool_int(a.is_truthy() || b.is_truthy()))),
            Min => fa.min(fb),
            Max => fa.max(fb),
            Pow => fa.powf(fb),
            _ => unreachable!("unary/list-only function reached binary numeric path"),
        };

        if both_int {
            Ok(Value::Int(result as i32))
        } else {
            Ok(Value::Float(result))
        }
    }

    fn call_string(self, a: &StringValue, b: &StringValue) -> Result<Value, RuntimeErrorKind> {
        use NativeFunctionCall::*;
        match self {
            Add => Ok(Value::String(StringValue::new(format!(
                "{}{}",
                a.string, b.string
            )))),
            Equal => Ok(Value::Int(bool_int(a.string == b.string))),
            NotEqual => Ok(Value::Int(bool_int(a.string != b.string))),
            Has => Ok(Value::Int(bool_int(a.string.contains(&b.string)))),
            HasNot => Ok(Value::Int(bool_int(!a.string.contains(&b.string)))),
            other => Err(RuntimeErrorKind::TypeMismatch(format!(
                "{other} is not defined for strings"
            ))),
        }
    }

    fn call_list(
        self,
        a: &crate::ink_list::InkList,
        b: &crate::ink_list::InkList,
    ) -> Result<Value, RuntimeErrorKind> {
        use NativeFunctionCall::*;
        match self {
            Add => Ok(Value::List(a.union(b))),
            Subtract => Ok(Value::List(a.without(b))),
            Equal => Ok(Value::Int(bool_int(a == b))),
            NotEqual => Ok(Value::Int(bool_int(a != b))),
            Greater => Ok(Value::Int(bool_int(
                a.max_item().map(|(_, v)| v) > b.max_item().map(|(_, v)| v),
            ))),
            Less => Ok(Value::Int(bool_int(
                a.max_item().map(|(_, v)| v) < b.max_item().map(|(_, v)| v),
            ))),
            other => Err(RuntimeErrorKind::TypeMismatch(format!(
                "{other} is not defined for lists"
            ))),
        }
    }
}

fn list_has(a: &Value, b: &Value) -> Result<bool, RuntimeErrorKind> {
    match (a, b) {
        (Value::List(la), Value::List(lb)) => Ok(la.has(lb)),
        (Value::String(sa), Value::String(sb)) => Ok(sa.string.contains(&sb.string)),
        _ => Err(RuntimeErrorKind::TypeMismatch(
            "has/hasnt requires two lists or two strings".into(),
        )),
    }
}

fn list_intersect(a: &Value, b: &Value) -> Result<Value, RuntimeErrorKind> {
    match (a, b) {
        (Value::List(la), Value::List(lb)) => Ok(Value::List(la.intersect(lb))),
        _ => Err(RuntimeErrorKind::TypeMismatch(
            "intersection requires two lists".into(),
        )),
    }
}

fn int_divide(op: NativeFunctionCall, a: &Value, b: &Value) -> Result<Value, RuntimeErrorKind> {
    let (ia, ib) = match (a, b) {
        (Value::Int(ia), Value::Int(ib)) => (*ia, *ib),
        _ => unreachable!("int_divide called with non-int operands"),
    };
    if ib == 0 {
        return Err(RuntimeErrorKind::TypeMismatch("division by zero".into()));
    }
    match op {
        NativeFunctionCall::Divide => Ok(Value::Int(ia / ib)),
        NativeFunctionCall::Mod => Ok(Value::Int(ia % ib)),
        _ => unreachable!(),
    }
}

fn numeric(value: &Value) -> Result<f64, RuntimeErrorKind> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f as f64),
        _ => Err(RuntimeErrorKind::TypeMismatch(format!(
            "expected a number, found a {}",
            value.type_name()
        ))),
    }
}

fn bool_int(b: bool) -> i32 {
    if b {
        1
    } else {
        0
    }
}

impl fmt::Display for NativeFunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use NativeFunctionCall::*;
        let symbol = match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Mod => "%",
            Negate => "_",
            Equal => "==",
            Greater => ">",
            Less => "<",
            GreaterOrEqual => ">=",
            LessOrEqual => "<=",
            NotEqual => "!=",
            Not => "!",
            And => "&&",
            Or => "||",
            Min => "MIN",
            Max => "MAX",
            Pow => "POW",
            Floor => "FLOOR",
            Ceiling => "CEILING",
            Int => "INT",
            Float => "FLOAT",
            Has => "?",
            HasNot => "!?",
            Intersection => "^",
        };
        write!(f, "{symbol}")
    }
}
