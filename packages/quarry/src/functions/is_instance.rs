//! A non-standard `isinstance` filter function.

use serde_json::Value;

use super::{ExpressionType, ExpressionValue, FilterFunction};

/// Type predicate over a node list, with aliases for each type name.
pub struct IsInstance;

fn matches_type(value: &Value, t: &str) -> bool {
    match value {
        Value::Null => matches!(t, "null" | "nil" | "none" | "None"),
        Value::String(_) => matches!(t, "str" | "string"),
        Value::Array(_) => matches!(t, "array" | "list" | "sequence" | "tuple"),
        Value::Object(_) => matches!(t, "object" | "dict" | "mapping"),
        Value::Bool(_) => matches!(t, "bool" | "boolean"),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                matches!(t, "number" | "int")
            } else {
                matches!(t, "number" | "float")
            }
        }
    }
}

impl FilterFunction for IsInstance {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Nodes, ExpressionType::Value]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Logical
    }

    fn call<'a>(&self, args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        let mut args = args.into_iter();
        let subject = args.next();
        let t = match args.next().as_ref().and_then(ExpressionValue::as_value) {
            Some(Value::String(t)) => t.clone(),
            _ => return ExpressionValue::Logical(false),
        };

        let result = match subject {
            Some(ExpressionValue::Nodes(nodes)) => match nodes.as_slice() {
                [] => matches!(t.as_str(), "undefined" | "missing"),
                [sole] => matches_type(sole.as_ref(), &t),
                _ => matches!(t.as_str(), "array" | "list" | "sequence" | "tuple"),
            },
            Some(ExpressionValue::Value(value)) => matches_type(value.as_ref(), &t),
            _ => matches!(t.as_str(), "undefined" | "missing"),
        };
        ExpressionValue::Logical(result)
    }
}
