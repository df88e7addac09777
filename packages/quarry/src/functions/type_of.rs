//! A non-standard `typeof` filter function.

use std::borrow::Cow;

use serde_json::Value;

use super::{ExpressionType, ExpressionValue, FilterFunction};

/// The JSON type name of a node list's value, using JavaScript-like
/// terminology.
pub struct TypeOf {
    /// When true, ints and floats both report as "number"; otherwise
    /// "int" and "float" respectively.
    pub single_number_type: bool,
}

impl Default for TypeOf {
    fn default() -> Self {
        Self {
            single_number_type: true,
        }
    }
}

impl TypeOf {
    fn type_name(&self, value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(n) => {
                if self.single_number_type {
                    "number"
                } else if n.is_i64() || n.is_u64() {
                    "int"
                } else {
                    "float"
                }
            }
        }
    }
}

impl FilterFunction for TypeOf {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Nodes]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Value
    }

    fn call<'a>(&self, mut args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        let name = match args.pop() {
            Some(ExpressionValue::Nodes(nodes)) => match nodes.as_slice() {
                [] => "undefined",
                [sole] => self.type_name(sole.as_ref()),
                _ => "array",
            },
            Some(ExpressionValue::Value(value)) => self.type_name(value.as_ref()),
            _ => "undefined",
        };
        ExpressionValue::Value(Cow::Owned(Value::String(name.to_string())))
    }
}
