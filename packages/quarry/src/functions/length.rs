//! The standard `length` function extension.

use std::borrow::Cow;

use serde_json::Value;

use super::{ExpressionType, ExpressionValue, FilterFunction};

/// Count of mapping members, sequence elements or string code points.
/// Anything else has no length and yields nothing.
pub struct Length;

impl FilterFunction for Length {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Value]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Value
    }

    fn call<'a>(&self, mut args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        let Some(arg) = args.pop() else {
            return ExpressionValue::Nothing;
        };
        let length = match arg.as_value() {
            Some(Value::String(s)) => s.chars().count(),
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(map)) => map.len(),
            _ => return ExpressionValue::Nothing,
        };
        ExpressionValue::Value(Cow::Owned(Value::from(length as u64)))
    }
}
