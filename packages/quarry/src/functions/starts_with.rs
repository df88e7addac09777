//! The `startswith` function extension.

use serde_json::Value;

use super::{ExpressionType, ExpressionValue, FilterFunction};

/// String prefix check; false when either argument is not a string.
pub struct StartsWith;

impl FilterFunction for StartsWith {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Value, ExpressionType::Value]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Logical
    }

    fn call<'a>(&self, args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        let result = match (
            args.first().and_then(ExpressionValue::as_value),
            args.get(1).and_then(ExpressionValue::as_value),
        ) {
            (Some(Value::String(value)), Some(Value::String(prefix))) => {
                value.starts_with(prefix.as_str())
            }
            _ => false,
        };
        ExpressionValue::Logical(result)
    }
}
