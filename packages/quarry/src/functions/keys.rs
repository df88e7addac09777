//! The opt-in `keys` filter function.

use std::borrow::Cow;

use serde_json::Value;

use super::{ExpressionType, ExpressionValue, FilterFunction};

/// The keys of a mapping as an array of strings, nothing for any other
/// type. Not registered by default; see
/// [`Environment::register_keys_function`](crate::env::Environment::register_keys_function).
pub struct Keys;

impl FilterFunction for Keys {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Value]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Value
    }

    fn call<'a>(&self, mut args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        match args.pop().as_ref().and_then(ExpressionValue::as_value) {
            Some(Value::Object(map)) => ExpressionValue::Value(Cow::Owned(Value::Array(
                map.keys().map(|k| Value::String(k.clone())).collect(),
            ))),
            _ => ExpressionValue::Nothing,
        }
    }
}
