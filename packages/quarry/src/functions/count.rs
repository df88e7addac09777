//! The standard `count` function extension.

use std::borrow::Cow;

use serde_json::Value;

use super::{ExpressionType, ExpressionValue, FilterFunction};

/// Cardinality of a node list.
pub struct Count;

impl FilterFunction for Count {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Nodes]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Value
    }

    fn call<'a>(&self, mut args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        match args.pop() {
            Some(ExpressionValue::Nodes(nodes)) => {
                ExpressionValue::Value(Cow::Owned(Value::from(nodes.len() as u64)))
            }
            // A single value counts as a one-node list.
            Some(ExpressionValue::Value(_)) => {
                ExpressionValue::Value(Cow::Owned(Value::from(1u64)))
            }
            _ => ExpressionValue::Nothing,
        }
    }
}
