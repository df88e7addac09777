//! The standard `value` function extension.

use super::{ExpressionType, ExpressionValue, FilterFunction};

/// The sole value of a singular node list, nothing otherwise.
pub struct ValueFunction;

impl FilterFunction for ValueFunction {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Nodes]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Value
    }

    fn call<'a>(&self, mut args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        match args.pop() {
            Some(ExpressionValue::Nodes(mut nodes)) => {
                if nodes.len() == 1 {
                    match nodes.pop() {
                        Some(value) => ExpressionValue::Value(value),
                        None => ExpressionValue::Nothing,
                    }
                } else {
                    ExpressionValue::Nothing
                }
            }
            Some(value @ ExpressionValue::Value(_)) => value,
            _ => ExpressionValue::Nothing,
        }
    }
}
