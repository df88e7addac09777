//! Function extensions for filter expressions
//!
//! A function extension declares its argument and return types, an
//! implementation, and optionally a compile-time validator. The
//! environment owns a name-to-function registry; the standard functions
//! are registered by default and `keys` is opt-in.

mod count;
mod is_instance;
mod keys;
mod length;
mod regex_fns;
mod starts_with;
mod type_of;
mod value;

pub use count::Count;
pub use is_instance::IsInstance;
pub use keys::Keys;
pub use length::Length;
pub use regex_fns::{MatchFunction, SearchFunction};
pub use starts_with::StartsWith;
pub use type_of::TypeOf;
pub use value::ValueFunction;

use std::borrow::Cow;

use serde_json::Value;

use crate::error::JsonPathError;
use crate::filter::FilterExpression;
use crate::tokens::Token;

/// The declared type of a function argument or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionType {
    /// Any single JSON value, or nothing.
    Value,
    /// A logical (boolean) result.
    Logical,
    /// A node list.
    Nodes,
}

/// A value flowing through filter expression evaluation.
///
/// `Nothing` is the special missing value, distinct from JSON `null`.
/// Node lists carry the values of their nodes in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionValue<'a> {
    Nothing,
    Logical(bool),
    Value(Cow<'a, Value>),
    Nodes(Vec<Cow<'a, Value>>),
}

impl<'a> ExpressionValue<'a> {
    /// Truthiness for logical contexts: a node list is true when
    /// non-empty, a value is true by existence, `Nothing` is false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            ExpressionValue::Nothing => false,
            ExpressionValue::Logical(b) => *b,
            ExpressionValue::Value(_) => true,
            ExpressionValue::Nodes(nodes) => !nodes.is_empty(),
        }
    }

    /// Reduce to a single value for value-typed contexts: a singular
    /// node list unwraps to its sole value, an empty one to `Nothing`,
    /// and anything longer to an array of its values.
    #[must_use]
    pub fn into_value(self) -> ExpressionValue<'a> {
        match self {
            ExpressionValue::Nodes(mut nodes) => match nodes.len() {
                0 => ExpressionValue::Nothing,
                1 => ExpressionValue::Value(nodes.pop().unwrap_or(Cow::Owned(Value::Null))),
                _ => ExpressionValue::Value(Cow::Owned(Value::Array(
                    nodes.into_iter().map(Cow::into_owned).collect(),
                ))),
            },
            other => other,
        }
    }

    /// The underlying JSON value, if this is a single value.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ExpressionValue::Value(value) => Some(value.as_ref()),
            _ => None,
        }
    }
}

/// A named function callable from filter expressions.
pub trait FilterFunction: Send + Sync {
    /// Argument types expected by the function, in order.
    fn arg_types(&self) -> &[ExpressionType];

    /// The type of the value returned by the function.
    fn return_type(&self) -> ExpressionType;

    /// Apply the function. Arguments have already been coerced to the
    /// declared types; well-typed calls never fail, they return
    /// `Nothing` for out-of-domain inputs.
    fn call<'a>(&self, args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a>;

    /// Compile-time validation of a call site. The default checks
    /// arity against [`FilterFunction::arg_types`].
    fn validate(&self, args: &[FilterExpression], token: &Token) -> Result<(), JsonPathError> {
        let expected = self.arg_types().len();
        if args.len() != expected {
            return Err(JsonPathError::typ(
                format!(
                    "{}() requires {expected} argument{}, found {}",
                    token.text,
                    if expected == 1 { "" } else { "s" },
                    args.len()
                ),
                token.clone(),
            ));
        }
        Ok(())
    }
}

/// Coerce an evaluated argument to a declared parameter type.
pub(crate) fn coerce_arg<'a>(
    arg: ExpressionValue<'a>,
    declared: ExpressionType,
) -> ExpressionValue<'a> {
    match declared {
        ExpressionType::Nodes => arg,
        ExpressionType::Logical => ExpressionValue::Logical(arg.is_truthy()),
        ExpressionType::Value => match arg.into_value() {
            ExpressionValue::Logical(b) => ExpressionValue::Value(Cow::Owned(Value::Bool(b))),
            other => other,
        },
    }
}
