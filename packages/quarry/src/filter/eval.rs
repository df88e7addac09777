//! Filter expression evaluation
//!
//! Evaluates a filter expression tree against a current node, the
//! evaluation root, and optional extra context data. Evaluation is
//! total: type mismatches reduce to `false` or `Nothing`, never to an
//! error. Root- and context-rooted sub queries are memoized per
//! top-level evaluation when filter caching is enabled.

use std::borrow::Cow;

use serde_json::Value;

use crate::eval::{resolve_values, EvalContext};
use crate::functions::{coerce_arg, ExpressionValue};

use super::{ComparisonOp, FilterExpression, FilterPredicate, LogicalOp, MembershipOp};

/// Everything a filter expression can see during evaluation.
pub(crate) struct FilterEvalContext<'a, 'p, 'c> {
    pub(crate) ctx: &'c EvalContext<'a, 'p>,
    /// The current node (`@`).
    pub(crate) current: &'c Cow<'a, Value>,
    /// The key or index of the current node (`#`), when known.
    pub(crate) current_key: Option<Value>,
}

/// Evaluate a filter predicate to a logical outcome.
pub(crate) fn evaluate_predicate(
    predicate: &FilterPredicate,
    fctx: &FilterEvalContext<'_, '_, '_>,
) -> bool {
    evaluate(&predicate.expression, fctx).is_truthy()
}

fn evaluate<'a>(
    expr: &FilterExpression,
    fctx: &FilterEvalContext<'a, '_, '_>,
) -> ExpressionValue<'a> {
    match expr {
        FilterExpression::Boolean(b) => ExpressionValue::Logical(*b),
        FilterExpression::Null => ExpressionValue::Value(Cow::Owned(Value::Null)),
        FilterExpression::Undefined => ExpressionValue::Nothing,
        FilterExpression::Int(i) => ExpressionValue::Value(Cow::Owned(Value::from(*i))),
        FilterExpression::Float(f) => ExpressionValue::Value(Cow::Owned(Value::from(*f))),
        FilterExpression::Str(s) => {
            ExpressionValue::Value(Cow::Owned(Value::String(s.clone())))
        }
        // A regex literal only carries meaning on the right of `=~`,
        // which never evaluates it as a value.
        FilterExpression::Regex(_) => ExpressionValue::Nothing,
        FilterExpression::List(items) => {
            let values: Vec<Value> = items
                .iter()
                .map(|item| match evaluate(item, fctx) {
                    ExpressionValue::Value(value) => value.into_owned(),
                    ExpressionValue::Logical(b) => Value::Bool(b),
                    _ => Value::Null,
                })
                .collect();
            ExpressionValue::Value(Cow::Owned(Value::Array(values)))
        }
        FilterExpression::CurrentKey => match &fctx.current_key {
            Some(key) => ExpressionValue::Value(Cow::Owned(key.clone())),
            None => ExpressionValue::Nothing,
        },
        FilterExpression::SelfQuery(query) => {
            if query.is_empty() {
                return ExpressionValue::Value(fctx.current.clone());
            }
            match fctx.current.as_ref() {
                Value::Object(_) | Value::Array(_) => ExpressionValue::Nodes(resolve_values(
                    &query.segments,
                    fctx.current.clone(),
                    fctx.ctx,
                )),
                _ => ExpressionValue::Nodes(Vec::new()),
            }
        }
        FilterExpression::RootQuery(query) => {
            evaluate_cached(expr, fctx, || {
                ExpressionValue::Nodes(resolve_values(
                    &query.segments,
                    fctx.ctx.root_start.clone(),
                    fctx.ctx,
                ))
            })
        }
        FilterExpression::ContextQuery(query) => {
            evaluate_cached(expr, fctx, || match fctx.ctx.filter_context {
                Some(context) => ExpressionValue::Nodes(resolve_values(
                    &query.segments,
                    Cow::Borrowed(context),
                    fctx.ctx,
                )),
                None => ExpressionValue::Nodes(Vec::new()),
            })
        }
        FilterExpression::Function { name, args } => {
            let Some(function) = fctx.ctx.env.function(name) else {
                return ExpressionValue::Nothing;
            };
            let declared = function.arg_types();
            let evaluated: Vec<ExpressionValue<'a>> = args
                .iter()
                .enumerate()
                .map(|(i, arg)| {
                    let value = evaluate(arg, fctx);
                    match declared.get(i) {
                        Some(t) => coerce_arg(value, *t),
                        None => value,
                    }
                })
                .collect();
            function.call(evaluated)
        }
        FilterExpression::Not(inner) => {
            ExpressionValue::Logical(!evaluate(inner, fctx).is_truthy())
        }
        FilterExpression::Logical { left, op, right } => {
            let lhs = evaluate(left, fctx).is_truthy();
            let result = match op {
                LogicalOp::And => lhs && evaluate(right, fctx).is_truthy(),
                LogicalOp::Or => lhs || evaluate(right, fctx).is_truthy(),
            };
            ExpressionValue::Logical(result)
        }
        FilterExpression::Comparison { left, op, right } => {
            if *op == ComparisonOp::Re {
                return ExpressionValue::Logical(regex_match(left, right, fctx));
            }
            let lhs = evaluate(left, fctx).into_value();
            let rhs = evaluate(right, fctx).into_value();
            ExpressionValue::Logical(compare(&lhs, *op, &rhs))
        }
        FilterExpression::Membership { left, op, right } => {
            let lhs = evaluate(left, fctx).into_value();
            let rhs = evaluate(right, fctx).into_value();
            let result = match op {
                MembershipOp::In => is_member(&lhs, &rhs),
                MembershipOp::Contains => is_member(&rhs, &lhs),
            };
            ExpressionValue::Logical(result)
        }
    }
}

/// Memoize stable sub queries per top-level evaluation, keyed by the
/// expression node's identity within the borrowed program.
fn evaluate_cached<'a>(
    expr: &FilterExpression,
    fctx: &FilterEvalContext<'a, '_, '_>,
    compute: impl FnOnce() -> ExpressionValue<'a>,
) -> ExpressionValue<'a> {
    if !fctx.ctx.caching {
        return compute();
    }
    let key = expr as *const FilterExpression as usize;
    if let Some(cached) = fctx.ctx.cached(key) {
        return cached;
    }
    let value = compute();
    fctx.ctx.cache_insert(key, value.clone());
    value
}

fn regex_match(
    left: &FilterExpression,
    right: &FilterExpression,
    fctx: &FilterEvalContext<'_, '_, '_>,
) -> bool {
    let FilterExpression::Regex(regex) = right else {
        return false;
    };
    let lhs = evaluate(left, fctx).into_value();
    match lhs.as_value() {
        Some(Value::String(s)) => regex.pattern.is_match(s),
        _ => false,
    }
}

fn as_value_ref<'v>(value: &'v ExpressionValue<'_>) -> Option<Cow<'v, Value>> {
    match value {
        ExpressionValue::Nothing => None,
        ExpressionValue::Logical(b) => Some(Cow::Owned(Value::Bool(*b))),
        ExpressionValue::Value(v) => Some(Cow::Borrowed(v.as_ref())),
        // `into_value` has already collapsed node lists.
        ExpressionValue::Nodes(_) => None,
    }
}

/// Compare two value-typed operands.
fn compare(left: &ExpressionValue<'_>, op: ComparisonOp, right: &ExpressionValue<'_>) -> bool {
    let lhs = as_value_ref(left);
    let rhs = as_value_ref(right);

    match (lhs, rhs) {
        (None, None) => match op {
            ComparisonOp::Eq | ComparisonOp::Le => true,
            ComparisonOp::Ne | ComparisonOp::Lt | ComparisonOp::Gt | ComparisonOp::Ge => false,
            ComparisonOp::Re => false,
        },
        (None, Some(_)) | (Some(_), None) => match op {
            // The missing value compares less-or-equal to anything,
            // and unequal to everything.
            ComparisonOp::Ne => true,
            ComparisonOp::Le => true,
            _ => false,
        },
        (Some(lhs), Some(rhs)) => {
            let lhs = lhs.as_ref();
            let rhs = rhs.as_ref();
            match op {
                ComparisonOp::Eq => value_equals(lhs, rhs),
                ComparisonOp::Ne => !value_equals(lhs, rhs),
                ComparisonOp::Lt => value_less_than(lhs, rhs),
                ComparisonOp::Gt => value_less_than(rhs, lhs),
                ComparisonOp::Le => value_less_than(lhs, rhs) || value_equals(lhs, rhs),
                ComparisonOp::Ge => value_less_than(rhs, lhs) || value_equals(lhs, rhs),
                ComparisonOp::Re => false,
            }
        }
    }
}

/// Structural equality with numeric int/float unification.
pub(crate) fn value_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| value_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| value_equals(v, other)))
        }
        _ => left == right,
    }
}

/// `<` over numbers and strings; false for any other combination.
fn value_less_than(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        (Value::String(a), Value::String(b)) => a < b,
        _ => false,
    }
}

/// `x in sequence`, `x in mapping` (key membership), `x in list`.
fn is_member(item: &ExpressionValue<'_>, collection: &ExpressionValue<'_>) -> bool {
    let Some(item) = as_value_ref(item) else {
        return false;
    };
    let Some(collection) = as_value_ref(collection) else {
        return false;
    };
    match collection.as_ref() {
        Value::Array(values) => values.iter().any(|v| value_equals(v, item.as_ref())),
        Value::Object(map) => match item.as_ref() {
            Value::String(key) => map.contains_key(key),
            _ => false,
        },
        _ => false,
    }
}
