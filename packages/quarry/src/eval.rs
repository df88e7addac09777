//! Segment and selector evaluation
//!
//! [`Matches`] is the lazy, pull-based match iterator behind
//! `finditer`: a work stack of `(node, next segment)` pairs, applied
//! one segment at a time so matches surface as soon as they are
//! complete. Sub queries inside filter expressions run through the
//! lighter [`resolve_values`] walker, which produces values without
//! match bookkeeping.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::ast::{Query, Segment, Selector};
use crate::env::Environment;
use crate::filter::eval::{evaluate_predicate, FilterEvalContext};
use crate::filter::FilterPredicate;
use crate::functions::ExpressionValue;
use crate::node::{cow_element, cow_entries, cow_items, cow_member, QueryMatch};
use crate::pointer::normalize_index;

/// Shared state for one top-level evaluation.
pub(crate) struct EvalContext<'a, 'p> {
    pub(crate) env: &'p Environment,
    /// The evaluation root: the document, or the single-element wrapper
    /// array for pseudo root queries.
    pub(crate) root_start: Cow<'a, Value>,
    pub(crate) filter_context: Option<&'a Value>,
    pub(crate) caching: bool,
    cache: RefCell<HashMap<usize, ExpressionValue<'a>>>,
}

impl<'a, 'p> EvalContext<'a, 'p> {
    pub(crate) fn cached(&self, key: usize) -> Option<ExpressionValue<'a>> {
        self.cache.borrow().get(&key).cloned()
    }

    pub(crate) fn cache_insert(&self, key: usize, value: ExpressionValue<'a>) {
        self.cache.borrow_mut().insert(key, value);
    }
}

/// A lazy sequence of matches. Dropping the iterator cancels the
/// evaluation; matches already produced stay valid.
pub struct Matches<'a, 'p> {
    ctx: EvalContext<'a, 'p>,
    segments: &'p [Segment],
    /// Pending `(node, next segment index)` pairs, top of stack first
    /// in document order.
    stack: Vec<(Rc<QueryMatch<'a>>, usize)>,
}

impl<'a, 'p> Matches<'a, 'p> {
    pub(crate) fn new(
        env: &'p Environment,
        segments: &'p [Segment],
        data: &'a Value,
        filter_context: Option<&'a Value>,
        pseudo_root: bool,
    ) -> Self {
        let root_start: Cow<'a, Value> = if pseudo_root {
            Cow::Owned(Value::Array(vec![data.clone()]))
        } else {
            Cow::Borrowed(data)
        };
        let ctx = EvalContext {
            env,
            root_start: root_start.clone(),
            filter_context,
            caching: env.filter_caching,
            cache: RefCell::new(HashMap::new()),
        };
        let root_match = QueryMatch::new_root(root_start, data, filter_context);
        Self {
            ctx,
            segments,
            stack: vec![(root_match, 0)],
        }
    }
}

impl<'a> Iterator for Matches<'a, '_> {
    type Item = Rc<QueryMatch<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, index)) = self.stack.pop() {
            if index == self.segments.len() {
                return Some(node);
            }
            let children = apply_segment(&self.segments[index], &node, &self.ctx);
            for child in children.into_iter().rev() {
                self.stack.push((child, index + 1));
            }
        }
        None
    }
}

fn apply_segment<'a>(
    segment: &Segment,
    node: &Rc<QueryMatch<'a>>,
    ctx: &EvalContext<'a, '_>,
) -> Vec<Rc<QueryMatch<'a>>> {
    match segment {
        Segment::Child(selectors) => {
            let mut out = Vec::new();
            for selector in selectors {
                apply_selector(selector, node, ctx, &mut out);
            }
            out
        }
        Segment::Descendant(selectors) => {
            let mut out = Vec::new();
            for visited in descend(node) {
                for selector in selectors {
                    apply_selector(selector, &visited, ctx, &mut out);
                }
            }
            out
        }
    }
}

/// Depth-first pre-order traversal: the node itself, then every
/// structured descendant. Iterative, so document depth is bounded by
/// the heap, not the call stack.
fn descend<'a>(node: &Rc<QueryMatch<'a>>) -> Vec<Rc<QueryMatch<'a>>> {
    let mut out = Vec::new();
    let mut stack = vec![Rc::clone(node)];

    while let Some(current) = stack.pop() {
        let mut children: Vec<Rc<QueryMatch<'a>>> = Vec::new();
        match current.value() {
            Value::Object(_) => {
                for (key, value) in cow_entries(current.value_cow()) {
                    if value.as_ref().is_object() || value.as_ref().is_array() {
                        let location = current.location().with_name(&key);
                        children.push(QueryMatch::child_of(&current, value, location));
                    }
                }
            }
            Value::Array(_) => {
                for (index, value) in cow_items(current.value_cow()).into_iter().enumerate() {
                    if value.as_ref().is_object() || value.as_ref().is_array() {
                        let location = current.location().with_index(index as i64);
                        children.push(QueryMatch::child_of(&current, value, location));
                    }
                }
            }
            _ => {}
        }
        out.push(current);
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }

    out
}

fn apply_selector<'a>(
    selector: &Selector,
    node: &Rc<QueryMatch<'a>>,
    ctx: &EvalContext<'a, '_>,
    out: &mut Vec<Rc<QueryMatch<'a>>>,
) {
    match selector {
        Selector::Name(name) => {
            if node.value().is_object() {
                if let Some(value) = cow_member(node.value_cow(), name) {
                    out.push(QueryMatch::child_of(node, value, node.location().with_name(name)));
                }
            }
        }
        Selector::Index(index) => match node.value() {
            Value::Array(items) => {
                if let Some(idx) = normalize_index(*index, items.len()) {
                    if let Some(value) = cow_element(node.value_cow(), idx) {
                        out.push(QueryMatch::child_of(node, value, node.location().with_index(idx as i64)));
                    }
                }
            }
            Value::Object(_) => {
                // Try the string representation of the index as a key.
                let key = index.to_string();
                if let Some(value) = cow_member(node.value_cow(), &key) {
                    out.push(QueryMatch::child_of(node, value, node.location().with_name(&key)));
                }
            }
            _ => {}
        },
        Selector::Slice { start, stop, step } => {
            if let Value::Array(items) = node.value() {
                for idx in slice_indices(*start, *stop, *step, items.len() as i64) {
                    if let Some(value) = cow_element(node.value_cow(), idx as usize) {
                        out.push(QueryMatch::child_of(node, value, node.location().with_index(idx)));
                    }
                }
            }
        }
        Selector::Wild => match node.value() {
            Value::Object(_) => {
                for (key, value) in cow_entries(node.value_cow()) {
                    let location = node.location().with_name(&key);
                    out.push(QueryMatch::child_of(node, value, location));
                }
            }
            Value::Array(_) => {
                for (index, value) in cow_items(node.value_cow()).into_iter().enumerate() {
                    let location = node.location().with_index(index as i64);
                    out.push(QueryMatch::child_of(node, value, location));
                }
            }
            _ => {}
        },
        Selector::Keys => {
            if let Value::Object(map) = node.value() {
                for key in map.keys() {
                    let value = Cow::Owned(Value::String(key.clone()));
                    out.push(QueryMatch::child_of(node, value, node.location().with_key(key)));
                }
            }
        }
        Selector::Key(name) => {
            if let Value::Object(map) = node.value() {
                if map.contains_key(name) {
                    let value = Cow::Owned(Value::String(name.clone()));
                    out.push(QueryMatch::child_of(node, value, node.location().with_key(name)));
                }
            }
        }
        Selector::Filter(predicate) => apply_filter(predicate, node, ctx, out),
        Selector::KeysFilter(predicate) => {
            for (key, value) in cow_entries(node.value_cow()) {
                let fctx = FilterEvalContext {
                    ctx,
                    current: &value,
                    current_key: Some(Value::String(key.clone())),
                };
                if evaluate_predicate(predicate, &fctx) {
                    let selected = Cow::Owned(Value::String(key.clone()));
                    out.push(QueryMatch::child_of(node, selected, node.location().with_key(&key)));
                }
            }
        }
        Selector::SingularQuery(query) => {
            apply_singular_query(query, node, ctx, out);
        }
    }
}

fn apply_filter<'a>(
    predicate: &FilterPredicate,
    node: &Rc<QueryMatch<'a>>,
    ctx: &EvalContext<'a, '_>,
    out: &mut Vec<Rc<QueryMatch<'a>>>,
) {
    match node.value() {
        Value::Object(_) => {
            for (key, value) in cow_entries(node.value_cow()) {
                let fctx = FilterEvalContext {
                    ctx,
                    current: &value,
                    current_key: Some(Value::String(key.clone())),
                };
                if evaluate_predicate(predicate, &fctx) {
                    let location = node.location().with_name(&key);
                    out.push(QueryMatch::child_of(node, value, location));
                }
            }
        }
        Value::Array(_) => {
            for (index, value) in cow_items(node.value_cow()).into_iter().enumerate() {
                let fctx = FilterEvalContext {
                    ctx,
                    current: &value,
                    current_key: Some(Value::from(index as i64)),
                };
                if evaluate_predicate(predicate, &fctx) {
                    let location = node.location().with_index(index as i64);
                    out.push(QueryMatch::child_of(node, value, location));
                }
            }
        }
        _ => {}
    }
}

/// An embedded absolute singular query: resolve it against the
/// evaluation root, then act as a name selector for a string result or
/// an index selector for an integer result.
fn apply_singular_query<'a>(
    query: &Query,
    node: &Rc<QueryMatch<'a>>,
    ctx: &EvalContext<'a, '_>,
    out: &mut Vec<Rc<QueryMatch<'a>>>,
) {
    let mut resolved = resolve_values(&query.segments, ctx.root_start.clone(), ctx);
    if resolved.len() != 1 {
        return;
    }
    match resolved.pop().map(Cow::into_owned) {
        Some(Value::String(name)) => {
            apply_selector(&Selector::Name(name), node, ctx, out);
        }
        Some(Value::Number(number)) => {
            if let Some(index) = number.as_i64() {
                apply_selector(&Selector::Index(index), node, ctx, out);
            }
        }
        _ => {}
    }
}

/// Resolve a sub query to its values, without match bookkeeping.
///
/// Used for `@`, `$` and `_` rooted queries inside filter expressions,
/// and for embedded singular query selectors.
pub(crate) fn resolve_values<'a>(
    segments: &[Segment],
    start: Cow<'a, Value>,
    ctx: &EvalContext<'a, '_>,
) -> Vec<Cow<'a, Value>> {
    let mut current = vec![start];

    for segment in segments {
        let mut next = Vec::new();
        match segment {
            Segment::Child(selectors) => {
                for value in &current {
                    for selector in selectors {
                        select_values(selector, value, ctx, &mut next);
                    }
                }
            }
            Segment::Descendant(selectors) => {
                for value in &current {
                    for visited in descend_values(value) {
                        for selector in selectors {
                            select_values(selector, &visited, ctx, &mut next);
                        }
                    }
                }
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }

    current
}

fn descend_values<'a>(value: &Cow<'a, Value>) -> Vec<Cow<'a, Value>> {
    let mut out = Vec::new();
    let mut stack = vec![value.clone()];

    while let Some(current) = stack.pop() {
        let mut children: Vec<Cow<'a, Value>> = match current.as_ref() {
            Value::Object(_) => cow_entries(&current)
                .into_iter()
                .map(|(_, v)| v)
                .filter(|v| v.as_ref().is_object() || v.as_ref().is_array())
                .collect(),
            Value::Array(_) => cow_items(&current)
                .into_iter()
                .filter(|v| v.as_ref().is_object() || v.as_ref().is_array())
                .collect(),
            _ => Vec::new(),
        };
        out.push(current);
        children.reverse();
        stack.extend(children);
    }

    out
}

fn select_values<'a>(
    selector: &Selector,
    value: &Cow<'a, Value>,
    ctx: &EvalContext<'a, '_>,
    out: &mut Vec<Cow<'a, Value>>,
) {
    match selector {
        Selector::Name(name) => {
            if let Some(child) = cow_member(value, name) {
                out.push(child);
            }
        }
        Selector::Index(index) => match value.as_ref() {
            Value::Array(items) => {
                if let Some(idx) = normalize_index(*index, items.len()) {
                    if let Some(child) = cow_element(value, idx) {
                        out.push(child);
                    }
                }
            }
            Value::Object(_) => {
                if let Some(child) = cow_member(value, &index.to_string()) {
                    out.push(child);
                }
            }
            _ => {}
        },
        Selector::Slice { start, stop, step } => {
            if let Value::Array(items) = value.as_ref() {
                for idx in slice_indices(*start, *stop, *step, items.len() as i64) {
                    if let Some(child) = cow_element(value, idx as usize) {
                        out.push(child);
                    }
                }
            }
        }
        Selector::Wild => match value.as_ref() {
            Value::Object(_) => out.extend(cow_entries(value).into_iter().map(|(_, v)| v)),
            Value::Array(_) => out.extend(cow_items(value)),
            _ => {}
        },
        Selector::Keys => {
            if let Value::Object(map) = value.as_ref() {
                out.extend(
                    map.keys()
                        .map(|key| Cow::Owned(Value::String(key.clone()))),
                );
            }
        }
        Selector::Key(name) => {
            if let Value::Object(map) = value.as_ref() {
                if map.contains_key(name) {
                    out.push(Cow::Owned(Value::String(name.clone())));
                }
            }
        }
        Selector::Filter(predicate) => match value.as_ref() {
            Value::Object(_) => {
                for (key, child) in cow_entries(value) {
                    let fctx = FilterEvalContext {
                        ctx,
                        current: &child,
                        current_key: Some(Value::String(key)),
                    };
                    if evaluate_predicate(predicate, &fctx) {
                        out.push(child);
                    }
                }
            }
            Value::Array(_) => {
                for (index, child) in cow_items(value).into_iter().enumerate() {
                    let fctx = FilterEvalContext {
                        ctx,
                        current: &child,
                        current_key: Some(Value::from(index as i64)),
                    };
                    if evaluate_predicate(predicate, &fctx) {
                        out.push(child);
                    }
                }
            }
            _ => {}
        },
        Selector::KeysFilter(predicate) => {
            for (key, child) in cow_entries(value) {
                let fctx = FilterEvalContext {
                    ctx,
                    current: &child,
                    current_key: Some(Value::String(key.clone())),
                };
                if evaluate_predicate(predicate, &fctx) {
                    out.push(Cow::Owned(Value::String(key)));
                }
            }
        }
        Selector::SingularQuery(query) => {
            let mut resolved = resolve_values(&query.segments, ctx.root_start.clone(), ctx);
            if resolved.len() != 1 {
                return;
            }
            match resolved.pop().map(Cow::into_owned) {
                Some(Value::String(name)) => select_values(&Selector::Name(name), value, ctx, out),
                Some(Value::Number(number)) => {
                    if let Some(index) = number.as_i64() {
                        select_values(&Selector::Index(index), value, ctx, out);
                    }
                }
                _ => {}
            }
        }
    }
}

/// The indices selected by a slice over a sequence of length `len`,
/// following the usual slicing rules: defaults depend on the step's
/// sign, out-of-range endpoints clamp, and a zero step selects
/// nothing.
pub(crate) fn slice_indices(
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
    len: i64,
) -> Vec<i64> {
    let step = step.unwrap_or(1);
    if step == 0 || len == 0 {
        return Vec::new();
    }

    let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };

    let start = match start {
        None => {
            if step > 0 {
                0
            } else {
                len - 1
            }
        }
        Some(i) => {
            let i = if i < 0 { i + len } else { i };
            i.clamp(lower, upper)
        }
    };
    let stop = match stop {
        None => {
            if step > 0 {
                len
            } else {
                -1
            }
        }
        Some(i) => {
            let i = if i < 0 { i + len } else { i };
            i.clamp(lower, upper)
        }
    };

    let mut indices = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        indices.push(i);
        i += step;
    }
    indices
}
