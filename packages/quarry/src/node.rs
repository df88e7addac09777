//! Matched nodes and node lists
//!
//! A [`QueryMatch`] pairs a matched value with its [`Location`], the
//! document root, parent linkage and any extra filter context data.
//! Matches are produced lazily by
//! [`PathQuery::finditer`](crate::path::PathQuery::finditer).

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::location::Location;
use crate::pointer::JsonPointer;

/// A matched node: a value plus the concrete path that produced it.
///
/// The value is borrowed from the input document wherever possible.
/// Keys produced by the keys selector, and everything selected under
/// the pseudo root wrapper, are owned.
pub struct QueryMatch<'a> {
    value: Cow<'a, Value>,
    location: Location,
    root: &'a Value,
    filter_context: Option<&'a Value>,
    parent: Option<Rc<QueryMatch<'a>>>,
    children: RefCell<Vec<Weak<QueryMatch<'a>>>>,
}

impl<'a> QueryMatch<'a> {
    pub(crate) fn new_root(
        value: Cow<'a, Value>,
        root: &'a Value,
        filter_context: Option<&'a Value>,
    ) -> Rc<Self> {
        Rc::new(Self {
            value,
            location: Location::root(),
            root,
            filter_context,
            parent: None,
            children: RefCell::new(Vec::new()),
        })
    }

    /// Create a child of `parent` and record it in the parent's child
    /// list.
    pub(crate) fn child_of(
        parent: &Rc<QueryMatch<'a>>,
        value: Cow<'a, Value>,
        location: Location,
    ) -> Rc<QueryMatch<'a>> {
        let child = Rc::new(QueryMatch {
            value,
            location,
            root: parent.root,
            filter_context: parent.filter_context,
            parent: Some(Rc::clone(parent)),
            children: RefCell::new(Vec::new()),
        });
        parent.children.borrow_mut().push(Rc::downgrade(&child));
        child
    }

    /// The matched value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        self.value.as_ref()
    }

    /// The matched value, cloned out of the document.
    #[must_use]
    pub fn cloned_value(&self) -> Value {
        self.value.clone().into_owned()
    }

    pub(crate) fn value_cow(&self) -> &Cow<'a, Value> {
        &self.value
    }

    /// The location of this match in the document.
    #[inline]
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The normalized path string for this match.
    #[must_use]
    pub fn path(&self) -> String {
        self.location.to_string()
    }

    /// The root of the document this match was produced from.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// Extra filter context data this match was evaluated with.
    #[inline]
    #[must_use]
    pub fn filter_context(&self) -> Option<&'a Value> {
        self.filter_context
    }

    /// The immediate parent of this match, `None` for the root.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Rc<QueryMatch<'a>>> {
        self.parent.as_ref()
    }

    /// Child matches visited so far beneath this match.
    ///
    /// Children are recorded as they are produced; the list is only
    /// complete once the producing iterator has been exhausted.
    #[must_use]
    pub fn children(&self) -> Vec<Rc<QueryMatch<'a>>> {
        self.children
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// A JSON Pointer for this match's location.
    ///
    /// Key parts and key/index markers use their non-standard pointer
    /// encodings, which resolve back through [`JsonPointer`].
    #[must_use]
    pub fn pointer(&self) -> JsonPointer {
        JsonPointer::from_location(&self.location)
    }
}

impl fmt::Debug for QueryMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryMatch")
            .field("value", &self.value)
            .field("location", &self.location.to_string())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for QueryMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.value, self.location)
    }
}

/// An ordered, possibly empty sequence of matches.
#[derive(Debug, Default)]
pub struct NodeList<'a> {
    nodes: Vec<Rc<QueryMatch<'a>>>,
}

impl<'a> NodeList<'a> {
    #[must_use]
    pub fn new(nodes: Vec<Rc<QueryMatch<'a>>>) -> Self {
        Self { nodes }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<QueryMatch<'a>>> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Rc<QueryMatch<'a>>] {
        &self.nodes
    }

    /// The values from this node list, cloned.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.nodes.iter().map(|n| n.cloned_value()).collect()
    }

    /// The sole value if this list is singular, otherwise an array of
    /// all values.
    #[must_use]
    pub fn values_or_singular(&self) -> Value {
        if self.nodes.len() == 1 {
            self.nodes[0].cloned_value()
        } else {
            Value::Array(self.values())
        }
    }
}

impl<'a> IntoIterator for NodeList<'a> {
    type Item = Rc<QueryMatch<'a>>;
    type IntoIter = std::vec::IntoIter<Rc<QueryMatch<'a>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> From<Vec<Rc<QueryMatch<'a>>>> for NodeList<'a> {
    fn from(nodes: Vec<Rc<QueryMatch<'a>>>) -> Self {
        Self { nodes }
    }
}

/// Member lookup through a copy-on-write value.
///
/// Children of borrowed values borrow from the document; children of
/// owned values are cloned so the result is independent of the parent.
pub(crate) fn cow_member<'a>(value: &Cow<'a, Value>, name: &str) -> Option<Cow<'a, Value>> {
    match value {
        Cow::Borrowed(v) => v.get(name).map(Cow::Borrowed),
        Cow::Owned(v) => v.get(name).map(|child| Cow::Owned(child.clone())),
    }
}

/// Element lookup through a copy-on-write value.
pub(crate) fn cow_element<'a>(value: &Cow<'a, Value>, index: usize) -> Option<Cow<'a, Value>> {
    match value {
        Cow::Borrowed(v) => v.get(index).map(Cow::Borrowed),
        Cow::Owned(v) => v.get(index).map(|child| Cow::Owned(child.clone())),
    }
}

/// Entries of a mapping, in insertion order. Empty for non-mappings.
pub(crate) fn cow_entries<'a>(value: &Cow<'a, Value>) -> Vec<(String, Cow<'a, Value>)> {
    match value {
        Cow::Borrowed(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), Cow::Borrowed(v)))
            .collect(),
        Cow::Owned(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), Cow::Owned(v.clone())))
            .collect(),
        _ => Vec::new(),
    }
}

/// Elements of a sequence, in index order. Empty for non-sequences.
pub(crate) fn cow_items<'a>(value: &Cow<'a, Value>) -> Vec<Cow<'a, Value>> {
    match value {
        Cow::Borrowed(Value::Array(items)) => items.iter().map(Cow::Borrowed).collect(),
        Cow::Owned(Value::Array(items)) => {
            items.iter().map(|v| Cow::Owned(v.clone())).collect()
        }
        _ => Vec::new(),
    }
}
