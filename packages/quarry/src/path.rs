//! Compiled JSONPath queries
//!
//! A [`PathQuery`] is a parsed program bound to its environment, ready
//! to match against any number of documents. A [`CompoundPathQuery`]
//! combines several with union and intersection.
//! [`Environment::compile`](crate::env::Environment::compile) returns
//! the [`CompiledPath`] enum over the two.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::ast::Query;
use crate::env::Environment;
use crate::eval::Matches;
use crate::filter::eval::value_equals;
use crate::node::{NodeList, QueryMatch};

/// A compiled JSONPath, stateless and reusable across inputs.
pub struct PathQuery<'env> {
    pub(crate) env: &'env Environment,
    pub(crate) query: Query,
    pub(crate) pseudo_root: bool,
    source: String,
}

impl<'env> PathQuery<'env> {
    pub(crate) fn new(
        env: &'env Environment,
        query: Query,
        pseudo_root: bool,
        source: String,
    ) -> Self {
        Self {
            env,
            query,
            pseudo_root,
            source,
        }
    }

    /// The query text this path was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True if this query selects at most one node by construction.
    #[must_use]
    pub fn is_singular(&self) -> bool {
        self.query.is_singular()
    }

    /// Lazily produce matches against `data`.
    pub fn finditer<'a, 'p>(&'p self, data: &'a Value) -> Matches<'a, 'p> {
        self.finditer_with(data, None)
    }

    /// Like [`PathQuery::finditer`], with extra filter context data
    /// made available under the filter context identifier.
    pub fn finditer_with<'a, 'p>(
        &'p self,
        data: &'a Value,
        filter_context: Option<&'a Value>,
    ) -> Matches<'a, 'p> {
        Matches::new(
            self.env,
            &self.query.segments,
            data,
            filter_context,
            self.pseudo_root,
        )
    }

    /// All matches against `data`, as a node list.
    #[must_use]
    pub fn find<'a>(&self, data: &'a Value, filter_context: Option<&'a Value>) -> NodeList<'a> {
        NodeList::new(self.finditer_with(data, filter_context).collect())
    }

    /// The values of every match against `data`.
    #[must_use]
    pub fn findall(&self, data: &Value) -> Vec<Value> {
        self.findall_with(data, None)
    }

    /// Like [`PathQuery::findall`], with extra filter context data.
    #[must_use]
    pub fn findall_with(&self, data: &Value, filter_context: Option<&Value>) -> Vec<Value> {
        self.finditer_with(data, filter_context)
            .map(|m| m.cloned_value())
            .collect()
    }

    /// The first match against `data`, or `None`.
    #[must_use]
    pub fn match_first<'a>(&self, data: &'a Value) -> Option<Rc<QueryMatch<'a>>> {
        self.finditer(data).next()
    }
}

impl fmt::Display for PathQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pseudo_root {
            write!(f, "^{}", self.query.segments_string())
        } else {
            write!(f, "{}", self.query)
        }
    }
}

impl fmt::Debug for PathQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathQuery")
            .field("env", &self.env)
            .field("query", &self.query)
            .field("pseudo_root", &self.pseudo_root)
            .field("source", &self.source)
            .finish()
    }
}

/// A compound query operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    /// Concatenate match sequences, no deduplication.
    Union,
    /// Keep left matches whose value and normalized location also
    /// appear on the right.
    Intersect,
}

/// Several compiled paths combined with union and intersection.
pub struct CompoundPathQuery<'env> {
    pub(crate) env: &'env Environment,
    pub(crate) first: PathQuery<'env>,
    pub(crate) rest: Vec<(CompoundOp, PathQuery<'env>)>,
}

impl fmt::Debug for CompoundPathQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundPathQuery")
            .field("env", &self.env)
            .field("first", &self.first)
            .field("rest", &self.rest)
            .finish()
    }
}

impl<'env> CompoundPathQuery<'env> {
    /// All matches against `data`, in operator order.
    #[must_use]
    pub fn find<'a>(&self, data: &'a Value, filter_context: Option<&'a Value>) -> NodeList<'a> {
        let mut nodes: Vec<Rc<QueryMatch<'a>>> =
            self.first.finditer_with(data, filter_context).collect();

        for (op, path) in &self.rest {
            let right: Vec<Rc<QueryMatch<'a>>> =
                path.finditer_with(data, filter_context).collect();
            match op {
                CompoundOp::Union => nodes.extend(right),
                CompoundOp::Intersect => {
                    nodes.retain(|node| {
                        right.iter().any(|other| {
                            other.location() == node.location()
                                && value_equals(other.value(), node.value())
                        })
                    });
                }
            }
        }

        NodeList::new(nodes)
    }

    /// The values of every match against `data`.
    #[must_use]
    pub fn findall(&self, data: &Value) -> Vec<Value> {
        self.find(data, None).values()
    }

    /// Append another path with the union operator.
    #[must_use]
    pub fn union(mut self, path: PathQuery<'env>) -> Self {
        self.rest.push((CompoundOp::Union, path));
        self
    }

    /// Append another path with the intersection operator.
    #[must_use]
    pub fn intersection(mut self, path: PathQuery<'env>) -> Self {
        self.rest.push((CompoundOp::Intersect, path));
        self
    }
}

impl fmt::Display for CompoundPathQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (op, path) in &self.rest {
            let token = match op {
                CompoundOp::Union => &self.env.union_token,
                CompoundOp::Intersect => &self.env.intersection_token,
            };
            write!(f, " {token} {path}")?;
        }
        Ok(())
    }
}

/// A compiled path: a single query, or a compound of several.
#[derive(Debug)]
pub enum CompiledPath<'env> {
    Single(PathQuery<'env>),
    Compound(CompoundPathQuery<'env>),
}

impl<'env> CompiledPath<'env> {
    /// All matches against `data`, as a node list.
    #[must_use]
    pub fn find<'a>(&self, data: &'a Value, filter_context: Option<&'a Value>) -> NodeList<'a> {
        match self {
            CompiledPath::Single(path) => path.find(data, filter_context),
            CompiledPath::Compound(compound) => compound.find(data, filter_context),
        }
    }

    /// The values of every match against `data`.
    #[must_use]
    pub fn findall(&self, data: &Value) -> Vec<Value> {
        self.findall_with(data, None)
    }

    /// Like [`CompiledPath::findall`], with extra filter context data.
    #[must_use]
    pub fn findall_with(&self, data: &Value, filter_context: Option<&Value>) -> Vec<Value> {
        self.find(data, filter_context).values()
    }

    /// The first match against `data`, or `None`.
    #[must_use]
    pub fn match_first<'a>(&self, data: &'a Value) -> Option<Rc<QueryMatch<'a>>> {
        match self {
            CompiledPath::Single(path) => path.match_first(data),
            CompiledPath::Compound(compound) => {
                compound.find(data, None).into_iter().next()
            }
        }
    }

    /// The single-query form, when this is not a compound path.
    #[must_use]
    pub fn as_single(&self) -> Option<&PathQuery<'env>> {
        match self {
            CompiledPath::Single(path) => Some(path),
            CompiledPath::Compound(_) => None,
        }
    }
}

impl fmt::Display for CompiledPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledPath::Single(path) => write!(f, "{path}"),
            CompiledPath::Compound(compound) => write!(f, "{compound}"),
        }
    }
}
