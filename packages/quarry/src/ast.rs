//! JSONPath abstract syntax tree
//!
//! Segments and selectors as produced by the parser. `Display`
//! implementations emit a canonical textual form that parses back to
//! an equivalent program.

use std::fmt;

use crate::filter::FilterPredicate;

/// A parsed JSONPath program: a sequence of segments applied in order.
///
/// Sub queries inside filter expressions reuse this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub segments: Vec<Segment>,
}

impl Query {
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// True if this query has no segments.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if this query can yield at most one node by construction:
    /// every segment is a child segment with a single name or index
    /// selector.
    #[must_use]
    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(|segment| match segment {
            Segment::Child(selectors) => {
                selectors.len() == 1
                    && matches!(selectors[0], Selector::Name(_) | Selector::Index(_))
            }
            Segment::Descendant(_) => false,
        })
    }

    /// The canonical segment text without a leading identifier.
    pub(crate) fn segments_string(&self) -> String {
        self.segments.iter().map(Segment::to_string).collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.segments_string())
    }
}

/// A JSONPath segment: one step of child selection or descendant
/// traversal, holding one or more selectors.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Apply each selector to the node itself.
    Child(Vec<Selector>),
    /// Apply each selector at the node and every structured descendant,
    /// depth first, self before children.
    Descendant(Vec<Selector>),
}

impl Segment {
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        match self {
            Segment::Child(selectors) | Segment::Descendant(selectors) => selectors,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, selectors) = match self {
            Segment::Child(selectors) => ("", selectors),
            Segment::Descendant(selectors) => ("..", selectors),
        };
        let items: Vec<String> = selectors.iter().map(Selector::to_string).collect();
        write!(f, "{prefix}[{}]", items.join(", "))
    }
}

/// A selector within a segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Select a mapping member by name.
    Name(String),
    /// Select a sequence element by (possibly negative) index.
    Index(i64),
    /// Select a range of sequence elements.
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    /// Select every member value or element.
    Wild,
    /// Select every mapping key (`~`).
    Keys,
    /// Select a single mapping key by name (`~name`).
    Key(String),
    /// Select member values or elements for which the predicate holds
    /// (`?expr`).
    Filter(FilterPredicate),
    /// Select mapping keys for which the predicate holds over the
    /// member value (`~?expr`).
    KeysFilter(FilterPredicate),
    /// An embedded absolute singular query; behaves as a name or index
    /// selector depending on what it resolves to.
    SingularQuery(Query),
}

fn escape_single_quoted(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(ch),
        }
    }
    out
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write!(f, "'{}'", escape_single_quoted(name)),
            Selector::Index(index) => write!(f, "{index}"),
            Selector::Slice { start, stop, step } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_str(":")?;
                if let Some(stop) = stop {
                    write!(f, "{stop}")?;
                }
                f.write_str(":")?;
                match step {
                    Some(step) => write!(f, "{step}"),
                    None => write!(f, "1"),
                }
            }
            Selector::Wild => f.write_str("*"),
            Selector::Keys => f.write_str("~"),
            Selector::Key(name) => write!(f, "~'{}'", escape_single_quoted(name)),
            Selector::Filter(predicate) => write!(f, "?{predicate}"),
            Selector::KeysFilter(predicate) => write!(f, "~?{predicate}"),
            Selector::SingularQuery(query) => write!(f, "{query}"),
        }
    }
}
