//! Filter expression nodes
//!
//! A filter expression is a tagged tree evaluated against a current
//! node, the document root and optional extra context data. The
//! canonical `Display` form parses back to an equivalent expression and
//! doubles as a structural identity for caching.

pub(crate) mod eval;

use std::fmt;

use regex::Regex;

use crate::ast::Query;

/// A compiled `/pattern/flags` literal.
#[derive(Debug, Clone)]
pub struct RegexLiteral {
    /// The compiled pattern, flags applied.
    pub pattern: Regex,
    /// The pattern text as written, escapes intact.
    pub raw: String,
    /// The flag characters as written (`a`, `i`, `m`, `s`).
    pub flags: String,
}

impl PartialEq for RegexLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.flags == other.flags
    }
}

impl fmt::Display for RegexLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.raw, self.flags)
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("&&"),
            LogicalOp::Or => f.write_str("||"),
        }
    }
}

/// Comparison operators. `<>` is normalized to `!=` at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// The `=~` regex match operator.
    Re,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOp::Eq => f.write_str("=="),
            ComparisonOp::Ne => f.write_str("!="),
            ComparisonOp::Lt => f.write_str("<"),
            ComparisonOp::Le => f.write_str("<="),
            ComparisonOp::Gt => f.write_str(">"),
            ComparisonOp::Ge => f.write_str(">="),
            ComparisonOp::Re => f.write_str("=~"),
        }
    }
}

/// Membership operators. `a contains b` is `b in a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    In,
    Contains,
}

impl fmt::Display for MembershipOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipOp::In => f.write_str("in"),
            MembershipOp::Contains => f.write_str("contains"),
        }
    }
}

/// A filter expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// `true` or `false`.
    Boolean(bool),
    /// `null` (also spelled `nil` and `none`).
    Null,
    /// The `undefined`/`missing` literal.
    Undefined,
    /// An integer literal.
    Int(i64),
    /// A float literal.
    Float(f64),
    /// A string literal.
    Str(String),
    /// A regex literal.
    Regex(RegexLiteral),
    /// A list literal, only valid beside `in`/`contains`.
    List(Vec<FilterExpression>),
    /// The key or index of the current node (`#`).
    CurrentKey,
    /// A query rooted at the current node (`@`).
    SelfQuery(Query),
    /// A query rooted at the document root (`$`).
    RootQuery(Query),
    /// A query rooted at the extra filter context (`_`).
    ContextQuery(Query),
    /// A function extension call.
    Function {
        name: String,
        args: Vec<FilterExpression>,
    },
    /// Logical negation.
    Not(Box<FilterExpression>),
    /// `&&` / `||`, short-circuiting.
    Logical {
        left: Box<FilterExpression>,
        op: LogicalOp,
        right: Box<FilterExpression>,
    },
    /// A comparison between two value-typed operands.
    Comparison {
        left: Box<FilterExpression>,
        op: ComparisonOp,
        right: Box<FilterExpression>,
    },
    /// `in` / `contains` membership tests.
    Membership {
        left: Box<FilterExpression>,
        op: MembershipOp,
        right: Box<FilterExpression>,
    },
}

impl FilterExpression {
    /// True when the expression's value can change between nodes of a
    /// single segment application, because it reads the current node or
    /// current key. Root and context queries are stable for the whole
    /// evaluation; their nested filters rebind `@`/`#` internally.
    #[must_use]
    pub fn is_volatile(&self) -> bool {
        match self {
            FilterExpression::CurrentKey | FilterExpression::SelfQuery(_) => true,
            FilterExpression::RootQuery(_) | FilterExpression::ContextQuery(_) => false,
            FilterExpression::Boolean(_)
            | FilterExpression::Null
            | FilterExpression::Undefined
            | FilterExpression::Int(_)
            | FilterExpression::Float(_)
            | FilterExpression::Str(_)
            | FilterExpression::Regex(_) => false,
            FilterExpression::List(items) => items.iter().any(FilterExpression::is_volatile),
            FilterExpression::Function { args, .. } => {
                args.iter().any(FilterExpression::is_volatile)
            }
            FilterExpression::Not(inner) => inner.is_volatile(),
            FilterExpression::Logical { left, right, .. }
            | FilterExpression::Comparison { left, right, .. }
            | FilterExpression::Membership { left, right, .. } => {
                left.is_volatile() || right.is_volatile()
            }
        }
    }

    /// True when any root or context query occurs beneath this node,
    /// meaning there is something worth memoizing per evaluation.
    #[must_use]
    pub fn has_cacheable_query(&self) -> bool {
        match self {
            FilterExpression::RootQuery(_) | FilterExpression::ContextQuery(_) => true,
            FilterExpression::SelfQuery(_)
            | FilterExpression::CurrentKey
            | FilterExpression::Boolean(_)
            | FilterExpression::Null
            | FilterExpression::Undefined
            | FilterExpression::Int(_)
            | FilterExpression::Float(_)
            | FilterExpression::Str(_)
            | FilterExpression::Regex(_) => false,
            FilterExpression::List(items) => {
                items.iter().any(FilterExpression::has_cacheable_query)
            }
            FilterExpression::Function { args, .. } => {
                args.iter().any(FilterExpression::has_cacheable_query)
            }
            FilterExpression::Not(inner) => inner.has_cacheable_query(),
            FilterExpression::Logical { left, right, .. }
            | FilterExpression::Comparison { left, right, .. }
            | FilterExpression::Membership { left, right, .. } => {
                left.has_cacheable_query() || right.has_cacheable_query()
            }
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpression::Boolean(true) => f.write_str("true"),
            FilterExpression::Boolean(false) => f.write_str("false"),
            FilterExpression::Null => f.write_str("null"),
            FilterExpression::Undefined => f.write_str("undefined"),
            FilterExpression::Int(value) => write!(f, "{value}"),
            FilterExpression::Float(value) => write!(f, "{value:?}"),
            FilterExpression::Str(value) => {
                write!(f, "{}", serde_json::Value::String(value.clone()))
            }
            FilterExpression::Regex(regex) => write!(f, "{regex}"),
            FilterExpression::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            FilterExpression::CurrentKey => f.write_str("#"),
            FilterExpression::SelfQuery(query) => write!(f, "@{}", query.segments_string()),
            FilterExpression::RootQuery(query) => write!(f, "{query}"),
            FilterExpression::ContextQuery(query) => write!(f, "_{}", query.segments_string()),
            FilterExpression::Function { name, args } => {
                let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{name}({})", parts.join(", "))
            }
            FilterExpression::Not(inner) => write!(f, "!{inner}"),
            FilterExpression::Logical { left, op, right } => {
                write!(f, "({left} {op} {right})")
            }
            FilterExpression::Comparison { left, op, right } => {
                write!(f, "{left} {op} {right}")
            }
            FilterExpression::Membership { left, op, right } => {
                write!(f, "{left} {op} {right}")
            }
        }
    }
}

/// The root of a filter selector's expression tree.
///
/// Volatility and the presence of cacheable sub queries are computed
/// once, when the parser builds the predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    pub expression: FilterExpression,
    /// Whether per-evaluation memoization can help this predicate.
    pub cacheable: bool,
}

impl FilterPredicate {
    #[must_use]
    pub fn new(expression: FilterExpression) -> Self {
        let cacheable = expression.has_cacheable_query();
        Self {
            expression,
            cacheable,
        }
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}
