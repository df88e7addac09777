//! quarry - a JSONPath, JSON Pointer and JSON Patch engine
//!
//! Find values in JSON-shaped data with RFC 9535 JSONPath queries plus
//! a documented set of extensions, resolve RFC 6901 JSON Pointers, and
//! apply RFC 6902 JSON Patches. Queries compile once and evaluate
//! against any number of documents; matches carry their normalized
//! location and parent linkage.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//!
//! let data = json!({"users": [
//!     {"name": "Sue", "score": 100},
//!     {"name": "John", "score": 86},
//! ]});
//!
//! let values = quarry::findall("$.users[?@.score < 100].name", &data).unwrap();
//! assert_eq!(values, vec![json!("John")]);
//! ```
//!
//! Configure an [`Environment`] to change the configurable tokens,
//! strictness, index limits or function registry:
//!
//! ```
//! use quarry::Environment;
//! use serde_json::json;
//!
//! let env = Environment::builder().strict(true).build();
//! assert!(env.compile("$.store").is_ok());
//! assert!(env.compile("$[?@.a =~ /x/]").is_err());
//! ```

pub mod ast;
pub mod env;
pub mod error;
mod eval;
pub mod filter;
pub mod functions;
pub mod lexer;
pub mod location;
pub mod node;
pub mod parser;
pub mod patch;
pub mod path;
pub mod pointer;
pub mod tokens;
mod unescape;

pub use env::{Environment, EnvironmentBuilder};
pub use error::{
    ErrorKind, JsonPathError, JsonPathResult, PatchError, PointerError, RelativePointerError,
};
pub use eval::Matches;
pub use filter::{ComparisonOp, FilterExpression, FilterPredicate, LogicalOp, MembershipOp};
pub use functions::{ExpressionType, ExpressionValue, FilterFunction};
pub use location::{Location, PathPart};
pub use node::{NodeList, QueryMatch};
pub use patch::{JsonPatch, PatchOp};
pub use path::{CompiledPath, CompoundPathQuery, PathQuery};
pub use pointer::{JsonPointer, RelativeJsonPointer};
pub use tokens::{Token, TokenKind};

use std::rc::Rc;

use serde_json::Value;

lazy_static::lazy_static! {
    static ref DEFAULT_ENV: Environment = Environment::new();
}

/// The process-wide default environment used by the module level
/// convenience functions.
#[must_use]
pub fn default_environment() -> &'static Environment {
    &DEFAULT_ENV
}

/// Compile `path` against the default environment.
pub fn compile(path: &str) -> JsonPathResult<CompiledPath<'static>> {
    DEFAULT_ENV.compile(path)
}

/// Find all values in `data` matching `path`, using the default
/// environment.
pub fn findall(path: &str, data: &Value) -> JsonPathResult<Vec<Value>> {
    DEFAULT_ENV.findall(path, data)
}

/// Find all matches in `data`, with locations, using the default
/// environment.
pub fn find<'a>(path: &str, data: &'a Value) -> JsonPathResult<NodeList<'a>> {
    DEFAULT_ENV.find(path, data)
}

/// The first match of `path` in `data`, or `None`, using the default
/// environment.
pub fn match_first<'a>(path: &str, data: &'a Value) -> JsonPathResult<Option<Rc<QueryMatch<'a>>>> {
    DEFAULT_ENV.match_first(path, data)
}

/// Resolve an RFC 6901 JSON Pointer against `data`.
pub fn resolve<'a>(
    pointer: &str,
    data: &'a Value,
) -> Result<std::borrow::Cow<'a, Value>, PointerError> {
    pointer::resolve(pointer, data)
}
