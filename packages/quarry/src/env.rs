//! The JSONPath environment
//!
//! An [`Environment`] is the configuration container everything else
//! hangs off: the configurable identifier tokens, integer index
//! limits, strictness and well-typedness flags, and the function
//! extension registry. Build one with [`Environment::builder`],
//! configure it, then compile any number of paths against it. Paths
//! borrow the environment, so the borrow checker enforces that it
//! cannot change while compiled paths are live.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{JsonPathError, JsonPathResult};
use crate::functions::{
    self, Count, FilterFunction, IsInstance, Length, MatchFunction, SearchFunction, StartsWith,
    TypeOf, ValueFunction,
};
use crate::lexer::Lexer;
use crate::node::{NodeList, QueryMatch};
use crate::parser::Parser;
use crate::path::{CompiledPath, CompoundPathQuery, PathQuery};
use crate::tokens::{TokenKind, TokenStream};

/// JSONPath configuration and compilation entry point.
pub struct Environment {
    pub(crate) root_token: String,
    pub(crate) self_token: String,
    pub(crate) context_token: String,
    pub(crate) key_token: String,
    pub(crate) keys_token: String,
    pub(crate) pseudo_root_token: String,
    pub(crate) union_token: String,
    pub(crate) intersection_token: String,
    pub(crate) and_word: String,
    pub(crate) or_word: String,
    pub(crate) not_word: String,
    pub(crate) min_int_index: i64,
    pub(crate) max_int_index: i64,
    pub(crate) unicode_escape: bool,
    pub(crate) filter_caching: bool,
    pub(crate) well_typed: bool,
    pub(crate) strict: bool,
    functions: HashMap<String, Arc<dyn FilterFunction>>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("root_token", &self.root_token)
            .field("self_token", &self.self_token)
            .field("context_token", &self.context_token)
            .field("key_token", &self.key_token)
            .field("keys_token", &self.keys_token)
            .field("pseudo_root_token", &self.pseudo_root_token)
            .field("union_token", &self.union_token)
            .field("intersection_token", &self.intersection_token)
            .field("and_word", &self.and_word)
            .field("or_word", &self.or_word)
            .field("not_word", &self.not_word)
            .field("min_int_index", &self.min_int_index)
            .field("max_int_index", &self.max_int_index)
            .field("unicode_escape", &self.unicode_escape)
            .field("filter_caching", &self.filter_caching)
            .field("well_typed", &self.well_typed)
            .field("strict", &self.strict)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Environment {
    /// An environment with the default (non-strict, well-typed)
    /// configuration and the standard functions registered.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// An RFC 9535 aligned environment: strict syntax, no non-standard
    /// selectors or identifiers.
    #[must_use]
    pub fn strict() -> Self {
        Self::builder().strict(true).build()
    }

    #[must_use]
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::default()
    }

    /// True when non-standard syntax is disabled.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Register a function extension under `name`.
    pub fn register_function(&mut self, name: impl Into<String>, function: Arc<dyn FilterFunction>) {
        self.functions.insert(name.into(), function);
    }

    /// Remove a function extension, returning it if it was registered.
    pub fn remove_function(&mut self, name: &str) -> Option<Arc<dyn FilterFunction>> {
        self.functions.remove(name)
    }

    /// Register the opt-in `keys` function.
    pub fn register_keys_function(&mut self) {
        self.register_function("keys", Arc::new(functions::Keys));
    }

    /// Look up a function extension by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Arc<dyn FilterFunction>> {
        self.functions.get(name)
    }

    /// Prepare a path string for repeated matching against different
    /// data. Expect a compound path when the query uses the union or
    /// intersection operators.
    pub fn compile(&self, path: &str) -> JsonPathResult<CompiledPath<'_>> {
        let lexer = Lexer::new(self);
        let mut stream = TokenStream::new(lexer.tokenize(path)?);
        let parser = Parser::new(self);

        let parsed = parser.parse(&mut stream)?;
        let first = PathQuery::new(self, parsed.query, parsed.pseudo_root, path.to_string());

        if stream.current().kind == TokenKind::Eof {
            log::debug!("compiled JSONPath {path:?} -> {first}");
            return Ok(CompiledPath::Single(first));
        }

        if self.strict {
            return Err(JsonPathError::syntax(
                "compound queries are not allowed in strict mode",
                stream.current().clone(),
            ));
        }

        let mut compound = CompoundPathQuery {
            env: self,
            first,
            rest: Vec::new(),
        };

        while stream.current().kind != TokenKind::Eof {
            let op = stream.current().kind;
            if !matches!(op, TokenKind::Union | TokenKind::Intersect) {
                return Err(JsonPathError::syntax(
                    format!("unexpected token {}", stream.current()),
                    stream.current().clone(),
                ));
            }
            if stream.peek().kind == TokenKind::Eof {
                return Err(JsonPathError::syntax(
                    format!("expected a path after {}", stream.current()),
                    stream.current().clone(),
                ));
            }
            stream.next_token();

            let parsed = parser.parse(&mut stream)?;
            let path_query =
                PathQuery::new(self, parsed.query, parsed.pseudo_root, String::new());
            compound = match op {
                TokenKind::Union => compound.union(path_query),
                _ => compound.intersection(path_query),
            };
        }

        log::debug!("compiled compound JSONPath {path:?} -> {compound}");
        Ok(CompiledPath::Compound(compound))
    }

    /// Find all values in `data` matching `path`.
    pub fn findall(&self, path: &str, data: &Value) -> JsonPathResult<Vec<Value>> {
        Ok(self.compile(path)?.findall(data))
    }

    /// Like [`Environment::findall`], with extra data made available
    /// to filters under the filter context identifier.
    pub fn findall_with(
        &self,
        path: &str,
        data: &Value,
        filter_context: Option<&Value>,
    ) -> JsonPathResult<Vec<Value>> {
        Ok(self.compile(path)?.findall_with(data, filter_context))
    }

    /// Find all matches in `data`, with locations and parent links.
    pub fn find<'a>(&self, path: &str, data: &'a Value) -> JsonPathResult<NodeList<'a>> {
        Ok(self.compile(path)?.find(data, None))
    }

    /// Like [`Environment::find`], with extra filter context data.
    pub fn find_with<'a>(
        &self,
        path: &str,
        data: &'a Value,
        filter_context: Option<&'a Value>,
    ) -> JsonPathResult<NodeList<'a>> {
        Ok(self.compile(path)?.find(data, filter_context))
    }

    /// Iterate matches in `data`. Compiles `path` first; compile the
    /// path yourself with [`Environment::compile`] to iterate lazily.
    pub fn finditer<'a>(
        &self,
        path: &str,
        data: &'a Value,
    ) -> JsonPathResult<impl Iterator<Item = Rc<QueryMatch<'a>>>> {
        Ok(self.find(path, data)?.into_iter())
    }

    /// The first match of `path` in `data`, or `None`.
    pub fn match_first<'a>(
        &self,
        path: &str,
        data: &'a Value,
    ) -> JsonPathResult<Option<Rc<QueryMatch<'a>>>> {
        Ok(self.compile(path)?.match_first(data))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Environment`].
///
/// Token options set to the empty string disable the token.
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    root_token: String,
    self_token: String,
    context_token: String,
    key_token: String,
    keys_token: String,
    pseudo_root_token: String,
    union_token: String,
    intersection_token: String,
    and_word: String,
    or_word: String,
    not_word: String,
    min_int_index: i64,
    max_int_index: i64,
    unicode_escape: bool,
    filter_caching: bool,
    well_typed: bool,
    strict: bool,
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self {
            root_token: "$".to_string(),
            self_token: "@".to_string(),
            context_token: "_".to_string(),
            key_token: "#".to_string(),
            keys_token: "~".to_string(),
            pseudo_root_token: "^".to_string(),
            union_token: "|".to_string(),
            intersection_token: "&".to_string(),
            and_word: "and".to_string(),
            or_word: "or".to_string(),
            not_word: "not".to_string(),
            min_int_index: crate::pointer::MIN_INT_INDEX,
            max_int_index: crate::pointer::MAX_INT_INDEX,
            unicode_escape: true,
            filter_caching: true,
            well_typed: true,
            strict: false,
        }
    }
}

impl EnvironmentBuilder {
    #[must_use]
    pub fn root_token(mut self, token: impl Into<String>) -> Self {
        self.root_token = token.into();
        self
    }

    #[must_use]
    pub fn self_token(mut self, token: impl Into<String>) -> Self {
        self.self_token = token.into();
        self
    }

    #[must_use]
    pub fn context_token(mut self, token: impl Into<String>) -> Self {
        self.context_token = token.into();
        self
    }

    #[must_use]
    pub fn key_token(mut self, token: impl Into<String>) -> Self {
        self.key_token = token.into();
        self
    }

    #[must_use]
    pub fn keys_token(mut self, token: impl Into<String>) -> Self {
        self.keys_token = token.into();
        self
    }

    #[must_use]
    pub fn pseudo_root_token(mut self, token: impl Into<String>) -> Self {
        self.pseudo_root_token = token.into();
        self
    }

    #[must_use]
    pub fn union_token(mut self, token: impl Into<String>) -> Self {
        self.union_token = token.into();
        self
    }

    #[must_use]
    pub fn intersection_token(mut self, token: impl Into<String>) -> Self {
        self.intersection_token = token.into();
        self
    }

    #[must_use]
    pub fn and_word(mut self, word: impl Into<String>) -> Self {
        self.and_word = word.into();
        self
    }

    #[must_use]
    pub fn or_word(mut self, word: impl Into<String>) -> Self {
        self.or_word = word.into();
        self
    }

    #[must_use]
    pub fn not_word(mut self, word: impl Into<String>) -> Self {
        self.not_word = word.into();
        self
    }

    #[must_use]
    pub fn min_int_index(mut self, index: i64) -> Self {
        self.min_int_index = index;
        self
    }

    #[must_use]
    pub fn max_int_index(mut self, index: i64) -> Self {
        self.max_int_index = index;
        self
    }

    /// Decode UTF-16 escape sequences in string literals and pointers.
    #[must_use]
    pub fn unicode_escape(mut self, enabled: bool) -> Self {
        self.unicode_escape = enabled;
        self
    }

    /// Memoize stable filter sub queries within one evaluation.
    #[must_use]
    pub fn filter_caching(mut self, enabled: bool) -> Self {
        self.filter_caching = enabled;
        self
    }

    /// Check filter expression well-typedness at compile time.
    #[must_use]
    pub fn well_typed(mut self, enabled: bool) -> Self {
        self.well_typed = enabled;
        self
    }

    /// Disable all non-standard selectors, identifiers and tolerant
    /// parsing.
    #[must_use]
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> Environment {
        let mut env = Environment {
            root_token: self.root_token,
            self_token: self.self_token,
            context_token: self.context_token,
            key_token: self.key_token,
            keys_token: self.keys_token,
            pseudo_root_token: self.pseudo_root_token,
            union_token: self.union_token,
            intersection_token: self.intersection_token,
            and_word: self.and_word,
            or_word: self.or_word,
            not_word: self.not_word,
            min_int_index: self.min_int_index,
            max_int_index: self.max_int_index,
            unicode_escape: self.unicode_escape,
            filter_caching: self.filter_caching,
            well_typed: self.well_typed,
            strict: self.strict,
            functions: HashMap::new(),
        };
        env.setup_function_extensions();
        env
    }
}

impl Environment {
    /// Register the standard function extensions.
    fn setup_function_extensions(&mut self) {
        self.register_function("length", Arc::new(Length));
        self.register_function("count", Arc::new(Count));
        self.register_function("match", Arc::new(MatchFunction));
        self.register_function("search", Arc::new(SearchFunction));
        self.register_function("value", Arc::new(ValueFunction));
        let is_instance: Arc<dyn FilterFunction> = Arc::new(IsInstance);
        self.register_function("isinstance", Arc::clone(&is_instance));
        self.register_function("is", is_instance);
        let type_of: Arc<dyn FilterFunction> = Arc::new(TypeOf::default());
        self.register_function("typeof", Arc::clone(&type_of));
        self.register_function("type", type_of);
        self.register_function("startswith", Arc::new(StartsWith));
    }
}
