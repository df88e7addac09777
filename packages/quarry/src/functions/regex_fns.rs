//! The standard `match` and `search` function extensions
//!
//! Both compile their pattern argument through a process-wide, size
//! bounded regex cache. Invalid patterns and non-string arguments
//! reduce to `false` rather than raising.

use std::collections::HashMap;
use std::sync::Mutex;

use regex::Regex;
use serde_json::Value;

use super::{ExpressionType, ExpressionValue, FilterFunction};

/// A cache key: the pattern as written, and whether it is compiled in
/// anchored (full match) form.
type PatternKey = (String, bool);

/// Process-wide cache of compiled runtime patterns.
///
/// The `match` function compiles patterns anchored, `search` compiles
/// them as written; both forms of the same pattern text can coexist.
/// When the cache fills up it is flushed whole, bounding memory while
/// keeping steady-state queries (a handful of distinct patterns) fully
/// cached.
pub(crate) struct RegexCache {
    patterns: Mutex<HashMap<PatternKey, Regex>>,
}

const CACHE_CAPACITY: usize = 64;

impl RegexCache {
    fn new() -> Self {
        Self {
            patterns: Mutex::new(HashMap::new()),
        }
    }

    fn compile(pattern: &str, anchored: bool) -> Result<Regex, regex::Error> {
        if anchored {
            Regex::new(&format!("^(?:{pattern})$"))
        } else {
            Regex::new(pattern)
        }
    }

    /// Get a compiled regex from the cache, compiling on a miss.
    pub(crate) fn get_or_compile(
        &self,
        pattern: &str,
        anchored: bool,
    ) -> Result<Regex, regex::Error> {
        let Ok(mut patterns) = self.patterns.lock() else {
            return Self::compile(pattern, anchored);
        };

        if let Some(regex) = patterns.get(&(pattern.to_string(), anchored)) {
            return Ok(regex.clone());
        }

        let regex = Self::compile(pattern, anchored)?;
        if patterns.len() >= CACHE_CAPACITY {
            patterns.clear();
        }
        patterns.insert((pattern.to_string(), anchored), regex.clone());
        Ok(regex)
    }
}

lazy_static::lazy_static! {
    pub(crate) static ref REGEX_CACHE: RegexCache = RegexCache::new();
}

fn string_args<'v>(args: &'v [ExpressionValue<'_>]) -> Option<(&'v str, &'v str)> {
    let subject = match args.first()?.as_value()? {
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    let pattern = match args.get(1)?.as_value()? {
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    Some((subject, pattern))
}

/// Full-string regex match.
pub struct MatchFunction;

impl FilterFunction for MatchFunction {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Value, ExpressionType::Value]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Logical
    }

    fn call<'a>(&self, args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        let matched = string_args(&args).is_some_and(|(subject, pattern)| {
            match REGEX_CACHE.get_or_compile(pattern, true) {
                Ok(regex) => regex.is_match(subject),
                Err(err) => {
                    log::debug!("match(): invalid pattern {pattern:?}: {err}");
                    false
                }
            }
        });
        ExpressionValue::Logical(matched)
    }
}

/// Substring regex search.
pub struct SearchFunction;

impl FilterFunction for SearchFunction {
    fn arg_types(&self) -> &[ExpressionType] {
        &[ExpressionType::Value, ExpressionType::Value]
    }

    fn return_type(&self) -> ExpressionType {
        ExpressionType::Logical
    }

    fn call<'a>(&self, args: Vec<ExpressionValue<'a>>) -> ExpressionValue<'a> {
        let matched = string_args(&args).is_some_and(|(subject, pattern)| {
            match REGEX_CACHE.get_or_compile(pattern, false) {
                Ok(regex) => regex.is_match(subject),
                Err(err) => {
                    log::debug!("search(): invalid pattern {pattern:?}: {err}");
                    false
                }
            }
        });
        ExpressionValue::Logical(matched)
    }
}
