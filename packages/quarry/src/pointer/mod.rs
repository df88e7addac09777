//! JSON Pointer, as per RFC 6901
//!
//! A [`JsonPointer`] identifies a single value in JSON-like data. On
//! top of the RFC grammar, pointers understand the non-standard
//! `#name`/`#N` key and index markers produced by
//! [`RelativeJsonPointer`] arithmetic, and `~name` parts produced by
//! the keys selector.

mod relative;

pub use relative::{RelativeJsonPointer, RelativeTail};

use std::borrow::Cow;
use std::fmt;
use std::ops::Div;

use serde_json::Value;

use crate::error::PointerError;
use crate::location::{Location, PathPart};
use crate::unescape;

/// The maximum integer allowed when resolving sequence items by index.
pub const MAX_INT_INDEX: i64 = (1 << 53) - 1;
/// The minimum integer allowed when resolving sequence items by index.
pub const MIN_INT_INDEX: i64 = -(1 << 53) + 1;

/// One parsed part of a JSON Pointer.
///
/// Parts that look like indices (digits without a leading zero, within
/// the configured range) are stored as [`PointerSegment::Index`];
/// everything else, including `-` and the non-standard `#`/`~` marker
/// forms, is a [`PointerSegment::Name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointerSegment {
    Name(String),
    Index(i64),
}

impl PointerSegment {
    fn classify(s: String) -> Result<Self, PointerError> {
        // Non-zero integers with a leading zero stay names per RFC 6901.
        if s.len() > 1 && (s.starts_with('0') || s.starts_with("-0")) {
            return Ok(PointerSegment::Name(s));
        }
        match s.parse::<i64>() {
            Ok(index) => {
                if !(MIN_INT_INDEX..=MAX_INT_INDEX).contains(&index) {
                    return Err(PointerError::Index(format!("{index}")));
                }
                Ok(PointerSegment::Index(index))
            }
            Err(_) => Ok(PointerSegment::Name(s)),
        }
    }

    fn encode(&self) -> String {
        match self {
            PointerSegment::Name(name) => name.replace('~', "~0").replace('/', "~1"),
            PointerSegment::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for PointerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Identify a single, specific value in JSON-like data, as per RFC 6901.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    parts: Vec<PointerSegment>,
}

impl JsonPointer {
    /// Parse an RFC 6901 pointer string.
    ///
    /// UTF-16 escape sequences are decoded before parsing. Use
    /// [`JsonPointer::parse_opts`] to disable that, or to URI-decode
    /// the pointer first.
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        Self::parse_opts(pointer, true, false)
    }

    /// Parse a pointer string with explicit preprocessing options.
    pub fn parse_opts(
        pointer: &str,
        unicode_escape: bool,
        uri_decode: bool,
    ) -> Result<Self, PointerError> {
        let mut s = Cow::Borrowed(pointer);
        if uri_decode {
            s = Cow::Owned(unescape::percent_decode(&s));
        }
        if unicode_escape {
            s = Cow::Owned(
                unescape::decode_unicode_escapes(&s).map_err(PointerError::Parse)?,
            );
        }

        let s = s.trim_start();
        if s.is_empty() {
            return Ok(Self { parts: Vec::new() });
        }
        if !s.starts_with('/') {
            return Err(PointerError::Parse(
                "pointer must start with a slash or be the empty string".to_string(),
            ));
        }

        let parts = s
            .split('/')
            .skip(1)
            .map(|p| PointerSegment::classify(p.replace("~1", "/").replace("~0", "~")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { parts })
    }

    /// Build a pointer from pre-parsed parts.
    #[must_use]
    pub fn from_parts(parts: Vec<PointerSegment>) -> Self {
        Self { parts }
    }

    /// A pointer for an engine-produced [`Location`].
    ///
    /// Key parts and key/index markers use their non-standard string
    /// encodings (`~name`, `#name`, `#N`), which resolve back through
    /// this pointer implementation.
    #[must_use]
    pub fn from_location(location: &Location) -> Self {
        let parts = location
            .parts()
            .iter()
            .map(|part| match part {
                PathPart::Name(name) => PointerSegment::Name(name.clone()),
                PathPart::Index(index) => PointerSegment::Index(*index),
                PathPart::Key(name) => PointerSegment::Name(format!("~{name}")),
                PathPart::KeyMark(name) => PointerSegment::Name(format!("#{name}")),
                PathPart::IndexMark(index) => PointerSegment::Name(format!("#{index}")),
            })
            .collect();
        Self { parts }
    }

    /// The parsed parts making up this pointer.
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &[PointerSegment] {
        &self.parts
    }

    /// True for the root pointer (the empty string).
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    /// Resolve this pointer against `data`.
    pub fn resolve<'a>(&self, data: &'a Value) -> Result<Cow<'a, Value>, PointerError> {
        let mut current = Cow::Borrowed(data);
        for part in &self.parts {
            current = step(current, part)?;
        }
        Ok(current)
    }

    /// Resolve against `data`, returning the target and its parent.
    ///
    /// The parent is `None` when this pointer points at the root. If
    /// the parent exists but the final part does not resolve, the
    /// target is `None`.
    pub fn resolve_parent<'a>(
        &self,
        data: &'a Value,
    ) -> Result<(Option<Cow<'a, Value>>, Option<Cow<'a, Value>>), PointerError> {
        let Some((last, head)) = self.parts.split_last() else {
            return Ok((None, Some(self.resolve(data)?)));
        };

        let mut parent = Cow::Borrowed(data);
        for part in head {
            parent = step(parent, part)?;
        }

        match step(parent.clone(), last) {
            Ok(value) => Ok((Some(parent), Some(value))),
            Err(PointerError::Key(_) | PointerError::Index(_)) => Ok((Some(parent), None)),
            Err(err) => Err(err),
        }
    }

    /// True if this pointer can be resolved against `data`.
    ///
    /// Note that [`JsonPointer::resolve`] can return legitimate falsy
    /// values; this returns `true` for those too.
    #[must_use]
    pub fn exists(&self, data: &Value) -> bool {
        self.resolve(data).is_ok()
    }

    /// This pointer's parent, as a new pointer. The root pointer is its
    /// own parent.
    #[must_use]
    pub fn parent(&self) -> Self {
        match self.parts.split_last() {
            Some((_, head)) => Self {
                parts: head.to_vec(),
            },
            None => self.clone(),
        }
    }

    /// True if this pointer points to a child of `other`.
    #[must_use]
    pub fn is_relative_to(&self, other: &JsonPointer) -> bool {
        other.parts.len() < self.parts.len()
            && self.parts[..other.parts.len()] == other.parts[..]
    }

    /// Join this pointer with `parts`.
    ///
    /// Each part is a pointer string, possibly without a leading slash.
    /// A part with a leading slash resets to the root, and processing
    /// of the remaining parts continues.
    pub fn join(&self, parts: &[&str]) -> Result<Self, PointerError> {
        let mut pointer = self.clone();
        for part in parts {
            pointer = pointer.append(part)?;
        }
        Ok(pointer)
    }

    fn append(&self, other: &str) -> Result<Self, PointerError> {
        let other =
            unescape::decode_unicode_escapes(other.trim_start()).map_err(PointerError::Parse)?;
        if other.starts_with('/') {
            return Self::parse_opts(&other, false, false);
        }

        let mut parts = self.parts.clone();
        for p in other.split('/') {
            parts.push(PointerSegment::classify(
                p.replace("~1", "/").replace("~0", "~"),
            )?);
        }
        Ok(Self { parts })
    }

    /// Return a new pointer by applying a relative pointer to this one.
    pub fn to(&self, rel: &RelativeJsonPointer) -> Result<Self, PointerError> {
        rel.to(self)
            .map_err(|err| PointerError::Parse(err.to_string()))
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "/{}", part.encode())?;
        }
        Ok(())
    }
}

/// `pointer / "suffix"` appends a relative part, or resets to the root
/// when the suffix has a leading slash.
impl Div<&str> for &JsonPointer {
    type Output = Result<JsonPointer, PointerError>;

    fn div(self, rhs: &str) -> Self::Output {
        self.append(rhs)
    }
}

/// Apply one pointer part to a value.
fn step<'a>(current: Cow<'a, Value>, part: &PointerSegment) -> Result<Cow<'a, Value>, PointerError> {
    match part {
        PointerSegment::Name(name) => step_name(current, name),
        PointerSegment::Index(index) => step_index(current, *index),
    }
}

fn step_index<'a>(current: Cow<'a, Value>, index: i64) -> Result<Cow<'a, Value>, PointerError> {
    match &current {
        Cow::Borrowed(Value::Array(items)) => {
            let idx = normalize_index(index, items.len())
                .ok_or_else(|| PointerError::Index(index.to_string()))?;
            Ok(Cow::Borrowed(&items[idx]))
        }
        Cow::Owned(Value::Array(items)) => {
            let idx = normalize_index(index, items.len())
                .ok_or_else(|| PointerError::Index(index.to_string()))?;
            Ok(Cow::Owned(items[idx].clone()))
        }
        Cow::Borrowed(Value::Object(map)) => {
            // Try the string representation of the index as a key.
            map.get(&index.to_string())
                .map(Cow::Borrowed)
                .ok_or_else(|| PointerError::Key(index.to_string()))
        }
        Cow::Owned(Value::Object(map)) => map
            .get(&index.to_string())
            .map(|v| Cow::Owned(v.clone()))
            .ok_or_else(|| PointerError::Key(index.to_string())),
        _ => Err(PointerError::Type(index.to_string())),
    }
}

fn step_name<'a>(current: Cow<'a, Value>, name: &str) -> Result<Cow<'a, Value>, PointerError> {
    match &current {
        Cow::Borrowed(Value::Object(map)) => {
            if let Some(value) = map.get(name) {
                return Ok(Cow::Borrowed(value));
            }
            key_marker(map, name).ok_or_else(|| PointerError::Key(name.to_string()))
        }
        Cow::Owned(Value::Object(map)) => {
            if let Some(value) = map.get(name) {
                return Ok(Cow::Owned(value.clone()));
            }
            key_marker(map, name).ok_or_else(|| PointerError::Key(name.to_string()))
        }
        Cow::Borrowed(Value::Array(items)) => array_by_name(items.len(), name)
            .map(|idx_or_val| match idx_or_val {
                ArrayLookup::Element(idx) => Cow::Borrowed(&items[idx]),
                ArrayLookup::Marker(value) => Cow::Owned(value),
            }),
        Cow::Owned(Value::Array(items)) => array_by_name(items.len(), name)
            .map(|idx_or_val| match idx_or_val {
                ArrayLookup::Element(idx) => Cow::Owned(items[idx].clone()),
                ArrayLookup::Marker(value) => Cow::Owned(value),
            }),
        _ => Err(PointerError::Type(name.to_string())),
    }
}

/// Non-standard key marker: a missing key starting with `~` or `#`
/// resolves to the key itself when the suffix is a member of the map.
fn key_marker<'a>(
    map: &serde_json::Map<String, Value>,
    name: &str,
) -> Option<Cow<'a, Value>> {
    let suffix = name.strip_prefix('~').or_else(|| name.strip_prefix('#'))?;
    map.contains_key(suffix)
        .then(|| Cow::Owned(Value::String(suffix.to_string())))
}

enum ArrayLookup {
    Element(usize),
    Marker(Value),
}

fn array_by_name(len: usize, name: &str) -> Result<ArrayLookup, PointerError> {
    if name == "-" {
        // "-" is a valid index when appending with JSON Patch, but not
        // when resolving a pointer.
        return Err(PointerError::Index("-".to_string()));
    }

    // Non-standard index marker: `#N` with a non-zero leading digit
    // resolves to the index itself. `#0` and zero-padded forms are not
    // markers and fall through to the usual name handling.
    if let Some(digits) = name.strip_prefix('#') {
        if let Ok(index) = digits.parse::<u64>() {
            if !digits.starts_with('0') {
                if (index as usize) < len {
                    return Ok(ArrayLookup::Marker(Value::Number(index.into())));
                }
                return Err(PointerError::Index(digits.to_string()));
            }
        }
    }

    if name.len() > 1 && (name.starts_with('0') || name.starts_with("-0")) {
        return Err(PointerError::Type(name.to_string()));
    }
    match name.parse::<i64>() {
        Ok(index) => {
            let idx =
                normalize_index(index, len).ok_or_else(|| PointerError::Index(name.to_string()))?;
            Ok(ArrayLookup::Element(idx))
        }
        Err(_) => Err(PointerError::Type(name.to_string())),
    }
}

/// Normalize a possibly negative index against a sequence length.
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if index < 0 { len + index } else { index };
    (0..len).contains(&idx).then_some(idx as usize)
}

/// Resolve a JSON Pointer string against `data` in one call.
pub fn resolve<'a>(pointer: &str, data: &'a Value) -> Result<Cow<'a, Value>, PointerError> {
    JsonPointer::parse(pointer)?.resolve(data)
}
