//! Normalized locations for nodes in a JSON document
//!
//! A [`Location`] is the canonical, serializable path of parts
//! identifying a single node, as produced by the query evaluator.
//! Locations serialize to normalized path strings like
//! `$['store']['book'][0]['title']`, with the non-standard extensions
//! `[~'name']` for key-selected names and `[#N]`/`[#'name']` for
//! index/key markers produced by relative pointer arithmetic.

use std::fmt;

use crate::error::PointerError;

/// One part of a [`Location`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPart {
    /// An object member name.
    Name(String),
    /// A sequence index. Always normalized (non-negative) for engine
    /// produced locations.
    Index(i64),
    /// A mapping key selected with the keys selector (`~`).
    Key(String),
    /// An index marker (`#N`), from relative pointer `#` terminators.
    IndexMark(i64),
    /// A key marker (`#'name'`), from relative pointer `#` terminators.
    KeyMark(String),
}

impl PathPart {
    /// True for parts that address a concrete value (name or index),
    /// as opposed to key/index markers.
    #[inline]
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        matches!(self, PathPart::Name(_) | PathPart::Index(_))
    }
}

fn escape_name(name: &str) -> String {
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

impl fmt::Display for PathPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPart::Name(name) => write!(f, "['{}']", escape_name(name)),
            PathPart::Index(index) => write!(f, "[{index}]"),
            PathPart::Key(name) => write!(f, "[~'{}']", escape_name(name)),
            PathPart::IndexMark(index) => write!(f, "[#{index}]"),
            PathPart::KeyMark(name) => write!(f, "[#'{}']", escape_name(name)),
        }
    }
}

/// A normalized path identifying a single node in a JSON document.
///
/// The serialized form is stable under a parse/serialize round trip,
/// see [`Location::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    parts: Vec<PathPart>,
}

impl Location {
    /// The root location (`$`).
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self { parts: Vec::new() }
    }

    #[must_use]
    pub fn from_parts(parts: Vec<PathPart>) -> Self {
        Self { parts }
    }

    /// The parts making up this location, root first.
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &[PathPart] {
        &self.parts
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of parts below the root.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// True when every part addresses a concrete value, meaning the
    /// location can be resolved with a standard JSON Pointer.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        self.parts.iter().all(PathPart::is_concrete)
    }

    /// This location extended with an object member name.
    #[must_use]
    pub fn with_name(&self, name: &str) -> Self {
        let mut parts = self.parts.clone();
        parts.push(PathPart::Name(name.to_string()));
        Self { parts }
    }

    /// This location extended with a sequence index.
    #[must_use]
    pub fn with_index(&self, index: i64) -> Self {
        let mut parts = self.parts.clone();
        parts.push(PathPart::Index(index));
        Self { parts }
    }

    /// This location extended with a key part (`~name`).
    #[must_use]
    pub fn with_key(&self, name: &str) -> Self {
        let mut parts = self.parts.clone();
        parts.push(PathPart::Key(name.to_string()));
        Self { parts }
    }

    /// Parse a normalized path string, as serialized by `Display`.
    pub fn parse(path: &str) -> Result<Self, PointerError> {
        let mut chars = path.chars().peekable();
        match chars.next() {
            Some('$') => {}
            _ => {
                return Err(PointerError::Parse(
                    "normalized path must start with '$'".to_string(),
                ))
            }
        }

        let mut parts = Vec::new();
        while let Some(ch) = chars.next() {
            if ch != '[' {
                return Err(PointerError::Parse(format!("expected '[', found {ch:?}")));
            }

            let marker = match chars.peek() {
                Some('~') => {
                    chars.next();
                    Some('~')
                }
                Some('#') => {
                    chars.next();
                    Some('#')
                }
                _ => None,
            };

            match chars.peek() {
                Some('\'') => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    while let Some(c) = chars.next() {
                        match c {
                            '\\' => match chars.next() {
                                Some(esc) => name.push(esc),
                                None => {
                                    return Err(PointerError::Parse(
                                        "unterminated name in normalized path".to_string(),
                                    ))
                                }
                            },
                            '\'' => {
                                closed = true;
                                break;
                            }
                            _ => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(PointerError::Parse(
                            "unterminated name in normalized path".to_string(),
                        ));
                    }
                    parts.push(match marker {
                        Some('~') => PathPart::Key(name),
                        Some('#') => PathPart::KeyMark(name),
                        _ => PathPart::Name(name),
                    });
                }
                _ => {
                    let mut digits = String::new();
                    if let Some('-') = chars.peek() {
                        digits.push('-');
                        chars.next();
                    }
                    while let Some(c) = chars.peek() {
                        if c.is_ascii_digit() {
                            digits.push(*c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let index: i64 = digits.parse().map_err(|_| {
                        PointerError::Parse("expected an index in normalized path".to_string())
                    })?;
                    parts.push(match marker {
                        Some('#') => PathPart::IndexMark(index),
                        Some('~') => {
                            return Err(PointerError::Parse(
                                "key part must be a quoted name".to_string(),
                            ))
                        }
                        _ => PathPart::Index(index),
                    });
                }
            }

            match chars.next() {
                Some(']') => {}
                _ => return Err(PointerError::Parse("expected ']'".to_string())),
            }
        }

        Ok(Self { parts })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for part in &self.parts {
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_display() {
        assert_eq!(Location::root().to_string(), "$");
    }

    #[test]
    fn display_and_parse_round_trip() {
        let loc = Location::root()
            .with_name("store")
            .with_name("it's")
            .with_index(3)
            .with_key("price");
        let serialized = loc.to_string();
        assert_eq!(serialized, "$['store']['it\\'s'][3][~'price']");
        assert_eq!(Location::parse(&serialized).expect("parse"), loc);
    }

    #[test]
    fn parse_index_marks() {
        let loc = Location::parse("$['a'][#2][#'b']").expect("parse");
        assert_eq!(
            loc.parts(),
            &[
                PathPart::Name("a".to_string()),
                PathPart::IndexMark(2),
                PathPart::KeyMark("b".to_string()),
            ]
        );
    }

    #[test]
    fn parse_rejects_missing_root() {
        assert!(Location::parse("['a']").is_err());
    }
}
