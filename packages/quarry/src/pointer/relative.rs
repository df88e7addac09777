//! Relative JSON Pointer
//!
//! See <https://www.ietf.org/id/draft-hha-relative-json-pointer-00.html>.
//! Syntax: `N[+M|-M](#|/rest)` — walk `N` levels up from a base
//! pointer, optionally offset a final array index by `M`, then either
//! append a sub pointer or (`#`) rewrite the last part into a key or
//! index marker.

use std::fmt;

use crate::error::{PointerError, RelativePointerError};

use super::{JsonPointer, PointerSegment};

/// What follows the origin (and optional offset) of a relative pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelativeTail {
    /// A sub pointer to append, possibly empty.
    Pointer(JsonPointer),
    /// The `#` terminator: address the key or index itself.
    Key,
}

/// A parsed Relative JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeJsonPointer {
    origin: u32,
    offset: i64,
    tail: RelativeTail,
}

impl RelativeJsonPointer {
    /// Parse a relative pointer string.
    pub fn parse(rel: &str) -> Result<Self, RelativePointerError> {
        let rel = rel.trim_start();
        let digits: String = rel.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(RelativePointerError::Syntax(
                "expected positive int or zero".to_string(),
            ));
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(RelativePointerError::Syntax(
                "unexpected leading zero".to_string(),
            ));
        }
        let origin: u32 = digits
            .parse()
            .map_err(|_| RelativePointerError::Syntax("origin out of range".to_string()))?;

        let mut rest = &rel[digits.len()..];
        let mut offset = 0i64;
        if let Some(sign) = rest.chars().next().filter(|c| *c == '+' || *c == '-') {
            let body = &rest[1..];
            let offset_digits: String = body.chars().take_while(char::is_ascii_digit).collect();
            if offset_digits.is_empty() {
                return Err(RelativePointerError::Syntax(
                    "expected an index offset".to_string(),
                ));
            }
            if offset_digits.len() > 1 && offset_digits.starts_with('0') {
                return Err(RelativePointerError::Syntax(
                    "unexpected leading zero".to_string(),
                ));
            }
            offset = offset_digits
                .parse()
                .map_err(|_| RelativePointerError::Syntax("offset out of range".to_string()))?;
            if offset == 0 {
                return Err(RelativePointerError::Syntax(
                    "index offset can't be zero".to_string(),
                ));
            }
            if sign == '-' {
                offset = -offset;
            }
            rest = &body[offset_digits.len()..];
        }

        let tail = match rest.trim() {
            "#" => RelativeTail::Key,
            pointer => RelativeTail::Pointer(
                JsonPointer::parse(pointer)
                    .map_err(|err| RelativePointerError::Syntax(err.to_string()))?,
            ),
        };

        Ok(Self {
            origin,
            offset,
            tail,
        })
    }

    /// Levels to walk up from the base pointer.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> u32 {
        self.origin
    }

    /// The index offset, zero when absent.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    #[inline]
    #[must_use]
    pub fn tail(&self) -> &RelativeTail {
        &self.tail
    }

    /// Return a new [`JsonPointer`] by applying this relative pointer
    /// to `base`.
    pub fn to(&self, base: &JsonPointer) -> Result<JsonPointer, RelativePointerError> {
        let base_parts = base.parts();
        if self.origin as usize > base_parts.len() {
            return Err(RelativePointerError::Index(format!(
                "origin ({}) exceeds root ({})",
                self.origin,
                base_parts.len()
            )));
        }

        let mut parts: Vec<PointerSegment> =
            base_parts[..base_parts.len() - self.origin as usize].to_vec();

        if self.offset != 0 {
            if let Some(last) = parts.last_mut() {
                if let Some(index) = int_like(last) {
                    let new_index = index + self.offset;
                    if new_index < 0 {
                        return Err(RelativePointerError::Index(format!(
                            "index offset out of range {new_index}"
                        )));
                    }
                    *last = PointerSegment::Index(new_index);
                }
            }
        }

        match &self.tail {
            RelativeTail::Pointer(pointer) => parts.extend(pointer.parts().iter().cloned()),
            RelativeTail::Key => match parts.last_mut() {
                Some(last) => {
                    let raw = match last {
                        PointerSegment::Name(name) => name.clone(),
                        PointerSegment::Index(index) => index.to_string(),
                    };
                    *last = PointerSegment::Name(format!("#{raw}"));
                }
                None => {
                    return Err(RelativePointerError::Index(
                        "the root has no key or index".to_string(),
                    ))
                }
            },
        }

        Ok(JsonPointer::from_parts(parts))
    }
}

fn int_like(part: &PointerSegment) -> Option<i64> {
    match part {
        PointerSegment::Index(index) => Some(*index),
        PointerSegment::Name(name) => name.parse().ok(),
    }
}

impl fmt::Display for RelativeJsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin)?;
        if self.offset > 0 {
            write!(f, "+{}", self.offset)?;
        } else if self.offset < 0 {
            write!(f, "{}", self.offset)?;
        }
        match &self.tail {
            RelativeTail::Pointer(pointer) => write!(f, "{pointer}"),
            RelativeTail::Key => f.write_str("#"),
        }
    }
}

impl std::str::FromStr for RelativeJsonPointer {
    type Err = RelativePointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::str::FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
