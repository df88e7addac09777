//! JSON Patch, as per RFC 6902
//!
//! A [`JsonPatch`] is an ordered sequence of operations applied to a
//! document through the JSON Pointer machinery. Build one from a patch
//! document with [`JsonPatch::from_value`], or fluently with the
//! operation methods.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PatchError, PointerError};
use crate::pointer::{normalize_index, JsonPointer, PointerSegment};
use crate::filter::eval::value_equals;

/// One RFC 6902 patch operation.
#[derive(Debug, Clone)]
pub enum PatchOp {
    Add { path: JsonPointer, value: Value },
    Remove { path: JsonPointer },
    Replace { path: JsonPointer, value: Value },
    Move { from: JsonPointer, path: JsonPointer },
    Copy { from: JsonPointer, path: JsonPointer },
    Test { path: JsonPointer, value: Value },
}

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum RawOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

/// An ordered sequence of patch operations.
#[derive(Debug, Clone, Default)]
pub struct JsonPatch {
    ops: Vec<PatchOp>,
}

impl JsonPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a patch from an RFC 6902 patch document: an array of
    /// operation objects.
    pub fn from_value(doc: &Value) -> Result<Self, PatchError> {
        let raw: Vec<RawOp> = serde_json::from_value(doc.clone())
            .map_err(|err| PatchError::Op(err.to_string()))?;

        let mut patch = JsonPatch::new();
        for op in raw {
            let op = match op {
                RawOp::Add { path, value } => PatchOp::Add {
                    path: parse_pointer(&path)?,
                    value,
                },
                RawOp::Remove { path } => PatchOp::Remove {
                    path: parse_pointer(&path)?,
                },
                RawOp::Replace { path, value } => PatchOp::Replace {
                    path: parse_pointer(&path)?,
                    value,
                },
                RawOp::Move { from, path } => PatchOp::Move {
                    from: parse_pointer(&from)?,
                    path: parse_pointer(&path)?,
                },
                RawOp::Copy { from, path } => PatchOp::Copy {
                    from: parse_pointer(&from)?,
                    path: parse_pointer(&path)?,
                },
                RawOp::Test { path, value } => PatchOp::Test {
                    path: parse_pointer(&path)?,
                    value,
                },
            };
            patch.ops.push(op);
        }
        Ok(patch)
    }

    /// The operations in application order.
    #[must_use]
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Append an `add` operation.
    pub fn add(mut self, path: &str, value: Value) -> Result<Self, PatchError> {
        self.ops.push(PatchOp::Add {
            path: parse_pointer(path)?,
            value,
        });
        Ok(self)
    }

    /// Append a `remove` operation.
    pub fn remove(mut self, path: &str) -> Result<Self, PatchError> {
        self.ops.push(PatchOp::Remove {
            path: parse_pointer(path)?,
        });
        Ok(self)
    }

    /// Append a `replace` operation.
    pub fn replace(mut self, path: &str, value: Value) -> Result<Self, PatchError> {
        self.ops.push(PatchOp::Replace {
            path: parse_pointer(path)?,
            value,
        });
        Ok(self)
    }

    /// Append a `move` operation.
    pub fn move_from(mut self, from: &str, path: &str) -> Result<Self, PatchError> {
        self.ops.push(PatchOp::Move {
            from: parse_pointer(from)?,
            path: parse_pointer(path)?,
        });
        Ok(self)
    }

    /// Append a `copy` operation.
    pub fn copy_from(mut self, from: &str, path: &str) -> Result<Self, PatchError> {
        self.ops.push(PatchOp::Copy {
            from: parse_pointer(from)?,
            path: parse_pointer(path)?,
        });
        Ok(self)
    }

    /// Append a `test` operation.
    pub fn test(mut self, path: &str, value: Value) -> Result<Self, PatchError> {
        self.ops.push(PatchOp::Test {
            path: parse_pointer(path)?,
            value,
        });
        Ok(self)
    }

    /// Apply every operation to a copy of `data` and return it.
    pub fn apply(&self, data: &Value) -> Result<Value, PatchError> {
        let mut doc = data.clone();
        self.apply_in_place(&mut doc)?;
        Ok(doc)
    }

    /// Apply every operation to `data` in order. On error the document
    /// is left partially patched.
    pub fn apply_in_place(&self, data: &mut Value) -> Result<(), PatchError> {
        for op in &self.ops {
            apply_op(op, data)?;
        }
        Ok(())
    }
}

fn parse_pointer(path: &str) -> Result<JsonPointer, PatchError> {
    JsonPointer::parse(path).map_err(PatchError::from)
}

fn apply_op(op: &PatchOp, data: &mut Value) -> Result<(), PatchError> {
    match op {
        PatchOp::Add { path, value } => add(path, value.clone(), data),
        PatchOp::Remove { path } => remove(path, data).map(|_| ()),
        PatchOp::Replace { path, value } => {
            if path.is_root() {
                *data = value.clone();
                return Ok(());
            }
            let target = locate_mut(data, path.parts())?;
            *target = value.clone();
            Ok(())
        }
        PatchOp::Move { from, path } => {
            if path.is_relative_to(from) {
                return Err(PatchError::Op(
                    "can't move a value into one of its children".to_string(),
                ));
            }
            let value = remove(from, data)?;
            add(path, value, data)
        }
        PatchOp::Copy { from, path } => {
            let value = from.resolve(data)?.into_owned();
            add(path, value, data)
        }
        PatchOp::Test { path, value } => {
            let found = path.resolve(data)?;
            if value_equals(found.as_ref(), value) {
                Ok(())
            } else {
                Err(PatchError::TestFailure(format!(
                    "value at {path:?} does not match"
                )))
            }
        }
    }
}

/// Walk `parts` mutably. Every part must resolve.
fn locate_mut<'v>(
    data: &'v mut Value,
    parts: &[PointerSegment],
) -> Result<&'v mut Value, PatchError> {
    let mut current = data;
    for part in parts {
        current = match part {
            PointerSegment::Name(name) => match current {
                Value::Object(map) => map
                    .get_mut(name)
                    .ok_or_else(|| PatchError::Target(name.clone()))?,
                Value::Array(items) => {
                    let index = array_index(name, items.len())?;
                    &mut items[index]
                }
                _ => return Err(PatchError::Pointer(PointerError::Type(name.clone()))),
            },
            PointerSegment::Index(index) => match current {
                Value::Object(map) => map
                    .get_mut(&index.to_string())
                    .ok_or_else(|| PatchError::Target(index.to_string()))?,
                Value::Array(items) => {
                    let idx = normalize_index(*index, items.len())
                        .ok_or_else(|| PatchError::Target(index.to_string()))?;
                    &mut items[idx]
                }
                _ => {
                    return Err(PatchError::Pointer(PointerError::Type(index.to_string())))
                }
            },
        };
    }
    Ok(current)
}

fn array_index(name: &str, len: usize) -> Result<usize, PatchError> {
    if name.len() > 1 && name.starts_with('0') {
        return Err(PatchError::Target(name.to_string()));
    }
    let index: i64 = name
        .parse()
        .map_err(|_| PatchError::Pointer(PointerError::Type(name.to_string())))?;
    normalize_index(index, len).ok_or_else(|| PatchError::Target(name.to_string()))
}

fn add(path: &JsonPointer, value: Value, data: &mut Value) -> Result<(), PatchError> {
    if path.is_root() {
        *data = value;
        return Ok(());
    }

    let Some((last, head)) = path.parts().split_last() else {
        return Err(PatchError::Op("empty pointer".to_string()));
    };
    let parent = locate_mut(data, head)?;

    match parent {
        Value::Array(items) => match last {
            PointerSegment::Name(name) if name == "-" => {
                items.push(value);
                Ok(())
            }
            PointerSegment::Name(name) => {
                let index = array_index(name, items.len() + 1)?;
                items.insert(index, value);
                Ok(())
            }
            PointerSegment::Index(index) => {
                // An index equal to the length appends.
                if *index < 0 || *index as usize > items.len() {
                    return Err(PatchError::Target(index.to_string()));
                }
                items.insert(*index as usize, value);
                Ok(())
            }
        },
        Value::Object(map) => {
            let key = match last {
                PointerSegment::Name(name) => name.clone(),
                PointerSegment::Index(index) => index.to_string(),
            };
            map.insert(key, value);
            Ok(())
        }
        _ => Err(PatchError::Op(
            "add target parent is not an object or array".to_string(),
        )),
    }
}

fn remove(path: &JsonPointer, data: &mut Value) -> Result<Value, PatchError> {
    if path.is_root() {
        return Err(PatchError::Op("can't remove the root document".to_string()));
    }

    let Some((last, head)) = path.parts().split_last() else {
        return Err(PatchError::Op("empty pointer".to_string()));
    };
    let parent = locate_mut(data, head)?;

    match parent {
        Value::Array(items) => {
            let index = match last {
                PointerSegment::Index(index) => normalize_index(*index, items.len())
                    .ok_or_else(|| PatchError::Target(index.to_string()))?,
                PointerSegment::Name(name) => array_index(name, items.len())?,
            };
            Ok(items.remove(index))
        }
        Value::Object(map) => {
            let key = match last {
                PointerSegment::Name(name) => name.clone(),
                PointerSegment::Index(index) => index.to_string(),
            };
            map.shift_remove(&key)
                .ok_or_else(|| PatchError::Target(key))
        }
        _ => Err(PatchError::Op(
            "remove target parent is not an object or array".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_and_append() {
        let patch = JsonPatch::new()
            .add("/items", json!([]))
            .and_then(|p| p.add("/items/-", json!(1)))
            .and_then(|p| p.add("/items/0", json!(0)))
            .expect("build patch");
        let result = patch.apply(&json!({})).expect("apply");
        assert_eq!(result, json!({"items": [0, 1]}));
    }

    #[test]
    fn move_guards_against_own_children() {
        let patch = JsonPatch::new()
            .move_from("/a", "/a/b")
            .expect("build patch");
        assert!(patch.apply(&json!({"a": {"b": 1}})).is_err());
    }

    #[test]
    fn test_op_failure_stops_application() {
        let patch = JsonPatch::new()
            .test("/a", json!(1))
            .and_then(|p| p.replace("/a", json!(2)))
            .expect("build patch");
        assert!(matches!(
            patch.apply(&json!({"a": 0})),
            Err(PatchError::TestFailure(_))
        ));
        assert_eq!(patch.apply(&json!({"a": 1})).expect("apply"), json!({"a": 2}));
    }
}
