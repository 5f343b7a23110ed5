//! Dotted-path access into untyped JSON trees.
//!
//! Paths such as `customer.address.zip` walk objects by key and arrays by
//! numeric index. Resolution distinguishes a missing segment from a segment
//! that exists but is not a scalar, because callers treat the two
//! differently when building identifiers.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::AlyanteError;

/// Failure while resolving a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("path '{path}' not found (missing segment '{segment}')")]
    NotFound { path: String, segment: String },

    #[error("path '{path}' resolves to a nested structure, not a scalar")]
    NotScalar { path: String },
}

impl From<PathError> for AlyanteError {
    fn from(err: PathError) -> Self {
        AlyanteError::InvalidInput(err.to_string())
    }
}

/// First segment of a dotted path (`order.lines.0` → `order`).
pub fn first_segment(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Everything after the first segment (`order.lines.0` → `lines.0`).
pub fn rest_segments(path: &str) -> Option<&str> {
    path.split_once('.').map(|(_, rest)| rest).filter(|rest| !rest.is_empty())
}

/// Resolve `path` against `root`.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let mut current = root;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        };

        current = next.ok_or_else(|| PathError::NotFound {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }

    Ok(current)
}

/// Resolve `path` and render the scalar found there as a string.
///
/// Strings are returned verbatim, numbers and booleans in their JSON form and
/// `null` as the empty string. Objects and arrays yield
/// [`PathError::NotScalar`].
pub fn resolve_scalar(root: &Value, path: &str) -> Result<String, PathError> {
    match resolve(root, path)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Object(_) | Value::Array(_) => {
            Err(PathError::NotScalar { path: path.to_string() })
        }
    }
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Non-object intermediates are replaced by objects.
pub fn set(root: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments.split_last().ok_or(PathError::Empty)?;

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => {
                map.entry((*segment).to_string()).or_insert_with(|| Value::Object(Map::new()))
            }
            _ => {
                return Err(PathError::NotFound {
                    path: path.to_string(),
                    segment: (*segment).to_string(),
                })
            }
        };
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert((*last).to_string(), value);
    }

    Ok(())
}
