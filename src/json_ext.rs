//! Paths into JSON values, with selection and insertion over
//! [`serde_json_bytes::Value`].
//!
//! Paths use the dotted/bracket syntax found in form configurations:
//! `user.roles[0].name` steps through objects and arrays, `items[].id` fans
//! out across every element of `items`, and `[].label` starts from an array
//! root.

use std::fmt;
use std::str::FromStr;

use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
pub use serde_json_bytes::Value;

use crate::error::MappingError;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// One step into a JSON value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum PathElement {
    /// Fan out across every element of an array.
    Flatten,

    /// An index into an array.
    Index(usize),

    /// A key into an object.
    Key(String),
}

/// A path into a JSON value, in dotted/bracket syntax.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn empty() -> Self {
        Path(Vec::new())
    }

    /// Parse a path from the dotted/bracket syntax.
    pub fn parse(path: impl AsRef<str>) -> Result<Self, MappingError> {
        path.as_ref().parse()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.0.iter()
    }

    pub(crate) fn flatten_count(&self) -> usize {
        self.0
            .iter()
            .filter(|element| **element == PathElement::Flatten)
            .count()
    }

    /// Replace the first `[]` with a concrete index.
    pub(crate) fn with_flatten_index(&self, index: usize) -> Path {
        let mut elements = self.0.clone();
        if let Some(flatten) = elements
            .iter_mut()
            .find(|element| **element == PathElement::Flatten)
        {
            *flatten = PathElement::Index(index);
        }
        Path(elements)
    }
}

impl FromStr for Path {
    type Err = MappingError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| MappingError::InvalidPath {
            path: input.to_string(),
            reason,
        };

        if input.is_empty() {
            return Err(invalid("empty path".to_string()));
        }

        let mut elements = Vec::new();
        let mut rest = input;
        // true at the start of the path and after every `.`
        let mut after_dot = false;

        while !rest.is_empty() {
            if let Some(stripped) = rest.strip_prefix('[') {
                if after_dot {
                    return Err(invalid("expected a key after '.'".to_string()));
                }
                let end = stripped
                    .find(']')
                    .ok_or_else(|| invalid("unclosed '['".to_string()))?;
                let index = &stripped[..end];
                if index.is_empty() {
                    elements.push(PathElement::Flatten);
                } else {
                    let index = index
                        .parse::<usize>()
                        .map_err(|_| invalid(format!("invalid index '{}'", index)))?;
                    elements.push(PathElement::Index(index));
                }
                rest = &stripped[end + 1..];
                if let Some(after) = rest.strip_prefix('.') {
                    if after.is_empty() {
                        return Err(invalid("trailing '.'".to_string()));
                    }
                    rest = after;
                    after_dot = true;
                } else if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid("expected '.', '[' or end after ']'".to_string()));
                }
            } else {
                let end = rest.find(|c| c == '.' || c == '[').unwrap_or(rest.len());
                if end == 0 {
                    return Err(invalid("empty key".to_string()));
                }
                elements.push(PathElement::Key(rest[..end].to_string()));
                rest = &rest[end..];
                if let Some(after) = rest.strip_prefix('.') {
                    if after.is_empty() {
                        return Err(invalid("trailing '.'".to_string()));
                    }
                    rest = after;
                    after_dot = true;
                } else {
                    after_dot = false;
                }
            }
        }

        Ok(Path(elements))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for element in &self.0 {
            match element {
                PathElement::Key(key) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathElement::Index(index) => write!(f, "[{}]", index)?,
                PathElement::Flatten => f.write_str("[]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let path = String::deserialize(deserializer)?;
        path.parse().map_err(de::Error::custom)
    }
}

/// Selection and insertion over [`serde_json_bytes::Value`].
pub trait ValueExt {
    /// Collect the values matching `path`.
    ///
    /// A `[]` element iterates every entry of an array. A missing key or an
    /// out-of-range index selects nothing; traversing a key into a non-object,
    /// an index into a non-array, or flattening a non-array is an error.
    fn get_path<'a>(&'a self, path: &Path) -> Result<Vec<&'a Value>, MappingError>;

    /// Write `value` at `path`, creating intermediate objects and arrays as
    /// needed. Arrays are padded with `Null` up to the written index, capped
    /// at [`MAX_PADDED_INDEX`].
    ///
    /// Writing through an existing value of a conflicting shape is an error
    /// rather than silent corruption. `[]` elements are not writable; the
    /// mapper resolves them to concrete indices first.
    fn insert_at(&mut self, path: &Path, value: Value) -> Result<(), MappingError>;
}

impl ValueExt for Value {
    fn get_path<'a>(&'a self, path: &Path) -> Result<Vec<&'a Value>, MappingError> {
        let mut results = Vec::new();
        match iterate_path(path, &path.0, self, &mut results) {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }

    fn insert_at(&mut self, path: &Path, value: Value) -> Result<(), MappingError> {
        write_at(path, &path.0, self, value)
    }
}

fn iterate_path<'a>(
    full_path: &Path,
    path: &[PathElement],
    data: &'a Value,
    results: &mut Vec<&'a Value>,
) -> Option<MappingError> {
    match path.first() {
        None => {
            results.push(data);
            None
        }
        Some(PathElement::Flatten) => match data.as_array() {
            None => Some(MappingError::InvalidContent {
                path: full_path.to_string(),
                reason: "not an array".to_string(),
            }),
            Some(array) => {
                for value in array {
                    if let Some(err) = iterate_path(full_path, &path[1..], value, results) {
                        return Some(err);
                    }
                }
                None
            }
        },
        Some(PathElement::Index(i)) => match data {
            Value::Array(array) => match array.get(*i) {
                Some(value) => iterate_path(full_path, &path[1..], value, results),
                None => None,
            },
            _ => Some(MappingError::InvalidContent {
                path: full_path.to_string(),
                reason: "not an array".to_string(),
            }),
        },
        Some(PathElement::Key(key)) => match data {
            Value::Object(object) => match object.get(key.as_str()) {
                Some(value) => iterate_path(full_path, &path[1..], value, results),
                None => None,
            },
            _ => Some(MappingError::InvalidContent {
                path: full_path.to_string(),
                reason: "not an object".to_string(),
            }),
        },
    }
}

/// Highest index [`ValueExt::insert_at`] will pad a destination array to. A
/// write that would pad past this limit is rejected as an invalid path.
pub const MAX_PADDED_INDEX: usize = u16::MAX as usize;

fn write_at(
    full_path: &Path,
    path: &[PathElement],
    target: &mut Value,
    value: Value,
) -> Result<(), MappingError> {
    match path.first() {
        None => {
            *target = value;
            Ok(())
        }
        Some(PathElement::Flatten) => Err(MappingError::FlattenedDestination {
            path: full_path.to_string(),
        }),
        Some(PathElement::Key(key)) => {
            if target.is_null() {
                *target = Value::Object(Object::default());
            }
            match target {
                Value::Object(object) => {
                    let slot = object.entry(key.as_str()).or_insert(Value::Null);
                    write_at(full_path, &path[1..], slot, value)
                }
                _ => Err(MappingError::WriteConflict {
                    path: full_path.to_string(),
                    reason: "not an object".to_string(),
                }),
            }
        }
        Some(PathElement::Index(index)) => {
            if target.is_null() {
                *target = Value::Array(Vec::new());
            }
            match target {
                Value::Array(array) => {
                    if array.len() <= *index {
                        if *index > MAX_PADDED_INDEX {
                            return Err(MappingError::InvalidPath {
                                path: full_path.to_string(),
                                reason: format!(
                                    "index {} exceeds the padding limit of {}",
                                    index, MAX_PADDED_INDEX,
                                ),
                            });
                        }
                        array.resize(index + 1, Value::Null);
                    }
                    write_at(full_path, &path[1..], &mut array[*index], value)
                }
                _ => Err(MappingError::WriteConflict {
                    path: full_path.to_string(),
                    reason: "not an array".to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    fn path(input: &str) -> Path {
        Path::parse(input).unwrap()
    }

    #[test]
    fn parse_keys_indices_and_flatten() {
        assert_eq!(
            path("user.roles[0].name").0,
            vec![
                PathElement::Key("user".to_string()),
                PathElement::Key("roles".to_string()),
                PathElement::Index(0),
                PathElement::Key("name".to_string()),
            ],
        );
        assert_eq!(
            path("items[].id").0,
            vec![
                PathElement::Key("items".to_string()),
                PathElement::Flatten,
                PathElement::Key("id".to_string()),
            ],
        );
        assert_eq!(
            path("[].label").0,
            vec![
                PathElement::Flatten,
                PathElement::Key("label".to_string()),
            ],
        );
        assert_eq!(
            path("a[0][1]").0,
            vec![
                PathElement::Key("a".to_string()),
                PathElement::Index(0),
                PathElement::Index(1),
            ],
        );
        assert_eq!(path("[3]").0, vec![PathElement::Index(3)]);
    }

    #[test]
    fn display_round_trips() {
        for input in [
            "user.roles[0].name",
            "items[].id",
            "[].label",
            "a[0][1].b",
            "[3]",
            "single",
        ] {
            assert_eq!(path(input).to_string(), input);
        }
    }

    #[test]
    fn parse_rejects_malformed_paths() {
        for input in ["", "a..b", "a.", ".a", "a[", "a[x]", "a[-1]", "a.[0]", "a[0]b"] {
            assert!(
                matches!(
                    Path::parse(input),
                    Err(MappingError::InvalidPath { .. })
                ),
                "expected '{}' to be rejected",
                input,
            );
        }
    }

    #[test]
    fn serde_uses_the_string_syntax() {
        let path: Path = serde_json::from_str(r#""items[].id""#).unwrap();
        assert_eq!(path, Path::parse("items[].id").unwrap());
        assert_eq!(
            serde_json::to_string(&path).unwrap(),
            r#""items[].id""#,
        );
        assert!(serde_json::from_str::<Path>(r#""a..b""#).is_err());
    }

    #[test]
    fn get_path_selects_nested_values() {
        let data = json!({"user": {"roles": [{"name": "admin"}, {"name": "guest"}]}});
        assert_eq!(
            data.get_path(&path("user.roles[1].name")).unwrap(),
            vec![&json!("guest")],
        );
        assert_eq!(
            data.get_path(&path("user.roles[].name")).unwrap(),
            vec![&json!("admin"), &json!("guest")],
        );
    }

    #[test]
    fn get_path_selects_nothing_for_missing_entries() {
        let data = json!({"user": {"roles": []}});
        assert!(data.get_path(&path("user.email")).unwrap().is_empty());
        assert!(data.get_path(&path("user.roles[4]")).unwrap().is_empty());
        assert!(data.get_path(&path("user.roles[].name")).unwrap().is_empty());
    }

    #[test]
    fn get_path_errors_on_wrong_shapes() {
        let data = json!({"user": {"age": 30, "roles": ["admin"]}});
        assert!(matches!(
            data.get_path(&path("user.age.years")),
            Err(MappingError::InvalidContent { reason, .. }) if reason == "not an object"
        ));
        assert!(matches!(
            data.get_path(&path("user.age[0]")),
            Err(MappingError::InvalidContent { reason, .. }) if reason == "not an array"
        ));
        assert!(matches!(
            data.get_path(&path("user[].roles")),
            Err(MappingError::InvalidContent { reason, .. }) if reason == "not an array"
        ));
    }

    #[test]
    fn insert_at_builds_intermediate_containers() {
        let mut out = Value::Null;
        out.insert_at(&path("meta.user.name"), json!("Alice")).unwrap();
        out.insert_at(&path("meta.tags[2]"), json!("x")).unwrap();
        assert_eq!(
            out,
            json!({"meta": {"user": {"name": "Alice"}, "tags": [null, null, "x"]}}),
        );
    }

    #[test]
    fn insert_at_array_root() {
        let mut out = Value::Null;
        out.insert_at(&path("[1].id"), json!(2)).unwrap();
        out.insert_at(&path("[0].id"), json!(1)).unwrap();
        assert_eq!(out, json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn insert_at_overwrites_existing_values() {
        let mut out = json!({"a": 1});
        out.insert_at(&path("a"), json!(2)).unwrap();
        assert_eq!(out, json!({"a": 2}));
    }

    #[test]
    fn insert_at_errors_on_conflicting_shapes() {
        let mut scalar_in_the_way = json!({"a": 1});
        assert!(matches!(
            scalar_in_the_way.insert_at(&path("a.b"), json!(2)),
            Err(MappingError::WriteConflict { reason, .. }) if reason == "not an object"
        ));

        let mut object_in_the_way = json!({"a": {}});
        assert!(matches!(
            object_in_the_way.insert_at(&path("a[0]"), json!(2)),
            Err(MappingError::WriteConflict { reason, .. }) if reason == "not an array"
        ));
    }

    #[test]
    fn insert_at_bounds_array_padding() {
        let mut out = Value::Null;
        assert!(matches!(
            out.insert_at(&path("list[1000000]"), json!(1)),
            Err(MappingError::InvalidPath { reason, .. }) if reason.contains("padding limit")
        ));
    }

    #[test]
    fn insert_at_rejects_flattened_paths() {
        let mut out = Value::Null;
        assert!(matches!(
            out.insert_at(&path("items[].id"), json!(1)),
            Err(MappingError::FlattenedDestination { .. })
        ));
    }
}
