use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::Value;

use crate::error::MappingError;
use crate::json_ext::Path;
use crate::json_ext::ValueExt;

/// A declarative restructuring of a JSON value: ordered source path to
/// destination path pairs, in the dotted/bracket syntax of [`Path`].
///
/// Pairs apply in entry order. A pair whose source selects nothing is
/// skipped; partially filled form data is normal. A `[]` in the source fans
/// out across an array, and a `[]` in the destination pairs the fanned-out
/// values positionally.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultMap(pub IndexMap<String, String>);

impl ResultMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Apply the mapping to `source`, producing a restructured value.
    ///
    /// The output starts as `Null` and takes whatever shape the destination
    /// paths dictate: an object for key roots, an array for index roots. A
    /// map whose pairs all select nothing yields `Null`.
    ///
    /// Invalid paths, wrong-shape traversal and destination write conflicts
    /// are reported to the caller rather than silently corrupting data; the
    /// caller decides whether they are fatal.
    pub fn apply(&self, source: &Value) -> Result<Value, MappingError> {
        let mut output = Value::Null;

        for (source_path, destination_path) in &self.0 {
            let source_path = Path::parse(source_path)?;
            let destination_path = Path::parse(destination_path)?;

            if destination_path.flatten_count() > 1 {
                return Err(MappingError::InvalidPath {
                    path: destination_path.to_string(),
                    reason: "at most one '[]' is allowed in a destination".to_string(),
                });
            }

            let selected = source.get_path(&source_path)?;
            if selected.is_empty() {
                continue;
            }

            if destination_path.flatten_count() == 1 {
                if source_path.flatten_count() == 0 {
                    return Err(MappingError::FlattenedDestination {
                        path: destination_path.to_string(),
                    });
                }
                for (index, value) in selected.iter().enumerate() {
                    output.insert_at(
                        &destination_path.with_flatten_index(index),
                        (*value).clone(),
                    )?;
                }
            } else if source_path.flatten_count() > 0 {
                // a fanned-out source with a concrete destination writes the
                // collected array
                let collected = selected.into_iter().cloned().collect();
                output.insert_at(&destination_path, Value::Array(collected))?;
            } else if let Some(first) = selected.first() {
                output.insert_at(&destination_path, (*first).clone())?;
            }
        }

        Ok(output)
    }
}

impl<K, V> FromIterator<(K, V)> for ResultMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ResultMap(
            iter.into_iter()
                .map(|(source, destination)| (source.into(), destination.into()))
                .collect(),
        )
    }
}
