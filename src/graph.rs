//! Declarative form-to-GraphQL bindings.
//!
//! Form configurations describe, per operation, how a completed GraphQL
//! result becomes form data. The types here deserialize from that
//! configuration (JSON or YAML, camelCase names) with documented defaults for
//! omitted fields.

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::Value;

use crate::error::MappingError;
use crate::result_map::ResultMap;

/// Shape of the value a graph element produces.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultType {
    /// The form value is an ordered sequence; new data appends or replaces.
    Array,

    /// The form value is a single object or scalar.
    #[default]
    Object,
}

/// How new data combines with the current form value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// Union object fields, or append array items, onto the current value.
    #[default]
    Merge,

    /// New data wholly supersedes the current value.
    Replace,
}

/// Merge configuration for one named GraphQL operation.
///
/// Supplied by form configuration, static per form. `name` identifies the
/// operation whose payload this element consumes; everything else describes
/// how that payload becomes the next form value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct GraphElement {
    /// The operation name keyed into the GraphQL result.
    pub name: String,

    /// The GraphQL document this element executes. Carried for completeness
    /// of form configurations; opaque to the merge engine.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,

    /// Shape of the merged form value. Defaults to [`ResultType::Object`].
    #[serde(default)]
    pub result_type: ResultType,

    /// Optional key projecting the payload before merging.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result_key: Option<String>,

    /// How new data combines with the current form value. Defaults to
    /// [`MergeStrategy::Merge`].
    #[serde(default)]
    pub merge_strategy: MergeStrategy,

    /// Structural remap applied after merge/replace, always last. An empty
    /// map is equivalent to no map.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result_map: Option<ResultMap>,

    /// Map building the operation's variables from a scope value.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub variables: Option<ResultMap>,
}

#[buildstructor::buildstructor]
impl GraphElement {
    /// Constructor
    #[builder(visibility = "pub")]
    fn new(
        name: String,
        text: Option<String>,
        result_type: Option<ResultType>,
        result_key: Option<String>,
        merge_strategy: Option<MergeStrategy>,
        result_map: Option<ResultMap>,
        variables: Option<ResultMap>,
    ) -> Self {
        Self {
            name,
            text,
            result_type: result_type.unwrap_or_default(),
            result_key,
            merge_strategy: merge_strategy.unwrap_or_default(),
            result_map,
            variables,
        }
    }

    /// The result map, if configured and non-empty.
    pub(crate) fn active_result_map(&self) -> Option<&ResultMap> {
        self.result_map.as_ref().filter(|map| !map.is_empty())
    }

    /// Build the operation's variables from a caller-supplied scope value.
    ///
    /// Returns `Ok(None)` when no (or an empty) variables map is configured.
    /// Mapping failures propagate so callers can tell a failed mapping apart
    /// from an unconfigured one.
    pub fn map_variables(&self, scope: &Value) -> Result<Option<Value>, MappingError> {
        match self.variables.as_ref().filter(|map| !map.is_empty()) {
            Some(map) => map.apply(scope).map(Some),
            None => Ok(None),
        }
    }
}

/// The graph bindings of one form: a root query, optional named auxiliary
/// queries, and mutation elements keyed by form mode (`new`, `edit`,
/// `delete`, ...). Entry order follows the form configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormGraphDefinition {
    /// The form's root query.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub query: Option<GraphElement>,

    /// Auxiliary queries, keyed by a form-local name.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub queries: IndexMap<String, GraphElement>,

    /// Mutations, keyed by form mode.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub mutation: IndexMap<String, GraphElement>,
}

impl FormGraphDefinition {
    /// Resolve the element whose `name` matches a completed operation,
    /// searching the root query, auxiliary queries, then mutations in
    /// definition order.
    pub fn element_for_operation(&self, operation: &str) -> Option<&GraphElement> {
        self.query
            .iter()
            .chain(self.queries.values())
            .chain(self.mutation.values())
            .find(|element| element.name == operation)
    }
}
