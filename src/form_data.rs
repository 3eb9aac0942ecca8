use serde_json_bytes::Value;

use crate::graph::GraphElement;
use crate::graph::MergeStrategy;
use crate::graph::ResultType;
use crate::json_ext::Object;

/// Compute the next form-data value from a completed GraphQL operation.
///
/// `graph_result` maps operation names to payloads; `form_data` is the value
/// currently held by the form (`Null` when the form has none); `element`
/// describes how the named operation's payload becomes the next value.
///
/// Returns `None` if and only if `graph_result` has no entry named
/// `element.name`. `None` means "no update", never an error. Inputs are never
/// mutated; the result is built from copies. Result-map failures are logged
/// and the best available unmapped value is returned instead.
#[tracing::instrument(skip_all, level = "trace")]
pub fn next_form_data(
    graph_result: &Object,
    form_data: &Value,
    element: &GraphElement,
) -> Option<Value> {
    let payload = match graph_result.get(element.name.as_str()) {
        Some(payload) => payload,
        None => {
            failfast_debug!("no result for operation {:?}", element.name);
            return None;
        }
    };

    let next = match element.result_type {
        ResultType::Array => next_array(payload, form_data, element),
        ResultType::Object => next_object(payload, form_data, element),
    };

    Some(next)
}

fn next_array(payload: &Value, form_data: &Value, element: &GraphElement) -> Value {
    let mut next = match (element.merge_strategy, form_data.as_array()) {
        (MergeStrategy::Merge, Some(current)) => current.clone(),
        _ => Vec::new(),
    };

    // the source sequence: the projected payload if it is an array, the
    // payload itself otherwise
    let source = element
        .result_key
        .as_deref()
        .and_then(|key| payload.as_object().and_then(|payload| payload.get(key)))
        .and_then(Value::as_array)
        .or_else(|| payload.as_array());

    if let Some(source) = source {
        match element.merge_strategy {
            MergeStrategy::Replace => next = source.clone(),
            MergeStrategy::Merge => next.extend(source.iter().cloned()),
        }
    }

    remap_or_keep(Value::Array(next), element)
}

fn next_object(payload: &Value, form_data: &Value, element: &GraphElement) -> Value {
    let value = match element.result_key.as_deref() {
        Some(key) => payload
            .as_object()
            .and_then(|payload| payload.get(key))
            .cloned()
            .unwrap_or(Value::Null),
        None => payload.clone(),
    };

    match element.merge_strategy {
        MergeStrategy::Replace => remap_or_keep(value, element),
        MergeStrategy::Merge => match element.active_result_map() {
            Some(map) => {
                let merged = shallow_union(form_data, &value);
                match map.apply(&merged) {
                    Ok(mapped) => mapped,
                    Err(err) => {
                        failfast_error!(
                            "result map for operation {:?} failed: {}",
                            element.name,
                            err
                        );
                        // the projection is discarded here on purpose: the
                        // fallback unions the raw payload, as does the
                        // no-map branch below
                        shallow_union(form_data, payload)
                    }
                }
            }
            None => shallow_union(form_data, payload),
        },
    }
}

/// Apply the element's result map, if any, keeping `value` when the map
/// fails.
fn remap_or_keep(value: Value, element: &GraphElement) -> Value {
    match element.active_result_map() {
        Some(map) => match map.apply(&value) {
            Ok(mapped) => mapped,
            Err(err) => {
                failfast_error!(
                    "result map for operation {:?} failed: {}",
                    element.name,
                    err
                );
                value
            }
        },
        None => value,
    }
}

/// Shallow union of two values: operands that are not objects contribute no
/// keys, right-hand keys win.
fn shallow_union(left: &Value, right: &Value) -> Value {
    let mut union = Object::default();
    for side in [left, right] {
        if let Value::Object(fields) = side {
            for (key, value) in fields {
                union.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(union)
}
