//! Output Extractor: normalises whatever a run reports as its output into a
//! single payload.
//!
//! Agent frameworks disagree on the envelope: some return
//! `{ "output": [{ "content": X }] }`, some `{ "output": X }`, some just `X`.
//! Extraction tries, in order, `raw.output[0]` (and its `content`/`output`
//! field), `raw.output`, then `raw` itself. It is total: an unrecognised shape
//! yields `None` ("no result yet"), never an error.

use serde_json::Value;

/// Field names an array element may carry its payload under, checked in order.
const ITEM_PAYLOAD_FIELDS: [&str; 2] = ["content", "output"];

/// Classification of a raw run output by envelope shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawOutput<'a> {
    /// Missing or null.
    Absent,
    /// `{ "output": [ .. ] }`, holding the array value.
    Listed(&'a Value),
    /// `{ "output": <non-array> }`
    Wrapped(&'a Value),
    /// Any other value, taken as the payload itself.
    Bare(&'a Value),
}

impl<'a> RawOutput<'a> {
    pub fn classify(raw: Option<&'a Value>) -> Self {
        match raw {
            None | Some(Value::Null) => RawOutput::Absent,
            Some(value) => match value.get("output") {
                Some(list @ Value::Array(_)) => RawOutput::Listed(list),
                Some(inner) => RawOutput::Wrapped(inner),
                None => RawOutput::Bare(value),
            },
        }
    }

    /// The first meaningful payload this envelope holds.
    pub fn payload(self) -> Option<&'a Value> {
        match self {
            RawOutput::Absent => None,
            RawOutput::Listed(list) => list
                .get(0)
                .map(unwrap_item)
                .filter(|v| is_meaningful(v))
                .or_else(|| {
                    let items = list.as_array()?;
                    items.iter().any(is_meaningful).then_some(list)
                }),
            RawOutput::Wrapped(inner) | RawOutput::Bare(inner) => {
                Some(inner).filter(|v| is_meaningful(v))
            }
        }
    }
}

/// Extracts the payload from a run's raw output. `None` means the run has not
/// produced anything usable yet.
pub fn extract_output(raw: Option<&Value>) -> Option<Value> {
    RawOutput::classify(raw).payload().cloned()
}

fn unwrap_item(item: &Value) -> &Value {
    ITEM_PAYLOAD_FIELDS
        .iter()
        .find_map(|field| item.get(*field).filter(|v| is_meaningful(v)))
        .unwrap_or(item)
}

/// Null and empty containers/strings carry no result.
fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
