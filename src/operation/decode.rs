use async_trait::async_trait;
use serde_json::Value;

use super::{OperationStatus, Step};
use crate::error::{Error, Result};
use crate::types::{json_type, Record, RecordKind};

/// Decode the records found under a response's top-level `data` field.
///
/// - array: each element decoded in order;
/// - object: one record;
/// - absent or `null`: no records (not an error).
///
/// Decoding is all-or-nothing: the first bad element fails the whole call.
///
/// # Examples
///
/// ```
/// use feedkit::operation::decode_records;
/// use feedkit::types::RecordKind;
/// use serde_json::json;
///
/// let records = decode_records(&json!({"data": []}), RecordKind::Publication).unwrap();
/// assert!(records.is_empty());
///
/// let records = decode_records(&json!({}), RecordKind::Profile).unwrap();
/// assert!(records.is_empty());
/// ```
pub fn decode_records(tree: &Value, kind: RecordKind) -> Result<Vec<Record>> {
    match tree.get("data") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(elements)) => elements
            .iter()
            .enumerate()
            .map(|(index, element)| kind.decode(element).map_err(within(format!("data[{index}]"))))
            .collect(),
        Some(object @ Value::Object(_)) => kind
            .decode(object)
            .map(|record| vec![record])
            .map_err(within("data")),
        Some(other) => Err(Error::decode(
            "data",
            format!("expected object or array, found {}", json_type(other)),
        )),
    }
}

/// Prefix a decode error's field with the element's path in the response.
fn within(prefix: impl std::fmt::Display) -> impl FnOnce(Error) -> Error {
    move |err| match err {
        Error::Decode { field, message } if field.is_empty() => {
            Error::decode(prefix.to_string(), message)
        },
        Error::Decode { field, message } => Error::decode(format!("{prefix}.{field}"), message),
        other => other,
    }
}

/// Turns a structured response into typed records.
#[derive(Debug)]
pub struct DecodeStep {
    status: OperationStatus,
    tree: Option<Value>,
    kind: RecordKind,
}

impl DecodeStep {
    /// Create a step that takes ownership of `tree`.
    pub fn new(status: OperationStatus, tree: Value, kind: RecordKind) -> Self {
        Self {
            status,
            tree: Some(tree),
            kind,
        }
    }
}

#[async_trait]
impl Step for DecodeStep {
    type Output = Vec<Record>;

    fn name(&self) -> &'static str {
        "decode"
    }

    fn status(&self) -> &OperationStatus {
        &self.status
    }

    async fn execute(&mut self) -> Result<Vec<Record>> {
        let tree = self.tree.take().unwrap_or(Value::Null);
        match decode_records(&tree, self.kind) {
            Ok(records) => {
                if records.is_empty() {
                    tracing::trace!(kind = %self.kind, "Nothing to decode");
                } else {
                    tracing::debug!(kind = %self.kind, count = records.len(), "Decoded records");
                }
                Ok(records)
            },
            Err(e) => {
                tracing::error!(kind = %self.kind, error = %e, "Error parsing JSON");
                Err(e)
            },
        }
    }
}
