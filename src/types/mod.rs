//! Domain records decoded from API responses.
//!
//! The set of record types is closed: [`Profile`] and [`Publication`],
//! wrapped in [`Record`] and selected by [`RecordKind`]. Each type derives
//! its API wire shape (camelCase field names) and exposes it through
//! `from_json` and `to_json`.

mod profile;
mod publication;
mod record;

pub use profile::Profile;
pub use publication::Publication;
pub use record::{Record, RecordKey, RecordKind};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Decode a record from its derived wire shape.
///
/// A missing field is reported under its wire name. Other shape errors
/// carry serde's message with an empty field path.
pub(crate) fn from_wire<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| wire_error(&e))
}

fn wire_error(err: &serde_json::Error) -> Error {
    let message = err.to_string();
    match message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        Some(field) => Error::decode(field, "missing required field"),
        None => Error::decode("", message),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
