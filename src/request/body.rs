//! JSON request bodies.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A flat string-to-string JSON object sent as a request body.
///
/// # Examples
///
/// ```
/// use feedkit::request::HttpBody;
///
/// let mut body = HttpBody::new();
/// body.add("title", "Hello");
/// let bytes = body.encode().unwrap();
/// let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
/// assert_eq!(value["title"], "Hello");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpBody {
    values: BTreeMap<String, String>,
}

impl HttpBody {
    /// Create an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a body from existing key/value pairs.
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Insert or replace a value.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// The current key/value pairs.
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Render the body as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.values)
            .map_err(|e| Error::invalid_request(format!("cannot encode body: {e}")))
    }

    /// Render the body as UTF-8 JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.to_json().map(String::into_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn add_replaces_existing_key() {
        let mut body = HttpBody::from_values([("title", "draft")]);
        body.add("title", "final");
        body.add("contentFormat", "html");
        assert_eq!(body.values().len(), 2);
        assert_eq!(body.values()["title"], "final");
    }

    #[test]
    fn encodes_as_json_object() {
        let body = HttpBody::from_values([("a", "1"), ("b", "2")]);
        let value: Value = serde_json::from_slice(&body.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"a": "1", "b": "2"}));
        assert!(body.to_json().unwrap().contains('\n'));
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(HttpBody::new().to_json().unwrap(), "{}");
    }
}
