use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The authenticated user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Unique user identifier; the persistence key.
    pub id: String,
    /// Handle, without the leading `@`.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Public profile URL.
    pub url: String,
    /// Avatar image URL.
    pub image_url: String,
}

impl Profile {
    /// Decode a profile from the object found under the response's `data`.
    ///
    /// # Examples
    ///
    /// ```
    /// use feedkit::types::Profile;
    /// use serde_json::json;
    ///
    /// let profile = Profile::from_json(&json!({
    ///     "id": "u1",
    ///     "username": "jdoe",
    ///     "name": "J Doe",
    ///     "url": "http://x/u1",
    ///     "imageUrl": "http://x/u1.png",
    /// }))
    /// .unwrap();
    /// assert_eq!(profile.username, "jdoe");
    /// ```
    pub fn from_json(value: &Value) -> Result<Self> {
        super::from_wire(value)
    }

    /// Encode back into the wire shape accepted by [`from_json`](Self::from_json).
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
