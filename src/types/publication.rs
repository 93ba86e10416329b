use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A publication the user can contribute to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    /// Unique publication identifier; the persistence key.
    pub id: String,
    /// Publication name (`name` on the wire).
    #[serde(rename = "name")]
    pub title: String,
    /// Short description (`description` on the wire).
    #[serde(rename = "description")]
    pub synopsis: String,
    /// Publication homepage.
    pub url: String,
    /// Logo image URL.
    pub image_url: String,
}

impl Publication {
    /// Decode one element of the `data` array.
    pub fn from_json(value: &Value) -> Result<Self> {
        super::from_wire(value)
    }

    /// Encode back into the wire shape.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn maps_wire_names() {
        let publication = Publication::from_json(&json!({
            "id": "p1",
            "name": "T1",
            "description": "S1",
            "url": "http://x/p1",
            "imageUrl": "http://x/p1.png",
        }))
        .unwrap();
        assert_eq!(publication.title, "T1");
        assert_eq!(publication.synopsis, "S1");
        let wire = publication.to_json();
        assert_eq!(wire["name"], "T1");
        assert_eq!(wire["description"], "S1");
        assert_eq!(wire["imageUrl"], "http://x/p1.png");
        assert!(wire.get("title").is_none());
    }

    #[test]
    fn missing_description_fails() {
        let err = Publication::from_json(&json!({
            "id": "p1",
            "name": "T1",
            "url": "http://x/p1",
            "imageUrl": "http://x/p1.png",
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Decode { ref field, .. } if field == "description"));
    }
}
