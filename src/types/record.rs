use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Profile, Publication};
use crate::error::Result;

/// Selects which record type a pipeline decodes.
///
/// # Examples
///
/// ```
/// use feedkit::types::{Record, RecordKind};
/// use serde_json::json;
///
/// let record = RecordKind::Publication
///     .decode(&json!({
///         "id": "p1",
///         "name": "T1",
///         "description": "S1",
///         "url": "http://x/p1",
///         "imageUrl": "http://x/p1.png",
///     }))
///     .unwrap();
/// assert_eq!(record.kind(), RecordKind::Publication);
/// assert_eq!(record.id(), "p1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// [`Profile`] records.
    Profile,
    /// [`Publication`] records.
    Publication,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Publication => write!(f, "publication"),
        }
    }
}

impl RecordKind {
    /// Decode one unwrapped element with this kind's decoder.
    pub fn decode(&self, value: &Value) -> Result<Record> {
        match self {
            Self::Profile => Profile::from_json(value).map(Record::Profile),
            Self::Publication => Publication::from_json(value).map(Record::Publication),
        }
    }
}

/// A decoded domain record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    /// A user profile.
    Profile(Profile),
    /// A publication.
    Publication(Publication),
}

impl Record {
    /// The record's type.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Profile(_) => RecordKind::Profile,
            Self::Publication(_) => RecordKind::Publication,
        }
    }

    /// The record's identifier, unique within its kind.
    pub fn id(&self) -> &str {
        match self {
            Self::Profile(p) => &p.id,
            Self::Publication(p) => &p.id,
        }
    }

    /// The persistence key `(kind, id)`.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.kind(), self.id())
    }

    /// Encode into the API wire shape.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Profile(p) => p.to_json(),
            Self::Publication(p) => p.to_json(),
        }
    }

    /// Borrow the profile, if this is one.
    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            Self::Profile(p) => Some(p),
            Self::Publication(_) => None,
        }
    }

    /// Borrow the publication, if this is one.
    pub fn as_publication(&self) -> Option<&Publication> {
        match self {
            Self::Publication(p) => Some(p),
            Self::Profile(_) => None,
        }
    }
}

impl From<Profile> for Record {
    fn from(profile: Profile) -> Self {
        Self::Profile(profile)
    }
}

impl From<Publication> for Record {
    fn from(publication: Publication) -> Self {
        Self::Publication(publication)
    }
}

/// Store key for a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    /// Record type.
    pub kind: RecordKind,
    /// Identifier within the type.
    pub id: String,
}

impl RecordKey {
    /// Create a key.
    pub fn new(kind: RecordKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> Record {
        Record::Profile(Profile {
            id: "u1".into(),
            username: "jdoe".into(),
            name: "J Doe".into(),
            url: "http://x/u1".into(),
            image_url: "http://x/u1.png".into(),
        })
    }

    #[test]
    fn key_combines_kind_and_id() {
        let record = profile();
        assert_eq!(record.key(), RecordKey::new(RecordKind::Profile, "u1"));
        assert_eq!(record.key().to_string(), "profile:u1");
        assert!(record.as_profile().is_some());
        assert!(record.as_publication().is_none());
    }

    #[test]
    fn same_id_different_kind_are_distinct_keys() {
        let a = RecordKey::new(RecordKind::Profile, "x");
        let b = RecordKey::new(RecordKind::Publication, "x");
        assert_ne!(a, b);
    }

    #[test]
    fn kind_decode_roundtrips_through_encoder() {
        let record = profile();
        let decoded = record.kind().decode(&record.to_json()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn serde_representation_is_tagged() {
        let value = serde_json::to_value(profile()).unwrap();
        assert_eq!(value["type"], "profile");
        assert_eq!(value["imageUrl"], "http://x/u1.png");
        let back: Record = serde_json::from_value(value).unwrap();
        assert_eq!(back, profile());
        assert_eq!(json!(RecordKind::Publication), json!("publication"));
    }
}
