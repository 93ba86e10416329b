//! In-memory record store.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use super::{apply_batch, select_kind, BatchReceipt, RecordStore, StoredRecord};
use crate::error::StoreError;
use crate::types::{Record, RecordKey, RecordKind};

/// Thread-safe in-memory [`RecordStore`].
///
/// A batch is applied under a single write lock, so readers never observe
/// half of it.
///
/// # Examples
///
/// ```
/// use feedkit::store::{MemoryStore, RecordStore};
/// use feedkit::types::{Profile, Record, RecordKind};
///
/// let store = MemoryStore::new();
/// let profile = Record::Profile(Profile {
///     id: "u1".into(),
///     username: "jdoe".into(),
///     name: "J Doe".into(),
///     url: "http://x/u1".into(),
///     image_url: "http://x/u1.png".into(),
/// });
///
/// let receipt = store.write_batch(&[profile.clone()]).unwrap();
/// assert_eq!(receipt.inserted, 1);
/// assert_eq!(store.get(RecordKind::Profile, "u1").unwrap().record, profile);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordKey, StoredRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn write_batch(&self, records: &[Record]) -> Result<BatchReceipt, StoreError> {
        let mut map = self.records.write();
        let receipt = apply_batch(&mut map, records, Utc::now());
        tracing::trace!(
            inserted = receipt.inserted,
            updated = receipt.updated,
            unchanged = receipt.unchanged,
            "Applied batch to memory store"
        );
        Ok(receipt)
    }

    fn get(&self, kind: RecordKind, id: &str) -> Option<StoredRecord> {
        self.records.read().get(&RecordKey::new(kind, id)).cloned()
    }

    fn records(&self, kind: RecordKind) -> Vec<StoredRecord> {
        select_kind(&self.records.read(), kind)
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}
