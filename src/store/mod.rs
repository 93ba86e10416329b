//! Local record storage.
//!
//! # Architecture
//!
//! [`RecordStore`] is the persistence collaborator used through
//! `Arc<dyn RecordStore>` by [`PersistStep`](crate::operation::PersistStep).
//! Its only mutation entry point is [`RecordStore::write_batch`], an atomic
//! insert-or-update keyed by `(kind, id)`: either every record of the batch
//! becomes visible or none does.
//!
//! # Backends
//!
//! - [`MemoryStore`] -- process-local map behind a `parking_lot` lock.
//! - [`JsonFileStore`] -- the same map persisted to a JSON file, replaced
//!   atomically on every batch.
//!
//! # Upsert semantics
//!
//! A write with a new key inserts the record at version 1. A write with an
//! existing key replaces every field and bumps the version, unless the
//! record is identical to the stored one, in which case nothing changes.
//! Records are never deleted.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{Record, RecordKey, RecordKind};

/// A record as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The record itself.
    pub record: Record,
    /// Per-key write counter, starting at 1.
    pub version: u64,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one batch write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReceipt {
    /// Keys seen for the first time.
    pub inserted: usize,
    /// Existing keys whose record changed.
    pub updated: usize,
    /// Existing keys rewritten with an identical record.
    pub unchanged: usize,
}

impl BatchReceipt {
    /// Total records in the batch.
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

/// Insert-or-update store for decoded records.
///
/// Implementations must be safe to share between threads. `write_batch` is
/// synchronous; async callers hand it to the blocking pool.
pub trait RecordStore: Send + Sync {
    /// Atomically upsert every record in `records`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the batch could not be made durable. The
    /// store's visible contents are then unchanged.
    fn write_batch(&self, records: &[Record]) -> Result<BatchReceipt, StoreError>;

    /// Look up one record.
    fn get(&self, kind: RecordKind, id: &str) -> Option<StoredRecord>;

    /// Every stored record of `kind`, ordered by id.
    fn records(&self, kind: RecordKind) -> Vec<StoredRecord>;

    /// Number of stored records across all kinds.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Apply `records` to `map` in order, later duplicates winning.
pub(crate) fn apply_batch(
    map: &mut HashMap<RecordKey, StoredRecord>,
    records: &[Record],
    now: DateTime<Utc>,
) -> BatchReceipt {
    let mut receipt = BatchReceipt::default();
    for record in records {
        match map.get_mut(&record.key()) {
            Some(stored) if stored.record == *record => receipt.unchanged += 1,
            Some(stored) => {
                stored.record = record.clone();
                stored.version += 1;
                stored.updated_at = now;
                receipt.updated += 1;
            },
            None => {
                map.insert(
                    record.key(),
                    StoredRecord {
                        record: record.clone(),
                        version: 1,
                        updated_at: now,
                    },
                );
                receipt.inserted += 1;
            },
        }
    }
    receipt
}

/// Records of one kind from `map`, sorted by id.
pub(crate) fn select_kind(
    map: &HashMap<RecordKey, StoredRecord>,
    kind: RecordKind,
) -> Vec<StoredRecord> {
    let mut selected: Vec<StoredRecord> = map
        .iter()
        .filter(|(key, _)| key.kind == kind)
        .map(|(_, stored)| stored.clone())
        .collect();
    selected.sort_by(|a, b| a.record.id().cmp(b.record.id()));
    selected
}
