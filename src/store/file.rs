//! JSON-file-backed record store.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use tempfile::NamedTempFile;

use super::{apply_batch, select_kind, BatchReceipt, RecordStore, StoredRecord};
use crate::error::StoreError;
use crate::types::{Record, RecordKey, RecordKind};

/// [`RecordStore`] persisted to a single JSON file.
///
/// Each batch is applied to a copy of the current contents, written to a
/// uniquely named temporary file in the same directory and renamed over the
/// target. The in-memory view
/// only switches to the new contents after the rename succeeded, so a failed
/// write leaves both the file and the view as they were.
///
/// # Examples
///
/// ```no_run
/// use feedkit::store::{JsonFileStore, RecordStore};
///
/// let store = JsonFileStore::open("records.json").unwrap();
/// println!("{} records on disk", store.len());
/// ```
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<HashMap<RecordKey, StoredRecord>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading its contents if the file exists.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the file exists but cannot be read,
    /// [`StoreError::Serialization`] if it is not a valid store file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let bytes = fs::read(&path)?;
            let stored: Vec<StoredRecord> = serde_json::from_slice(&bytes)?;
            stored
                .into_iter()
                .map(|s| (s.record.key(), s))
                .collect()
        } else {
            HashMap::new()
        };
        tracing::debug!(path = %path.display(), count = records.len(), "Opened record store");
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &HashMap<RecordKey, StoredRecord>) -> Result<(), StoreError> {
        let mut ordered: Vec<(&RecordKey, &StoredRecord)> = records.iter().collect();
        ordered.sort_by(|a, b| a.0.cmp(b.0));
        let ordered: Vec<&StoredRecord> = ordered.into_iter().map(|(_, s)| s).collect();
        let bytes = serde_json::to_vec_pretty(&ordered)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn write_batch(&self, records: &[Record]) -> Result<BatchReceipt, StoreError> {
        let mut current = self.records.write();
        let mut next = current.clone();
        let receipt = apply_batch(&mut next, records, Utc::now());

        if receipt.inserted + receipt.updated == 0 {
            return Ok(receipt);
        }
        self.persist(&next)?;
        *current = next;

        tracing::trace!(
            path = %self.path.display(),
            inserted = receipt.inserted,
            updated = receipt.updated,
            "Wrote batch to file store"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Publication;
    use pretty_assertions::assert_eq;

    fn publication(id: &str) -> Record {
        Record::Publication(Publication {
            id: id.into(),
            title: format!("Title {id}"),
            synopsis: "S".into(),
            url: format!("http://x/{id}"),
            image_url: format!("http://x/{id}.png"),
        })
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("store.json")).unwrap();
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn contents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = JsonFileStore::open(&path).unwrap();
        store
            .write_batch(&[publication("p1"), publication("p2")])
            .unwrap();
        let before = store.records(RecordKind::Publication);
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.records(RecordKind::Publication), before);

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("store.json")]);
    }

    #[test]
    fn stores_sharing_a_stem_stay_separate() {
        let dir = tempfile::tempdir().unwrap();
        let json = JsonFileStore::open(dir.path().join("a.json")).unwrap();
        let db = JsonFileStore::open(dir.path().join("a.db")).unwrap();
        let tmp = JsonFileStore::open(dir.path().join("a.tmp")).unwrap();

        json.write_batch(&[publication("p1")]).unwrap();
        db.write_batch(&[publication("p2"), publication("p3")]).unwrap();
        tmp.write_batch(&[publication("p4")]).unwrap();
        json.write_batch(&[publication("p5")]).unwrap();

        let ids = |name: &str| -> Vec<String> {
            JsonFileStore::open(dir.path().join(name))
                .unwrap()
                .records(RecordKind::Publication)
                .iter()
                .map(|s| s.record.id().to_string())
                .collect()
        };
        assert_eq!(ids("a.json"), vec!["p1", "p5"]);
        assert_eq!(ids("a.db"), vec!["p2", "p3"]);
        assert_eq!(ids("a.tmp"), vec!["p4"]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn failed_write_leaves_view_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let store = JsonFileStore::open(sub.join("store.json")).unwrap();
        store.write_batch(&[publication("p1")]).unwrap();

        fs::remove_dir_all(&sub).unwrap();
        let err = store.write_batch(&[publication("p2")]).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(store.len(), 1);
        assert!(store.get(RecordKind::Publication, "p2").is_none());
    }
}
