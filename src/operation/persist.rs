use std::sync::Arc;

use async_trait::async_trait;

use super::{OperationStatus, Step};
use crate::error::{Error, Result, StoreError};
use crate::store::RecordStore;
use crate::types::Record;

/// Upserts decoded records into a [`RecordStore`] as one atomic batch.
///
/// The write runs on tokio's blocking pool. Once started it is not
/// interrupted; cancellation is only honoured before the write begins.
pub struct PersistStep {
    status: OperationStatus,
    store: Arc<dyn RecordStore>,
    records: Option<Vec<Record>>,
}

impl PersistStep {
    /// Create a step that will write `records` to `store`.
    pub fn new(status: OperationStatus, store: Arc<dyn RecordStore>, records: Vec<Record>) -> Self {
        Self {
            status,
            store,
            records: Some(records),
        }
    }
}

impl std::fmt::Debug for PersistStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistStep")
            .field("status", &self.status.state())
            .field("records", &self.records.as_ref().map(Vec::len))
            .finish()
    }
}

#[async_trait]
impl Step for PersistStep {
    type Output = Vec<Record>;

    fn name(&self) -> &'static str {
        "persist"
    }

    fn status(&self) -> &OperationStatus {
        &self.status
    }

    fn abortable(&self) -> bool {
        false
    }

    async fn execute(&mut self) -> Result<Vec<Record>> {
        let records = self.records.take().unwrap_or_default();
        let store = self.store.clone();

        let written = tokio::task::spawn_blocking(move || {
            store
                .write_batch(&records)
                .map(|receipt| (records, receipt))
        })
        .await
        .map_err(|e| StoreError::Backend {
            message: format!("store task failed: {e}"),
        })
        .and_then(|outcome| outcome);

        match written {
            Ok((records, receipt)) => {
                tracing::info!(
                    inserted = receipt.inserted,
                    updated = receipt.updated,
                    unchanged = receipt.unchanged,
                    "Successfully wrote {} records",
                    records.len()
                );
                Ok(records)
            },
            Err(e) => {
                tracing::error!(error = %e, "Error writing to store");
                Err(Error::Store(e))
            },
        }
    }
}
