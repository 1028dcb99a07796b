//! Import, export, backup, restore and bulk-clear operations.
//!
//! Bulk writes always go through [`DataAdminService::commit_chunked`]: the
//! backend caps the number of writes per transaction, so batches are split
//! into chunks (default 400). Each chunk commits atomically; a failed chunk
//! aborts the remainder but already-committed chunks stay. Best-effort bulk
//! mutation, not all-or-nothing.

mod backup;
mod csv_io;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use ascend_core::{new_document_id, AppError, AppResult};
use ascend_domain::{Lead, Prospect, UserProfile};
use chrono::{DateTime, Utc};

pub use backup::{parse_backup, serialize_backup, BackupData, BackupFile, BACKUP_VERSION};
pub use csv_io::{
    export_activities_csv, export_leads_csv, export_performance_csv, export_prospects_csv,
    export_source_counts_csv, export_status_counts_csv, parse_prospects_csv,
};

use crate::store_ports::{collections, encode_entity, BatchWrite, DocumentStore, Query};

/// Confirmation phrase required by the destructive clear-all operation.
pub const CLEAR_ALL_CONFIRMATION: &str = "DELETE EVERYTHING";

/// Default per-transaction write limit of the backend.
pub const DEFAULT_BATCH_CHUNK_SIZE: usize = 400;

/// Tunables for bulk writes.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Maximum writes per committed chunk.
    pub chunk_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_BATCH_CHUNK_SIZE,
        }
    }
}

/// What a restore wrote back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Restored prospect count.
    pub prospects: usize,
    /// Restored lead count.
    pub leads: usize,
}

/// Bulk data operations over the document store.
#[derive(Clone)]
pub struct DataAdminService {
    store: Arc<dyn DocumentStore>,
    config: BatchConfig,
}

impl DataAdminService {
    /// Creates the service with the given batch tunables.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: BatchConfig) -> Self {
        Self { store, config }
    }

    /// Commits writes in chunks of at most `chunk_size`.
    ///
    /// Returns the number of writes committed. On a chunk failure the error
    /// carries on; earlier chunks are NOT rolled back.
    pub async fn commit_chunked(&self, writes: Vec<BatchWrite>) -> AppResult<usize> {
        let chunk_size = self.config.chunk_size.max(1);
        let total = writes.len();
        let mut committed = 0_usize;

        let mut remaining = writes;
        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(chunk_size));
            let chunk = std::mem::replace(&mut remaining, rest);
            let chunk_len = chunk.len();
            if let Err(error) = self.store.commit(chunk).await {
                tracing::warn!(committed, total, %error, "bulk write aborted mid-batch");
                return Err(AppError::Backend(format!(
                    "bulk write failed after {committed} of {total} writes: {error}"
                )));
            }
            committed += chunk_len;
        }

        Ok(committed)
    }

    /// Deletes every document in a collection, chunked.
    pub async fn clear_collection(&self, collection: &str) -> AppResult<usize> {
        let documents = self.store.get(&Query::collection(collection)).await?;
        let deletes: Vec<BatchWrite> = documents
            .into_iter()
            .map(|document| BatchWrite::Delete {
                collection: collection.to_owned(),
                id: document.id,
            })
            .collect();

        self.commit_chunked(deletes).await
    }

    /// Parses a prospect CSV and writes the rows, chunked.
    ///
    /// The whole operation aborts before any write when the header row is
    /// unusable; per-row problems fall back to defaults instead of failing.
    pub async fn import_prospects(
        &self,
        csv_text: &str,
        importer: &UserProfile,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let prospects = parse_prospects_csv(csv_text, importer, now)?;
        let writes: Vec<BatchWrite> = prospects
            .iter()
            .map(|prospect| {
                Ok(BatchWrite::Set {
                    collection: collections::PROSPECTS.to_owned(),
                    id: new_document_id(),
                    data: encode_entity(prospect)?,
                })
            })
            .collect::<AppResult<_>>()?;

        self.commit_chunked(writes).await
    }

    /// Serializes the canonical prospect and lead sets into a backup file.
    pub fn create_backup(
        prospects: &[Prospect],
        leads: &[Lead],
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        serialize_backup(&BackupFile::new(prospects.to_vec(), leads.to_vec(), now))
    }

    /// Restores a backup file: clears prospects and join requests entirely,
    /// then re-inserts the backed-up records.
    ///
    /// Ids are preserved where the backup carries them; records without an
    /// id get a fresh one. The format is validated before the first write.
    pub async fn restore_backup(&self, backup_text: &str) -> AppResult<RestoreSummary> {
        let backup = parse_backup(backup_text)?;

        self.clear_collection(collections::PROSPECTS).await?;
        self.clear_collection(collections::JOIN_REQUESTS).await?;

        let mut writes: Vec<BatchWrite> = Vec::new();
        for prospect in &backup.data.prospects {
            writes.push(BatchWrite::Set {
                collection: collections::PROSPECTS.to_owned(),
                id: preserved_or_new(&prospect.id),
                data: encode_entity(prospect)?,
            });
        }
        for lead in &backup.data.leads {
            writes.push(BatchWrite::Set {
                collection: collections::JOIN_REQUESTS.to_owned(),
                id: preserved_or_new(&lead.id),
                data: encode_entity(lead)?,
            });
        }
        self.commit_chunked(writes).await?;

        Ok(RestoreSummary {
            prospects: backup.data.prospects.len(),
            leads: backup.data.leads.len(),
        })
    }

    /// Clears prospects, join requests and activities.
    ///
    /// Refuses to run unless the caller passes the literal confirmation
    /// phrase; this is the UI's typed-confirmation prompt, re-checked here.
    pub async fn clear_all(&self, confirmation: &str) -> AppResult<()> {
        if confirmation != CLEAR_ALL_CONFIRMATION {
            return Err(AppError::Validation(format!(
                "confirmation phrase does not match '{CLEAR_ALL_CONFIRMATION}'"
            )));
        }

        for collection in [
            collections::PROSPECTS,
            collections::JOIN_REQUESTS,
            collections::ACTIVITIES,
        ] {
            self.clear_collection(collection).await?;
        }

        Ok(())
    }
}

fn preserved_or_new(id: &str) -> String {
    if id.is_empty() {
        new_document_id()
    } else {
        id.to_owned()
    }
}
