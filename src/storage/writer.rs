// src/storage/writer.rs

//! Schema-validated partition writer.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::NormalizedJobRecord;
use crate::storage::{ObjectStore, codec, partition_dir, partition_key};

/// Metadata about a completed partition write.
#[derive(Debug, Clone)]
pub struct WriteResult {
    /// Object key of the partition file
    pub key: String,
    /// Displayable location of the file
    pub location: String,
    /// Displayable location of the partition directory
    pub partition: String,
    /// Records serialized into the file
    pub written: usize,
    /// Records dropped by validation
    pub dropped: usize,
}

/// Validates canonical records and writes them as one parquet file per run.
pub struct SchemaValidatedWriter {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl SchemaValidatedWriter {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Check one record against the canonical schema.
    pub fn check(record: &NormalizedJobRecord) -> Result<()> {
        if record.job_id.trim().is_empty() {
            return Err(AppError::malformed("<blank>", "job_id is required"));
        }
        if record.job_url.trim().is_empty() {
            return Err(AppError::malformed(&record.job_id, "job_url is required"));
        }
        for (name, value) in [
            ("posted_time", record.posted_time),
            ("expire_time", record.expire_time),
        ] {
            if value.is_some_and(|v| v < 0) {
                return Err(AppError::malformed(
                    &record.job_id,
                    format!("{} must not be negative", name),
                ));
            }
        }
        Ok(())
    }

    /// Split records into the valid set, dropping and logging the rest.
    ///
    /// A repeated `job_id` is malformed; the first occurrence wins.
    pub fn validate<'a>(records: &'a [NormalizedJobRecord]) -> (Vec<&'a NormalizedJobRecord>, usize) {
        let mut seen = HashSet::new();
        let mut valid = Vec::with_capacity(records.len());
        let mut dropped = 0;

        for record in records {
            let checked = Self::check(record).and_then(|_| {
                if seen.insert(record.job_id.as_str()) {
                    Ok(())
                } else {
                    Err(AppError::malformed(&record.job_id, "duplicate job_id"))
                }
            });

            match checked {
                Ok(()) => valid.push(record),
                Err(e) => {
                    log::warn!("Dropping record: {}", e);
                    dropped += 1;
                }
            }
        }

        (valid, dropped)
    }

    /// Validate, encode and store a run's records.
    ///
    /// An empty run still produces a file so downstream readers see the partition.
    pub async fn write(
        &self,
        keyword: &str,
        date: NaiveDate,
        records: &[NormalizedJobRecord],
    ) -> Result<WriteResult> {
        let (valid, dropped) = Self::validate(records);
        let key = partition_key(&self.prefix, keyword, date);

        let bytes = codec::encode_records(&valid)
            .map_err(|e| AppError::storage_write(self.store.location(&key), e))?;
        let location = self
            .store
            .put(&key, bytes)
            .await
            .map_err(|e| AppError::storage_write(self.store.location(&key), e))?;

        log::info!(
            "Wrote {} records to {} ({} dropped)",
            valid.len(),
            location,
            dropped
        );

        Ok(WriteResult {
            partition: format!(
                "{}/",
                self.store
                    .location(&partition_dir(&self.prefix, keyword, date))
            ),
            key,
            location,
            written: valid.len(),
            dropped,
        })
    }

    /// Read a partition file back.
    pub async fn read(&self, key: &str) -> Result<Option<Vec<NormalizedJobRecord>>> {
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(codec::decode_records(bytes)?)),
            None => Ok(None),
        }
    }
}
