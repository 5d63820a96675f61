//! Destinations for annotated records.

use crate::error::{Result, ScanError};
use async_trait::async_trait;
use prospect_core::ComplianceRecord;
use prospect_db::Database;

/// Append-only store for the records of a finished run.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist `records` under `run_id`.
    async fn append(&self, run_id: &str, records: &[ComplianceRecord]) -> Result<()>;
}

#[async_trait]
impl RecordSink for Database {
    async fn append(&self, run_id: &str, records: &[ComplianceRecord]) -> Result<()> {
        let written = Database::append(self, run_id, records)
            .await
            .map_err(ScanError::from)?;
        tracing::debug!("Stored {} records for run {}", written, run_id);
        Ok(())
    }
}
