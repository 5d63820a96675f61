//! Compliance annotation of extracted records.

use prospect_core::{ComplianceRecord, RawRecord, Timestamp};

/// Attach provenance fields to every record, stamped with one collection time.
#[must_use]
pub fn annotate(records: Vec<RawRecord>, collected_at: Timestamp) -> Vec<ComplianceRecord> {
    records
        .into_iter()
        .map(|record| ComplianceRecord::new(record, collected_at))
        .collect()
}
