#![allow(clippy::must_use_candidate)]

use prospect_core::{FilterSet, IdentityKey, RawRecord};
use std::collections::HashSet;

/// Run-wide record of identity keys already admitted. First seen wins.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<IdentityKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `record` unless its identity key was already seen.
    pub fn admit(&mut self, record: &RawRecord) -> bool {
        self.seen.insert(record.identity_key())
    }

    /// Keep only unseen records, preserving order.
    pub fn retain(&mut self, records: Vec<RawRecord>) -> Vec<RawRecord> {
        let before = records.len();
        let kept: Vec<_> = records.into_iter().filter(|r| self.admit(r)).collect();
        if kept.len() < before {
            tracing::debug!("Discarded {} duplicate records", before - kept.len());
        }
        kept
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Remove records whose identity key repeats an earlier one.
pub fn deduplicate(records: Vec<RawRecord>) -> Vec<RawRecord> {
    Deduplicator::new().retain(records)
}

/// True when `record` satisfies every filter entry.
///
/// Each entry matches when the record's field contains the value, ignoring
/// case. A record lacking the field fails that entry, even when the value is
/// blank; a blank value only matches any present field.
pub fn matches_filters(record: &RawRecord, filters: &FilterSet) -> bool {
    filters.iter().all(|(key, value)| {
        record.field(key).is_some_and(|field| {
            value.is_blank()
                || field
                    .to_lowercase()
                    .contains(&value.as_text().to_lowercase())
        })
    })
}

/// Keep records matching every filter, preserving order.
pub fn apply_filters(records: Vec<RawRecord>, filters: &FilterSet) -> Vec<RawRecord> {
    if filters.is_empty() {
        return records;
    }
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|record| matches_filters(record, filters))
        .collect();
    tracing::debug!("Filters kept {} of {} records", kept.len(), before);
    kept
}

/// Deduplicate, then filter. Idempotent.
pub fn post_process(records: Vec<RawRecord>, filters: Option<&FilterSet>) -> Vec<RawRecord> {
    let records = deduplicate(records);
    match filters {
        Some(filters) => apply_filters(records, filters),
        None => records,
    }
}
