//! Storage for collected records.
//!
//! Each run appends its post-processed compliance records to the `records`
//! table. The full record is kept as JSON; identity columns are duplicated
//! for querying.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use prospect_core::{ComplianceRecord, RecordKind};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};

/// A record as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Row identifier
    pub id: String,
    /// Run that collected this record
    pub run_id: String,
    /// The stored record
    pub record: ComplianceRecord,
    /// When the row was written
    pub stored_at: DateTime<Utc>,
}

fn kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Profile => "profile",
        RecordKind::Comment => "comment",
    }
}

/// Append a batch of records collected by one run.
///
/// The batch is written in a single transaction; either every record is
/// stored or none are.
///
/// # Errors
/// Returns `DatabaseError` if serialization or the insert fails.
pub async fn insert_records(
    pool: &Pool<Sqlite>,
    run_id: &str,
    records: &[ComplianceRecord],
) -> Result<usize> {
    let stored_at = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    for record in records {
        let key = record.record.identity_key();
        let payload = serde_json::to_string(record)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO records (id, run_id, kind, name, locator, payload, collection_date, stored_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(run_id)
        .bind(kind_label(record.record.kind()))
        .bind(&key.name)
        .bind(&key.locator)
        .bind(&payload)
        .bind(&record.collection_date)
        .bind(&stored_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::debug!("Stored {} records for run {}", records.len(), run_id);

    Ok(records.len())
}

/// Get all records stored by a run, in insertion order.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a payload cannot be decoded.
pub async fn get_by_run(pool: &Pool<Sqlite>, run_id: &str) -> Result<Vec<StoredRecord>> {
    let rows = sqlx::query(
        "SELECT id, run_id, payload, stored_at
         FROM records
         WHERE run_id = ?
         ORDER BY rowid",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let payload: String = row.try_get("payload")?;
        let record = serde_json::from_str(&payload)
            .map_err(|e| DatabaseError::Decode(format!("invalid record payload: {e}")))?;

        let stored_at_str: String = row.try_get("stored_at")?;
        let stored_at = DateTime::parse_from_rfc3339(&stored_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        records.push(StoredRecord {
            id: row.try_get("id")?,
            run_id: row.try_get("run_id")?,
            record,
            stored_at,
        });
    }

    Ok(records)
}

/// Count stored records of one kind.
///
/// # Errors
/// Returns `DatabaseError` if the query fails.
pub async fn count_by_kind(pool: &Pool<Sqlite>, kind: RecordKind) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM records WHERE kind = ?")
        .bind(kind_label(kind))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use prospect_core::{CommentRecord, ProfileRecord, RawRecord, Timestamp};

    async fn setup() -> Database {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    fn profile(name: &str, url: &str) -> ComplianceRecord {
        ComplianceRecord::new(
            RawRecord::from(ProfileRecord {
                name: Some(name.to_string()),
                title: Some("Engineer".to_string()),
                location: None,
                profile_url: Some(url.to_string()),
            }),
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = setup().await;
        let batch = vec![
            profile("Ada", "https://example.com/in/ada"),
            profile("Grace", "https://example.com/in/grace"),
        ];

        let written = insert_records(db.pool(), "run-1", &batch)
            .await
            .expect("insert records");
        assert_eq!(written, 2);

        let stored = get_by_run(db.pool(), "run-1").await.expect("read records");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].record, batch[0]);
        assert_eq!(stored[1].record.record.name(), Some("Grace"));
        assert!(stored.iter().all(|r| r.run_id == "run-1"));
    }

    #[tokio::test]
    async fn test_runs_are_isolated() {
        let db = setup().await;
        insert_records(db.pool(), "run-1", &[profile("Ada", "u1")])
            .await
            .expect("insert run 1");
        insert_records(db.pool(), "run-2", &[profile("Grace", "u2")])
            .await
            .expect("insert run 2");

        let stored = get_by_run(db.pool(), "run-2").await.expect("read records");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record.record.name(), Some("Grace"));
    }

    #[tokio::test]
    async fn test_count_by_kind() {
        let db = setup().await;
        let comment = ComplianceRecord::new(
            RawRecord::from(CommentRecord {
                name: Some("Ada".to_string()),
                comment: Some("Great post".to_string()),
                timestamp: Some("2d".to_string()),
                likes: 4,
            }),
            Timestamp::now(),
        );
        insert_records(db.pool(), "run-1", &[profile("Ada", "u1"), comment])
            .await
            .expect("insert records");

        assert_eq!(
            count_by_kind(db.pool(), RecordKind::Profile)
                .await
                .expect("count profiles"),
            1
        );
        assert_eq!(
            count_by_kind(db.pool(), RecordKind::Comment)
                .await
                .expect("count comments"),
            1
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let db = setup().await;
        let written = insert_records(db.pool(), "run-1", &[])
            .await
            .expect("insert empty batch");
        assert_eq!(written, 0);
    }
}
