//! Prospect Database Layer
//!
//! Provides `SQLite` storage for collected records.
//! Uses `SQLx` with embedded migrations.
//!
//! # Example
//!
//! ```ignore
//! use prospect_db::Database;
//!
//! let db = Database::new("prospect.db").await?;
//! db.run_migrations().await?;
//! db.append("run-1", &records).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod migrations;
pub mod records;

// Re-export commonly used types
pub use connection::RecordPool;
pub use error::{DatabaseError, Result};
pub use records::StoredRecord;

use prospect_core::ComplianceRecord;
use std::path::Path;

/// High-level database interface with migrations.
#[derive(Debug, Clone)]
pub struct Database {
    pool: RecordPool,
}

impl Database {
    /// Open a database at the specified path (or `:memory:` for in-memory).
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = RecordPool::new(path).await?;
        Ok(Self { pool })
    }

    /// Open a database and bring its schema up to date.
    ///
    /// # Errors
    /// Returns `DatabaseError` if opening or migrating fails.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::new(path).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Append a run's records.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the batch cannot be written.
    pub async fn append(&self, run_id: &str, records: &[ComplianceRecord]) -> Result<usize> {
        records::insert_records(self.pool.pool(), run_id, records).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
