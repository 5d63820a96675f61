//! CSV export of annotated records.
//!
//! One file per export, named after the record variant and the collection
//! time. Fields are quoted per RFC 4180 only when they need to be.

use crate::error::{Result, ScanError};
use prospect_core::{ComplianceRecord, RecordKind, Timestamp};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const PROFILE_COLUMNS: [&str; 4] = ["name", "title", "location", "profile_url"];
const COMMENT_COLUMNS: [&str; 4] = ["name", "comment", "timestamp", "likes"];

/// Writes a batch of records somewhere and reports where.
pub trait RecordExporter: Send + Sync {
    /// Export `records` of variant `kind`, returning the artifact path.
    fn export(&self, kind: RecordKind, records: &[ComplianceRecord]) -> Result<PathBuf>;
}

/// Exporter writing `linkedin_<kind>_<unix-seconds>.csv` into a directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    /// Export into `dir`, creating it on first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(kind: RecordKind, unix_secs: i64) -> String {
        format!("linkedin_{}_{}.csv", kind.plural(), unix_secs)
    }
}

impl RecordExporter for CsvExporter {
    fn export(&self, kind: RecordKind, records: &[ComplianceRecord]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;

        let unix_secs = Timestamp::now().timestamp();
        let path = self.dir.join(Self::file_name(kind, unix_secs));
        std::fs::write(&path, render_csv(kind, records)?)?;

        tracing::info!("Exported {} {} to {}", records.len(), kind, path.display());
        Ok(path)
    }
}

/// Render records as CSV text with a header row and CRLF line endings.
pub fn render_csv(kind: RecordKind, records: &[ComplianceRecord]) -> Result<String> {
    let columns: &[&str] = match kind {
        RecordKind::Profile => &PROFILE_COLUMNS,
        RecordKind::Comment => &COMMENT_COLUMNS,
    };

    let mut out = String::new();
    let header: Vec<&str> = columns
        .iter()
        .copied()
        .chain(["collection_date", "data_source"])
        .collect();
    write_row(&mut out, header.iter().copied())?;

    for record in records {
        let values: Vec<String> = columns
            .iter()
            .map(|column| record.record.field(column).unwrap_or_default())
            .chain([record.collection_date.clone(), record.data_source.clone()])
            .collect();
        write_row(&mut out, values.iter().map(String::as_str))?;
    }
    Ok(out)
}

fn write_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) -> Result<()> {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        write!(out, "{}", escape_field(field)).map_err(|e| ScanError::Export(e.to_string()))?;
    }
    out.push_str("\r\n");
    Ok(())
}

fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
