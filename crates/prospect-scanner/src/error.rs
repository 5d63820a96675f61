use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid base locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("Sink failed: {0}")]
    Sink(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] prospect_db::DatabaseError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
