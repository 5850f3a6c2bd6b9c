// Migration error taxonomy. All variants are fatal: the first one aborts the
// run and leaves any partially written destination invalid.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("source archive not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("source archive unreadable: {reason}")]
    Corrupt { reason: String },

    #[error("unknown data source: {name}")]
    UnknownDataSource { name: String },

    #[error("timestamp regression for {data_source}: {timestamp} after {previous}")]
    TimestampRegression {
        data_source: String,
        timestamp: i64,
        previous: i64,
    },

    #[error("cannot create destination archive {}: {reason}", .path.display())]
    ArchiveCreateFailed { path: PathBuf, reason: String },
}
