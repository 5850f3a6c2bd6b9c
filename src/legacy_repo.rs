// Read-only view of the legacy meteoweb archive: a lazy, single-pass stream
// of samples interleaved by timestamp. Re-reading requires reopening.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::MigrationError;
use crate::models::Sample;
use futures_util::{Stream, StreamExt};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::instrument;

pub struct LegacyArchive {
    pool: SqlitePool,
    path: PathBuf,
}

impl LegacyArchive {
    /// Opens the legacy archive read-only. Fails with `NotFound` if the path
    /// does not exist, `Corrupt` if it is not a readable sample archive.
    #[instrument(fields(repo = "legacy", operation = "open"))]
    pub async fn open(path: &Path) -> Result<Self, MigrationError> {
        if !path.exists() {
            return Err(MigrationError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| corrupt(e))?
            .read_only(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .connect_with(opts)
            .await
            .map_err(corrupt)?;
        // Probe the expected layout up front so a malformed file fails at
        // open, not mid-stream.
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sample")
            .fetch_one(&pool)
            .await
            .map_err(corrupt)?;
        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All samples ordered by timestamp (non-decreasing across sources).
    pub fn sample_stream(&self) -> impl Stream<Item = Result<Sample, MigrationError>> + '_ {
        sqlx::query("SELECT ts, data_source, value FROM sample ORDER BY ts ASC")
            .fetch(&self.pool)
            .map(|row| {
                let row = row.map_err(corrupt)?;
                Ok(Sample {
                    data_source: row.try_get("data_source").map_err(corrupt)?,
                    timestamp: row.try_get("ts").map_err(corrupt)?,
                    value: row.try_get("value").map_err(corrupt)?,
                })
            })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn corrupt(e: impl std::fmt::Display) -> MigrationError {
    MigrationError::Corrupt {
        reason: e.to_string(),
    }
}
