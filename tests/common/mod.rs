// Shared test helpers: build legacy archive fixtures.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Creates a legacy archive file holding the given (data source, ts, value)
/// samples. Insertion order is irrelevant; the reader orders by timestamp.
pub async fn create_legacy_archive(path: &Path, samples: &[(&str, i64, Option<f64>)]) {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(opts).await.unwrap();
    sqlx::query("CREATE TABLE sample (ts INTEGER NOT NULL, data_source TEXT NOT NULL, value REAL)")
        .execute(&pool)
        .await
        .unwrap();
    for (data_source, ts, value) in samples {
        sqlx::query("INSERT INTO sample (ts, data_source, value) VALUES ($1, $2, $3)")
            .bind(*ts)
            .bind(*data_source)
            .bind(*value)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool.close().await;
}

/// A file at `path` that is not a sample archive.
pub fn create_garbage_file(path: &Path) {
    std::fs::write(path, b"not an archive").unwrap();
}
