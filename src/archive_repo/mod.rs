// Target archive on SQLite: schema declaration plus circular rollup rows.
// Pure consolidation lives in rollup; DB access stays here.

pub mod rollup;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::MigrationError;
use crate::models::{ConsolidationFn, DataSourceDef, DsKind, RetentionTier, Sample};
use crate::schema_map;
use rollup::{ClosedRow, SourceRollup};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::instrument;

/// Flush accumulated row writes once this many are pending.
const FLUSH_THRESHOLD: usize = 512;

/// One row write: tier, source, circular slot, window start, value.
#[derive(Debug, Clone)]
struct RowWrite {
    tier_id: i64,
    data_source: String,
    row_index: i64,
    row_ts: i64,
    value: Option<f64>,
}

/// Handle on a target archive file.
#[derive(Debug)]
pub struct TargetArchive {
    pool: SqlitePool,
    path: PathBuf,
    base_step: i64,
}

impl TargetArchive {
    /// Creates a new archive at `path` and declares its data sources and
    /// tiers. The file must not already exist.
    pub async fn create(
        path: &Path,
        data_sources: &[DataSourceDef],
        tiers: &[RetentionTier],
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!path.exists(), "destination already exists");
        let pool = connect(path, true).await?;

        let mut tx = pool.begin().await?;
        sqlx::query(
            "CREATE TABLE archive_info (id INTEGER PRIMARY KEY CHECK (id = 1), base_step_seconds INTEGER NOT NULL)",
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE data_source (
                name TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                heartbeat_seconds INTEGER NOT NULL,
                range_min REAL,
                range_max REAL,
                unit TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE retention_tier (
                id INTEGER PRIMARY KEY,
                cf TEXT NOT NULL,
                xff REAL NOT NULL,
                step_multiplier INTEGER NOT NULL,
                row_count INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE rollup_row (
                tier_id INTEGER NOT NULL,
                data_source TEXT NOT NULL,
                row_index INTEGER NOT NULL,
                row_ts INTEGER NOT NULL,
                value REAL,
                PRIMARY KEY (tier_id, data_source, row_index)
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "CREATE INDEX idx_rollup_row_ts ON rollup_row(data_source, tier_id, row_ts)",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO archive_info (id, base_step_seconds) VALUES (1, $1)")
            .bind(rollup::BASE_STEP_SECONDS)
            .execute(&mut *tx)
            .await?;
        for ds in data_sources {
            sqlx::query(
                "INSERT INTO data_source (name, kind, heartbeat_seconds, range_min, range_max, unit) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&ds.name)
            .bind(ds.kind.as_str())
            .bind(ds.heartbeat_seconds as i64)
            .bind(ds.range_min)
            .bind(ds.range_max)
            .bind(&ds.unit)
            .execute(&mut *tx)
            .await?;
        }
        for (id, tier) in tiers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO retention_tier (id, cf, xff, step_multiplier, row_count) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id as i64)
            .bind(tier.cf.as_str())
            .bind(tier.xff)
            .bind(tier.step_multiplier as i64)
            .bind(tier.row_count as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(Self {
            pool,
            path: path.to_path_buf(),
            base_step: rollup::BASE_STEP_SECONDS,
        })
    }

    /// Opens an existing archive for inspection.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        anyhow::ensure!(path.exists(), "archive not found: {}", path.display());
        let pool = connect(path, false).await?;
        let base_step: i64 =
            sqlx::query_scalar("SELECT base_step_seconds FROM archive_info WHERE id = 1")
                .fetch_one(&pool)
                .await?;
        Ok(Self {
            pool,
            path: path.to_path_buf(),
            base_step,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_step_seconds(&self) -> i64 {
        self.base_step
    }

    pub async fn data_sources(&self) -> anyhow::Result<Vec<DataSourceDef>> {
        let rows = sqlx::query(
            "SELECT name, kind, heartbeat_seconds, range_min, range_max, unit FROM data_source ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.try_get("kind")?;
            out.push(DataSourceDef {
                name: row.try_get("name")?,
                kind: DsKind::parse(&kind)
                    .ok_or_else(|| anyhow::anyhow!("unknown data-source kind: {}", kind))?,
                heartbeat_seconds: row.try_get::<i64, _>("heartbeat_seconds")? as u32,
                range_min: row.try_get("range_min")?,
                range_max: row.try_get("range_max")?,
                unit: row.try_get("unit")?,
            });
        }
        Ok(out)
    }

    pub async fn tiers(&self) -> anyhow::Result<Vec<RetentionTier>> {
        let rows = sqlx::query(
            "SELECT cf, xff, step_multiplier, row_count FROM retention_tier ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let cf: String = row.try_get("cf")?;
            out.push(RetentionTier {
                cf: ConsolidationFn::parse(&cf)
                    .ok_or_else(|| anyhow::anyhow!("unknown consolidation function: {}", cf))?,
                xff: row.try_get("xff")?,
                step_multiplier: row.try_get::<i64, _>("step_multiplier")? as u32,
                row_count: row.try_get::<i64, _>("row_count")? as u32,
            });
        }
        Ok(out)
    }

    /// Rows of one (data source, cf, resolution) rollup, ascending by window
    /// start. `None` values are unknown rows.
    pub async fn rows(
        &self,
        data_source: &str,
        cf: ConsolidationFn,
        step_multiplier: u32,
    ) -> anyhow::Result<Vec<(i64, Option<f64>)>> {
        let rows = sqlx::query(
            r#"
            SELECT r.row_ts, r.value
            FROM rollup_row r
            JOIN retention_tier t ON t.id = r.tier_id
            WHERE r.data_source = $1 AND t.cf = $2 AND t.step_multiplier = $3
            ORDER BY r.row_ts ASC
            "#,
        )
        .bind(data_source)
        .bind(cf.as_str())
        .bind(step_multiplier as i64)
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push((row.try_get("row_ts")?, row.try_get("value")?));
        }
        Ok(out)
    }

    /// Upserts a batch of rows in one transaction. A newer window landing on
    /// an occupied circular slot replaces it; stale writes never clobber a
    /// newer row.
    #[instrument(skip(self, rows), fields(repo = "archive", operation = "write_rows", count = rows.len()))]
    async fn write_rows(&self, rows: &[RowWrite]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for r in rows {
            sqlx::query(
                r#"
                INSERT INTO rollup_row (tier_id, data_source, row_index, row_ts, value)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (tier_id, data_source, row_index) DO UPDATE
                SET row_ts = excluded.row_ts, value = excluded.value
                WHERE excluded.row_ts > rollup_row.row_ts
                "#,
            )
            .bind(r.tier_id)
            .bind(&r.data_source)
            .bind(r.row_index)
            .bind(r.row_ts)
            .bind(r.value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

async fn connect(path: &Path, create: bool) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(create)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(5))
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
    Ok(SqlitePoolOptions::new().connect_with(opts).await?)
}

#[derive(Debug)]
struct DsState {
    rollup: SourceRollup,
    last_timestamp: Option<i64>,
}

/// Creates the target archive and populates every tier from one ordered
/// sample stream.
#[derive(Debug)]
pub struct ArchiveBuilder {
    archive: TargetArchive,
    tiers: Vec<RetentionTier>,
    states: HashMap<String, DsState>,
    pending: Vec<RowWrite>,
    /// (first, last) base slot seen across all sources.
    span: Option<(i64, i64)>,
}

impl ArchiveBuilder {
    /// Declares the target schema (all mapped data sources, the full tier
    /// set) at `path`. Fails with `ArchiveCreateFailed` if the destination
    /// exists or cannot be written; nothing is written on failure.
    pub async fn create(path: &Path) -> Result<Self, MigrationError> {
        let data_sources = schema_map::target_data_sources();
        let tiers = rollup::tier_set();
        let archive = TargetArchive::create(path, &data_sources, &tiers)
            .await
            .map_err(|e| MigrationError::ArchiveCreateFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let states = data_sources
            .iter()
            .map(|ds| {
                (
                    ds.name.clone(),
                    DsState {
                        rollup: SourceRollup::new(tiers.len()),
                        last_timestamp: None,
                    },
                )
            })
            .collect();
        Ok(Self {
            archive,
            tiers,
            states,
            pending: Vec::new(),
            span: None,
        })
    }

    /// Feeds one sample (already mapped and normalized). Timestamps must be
    /// strictly increasing per data source.
    pub async fn feed(&mut self, sample: &Sample) -> Result<(), MigrationError> {
        let state = self.states.get_mut(&sample.data_source).ok_or_else(|| {
            MigrationError::UnknownDataSource {
                name: sample.data_source.clone(),
            }
        })?;
        if let Some(previous) = state.last_timestamp {
            if sample.timestamp <= previous {
                return Err(MigrationError::TimestampRegression {
                    data_source: sample.data_source.clone(),
                    timestamp: sample.timestamp,
                    previous,
                });
            }
        }
        state.last_timestamp = Some(sample.timestamp);

        let slot = rollup::slot_of(sample.timestamp);
        self.span = Some(match self.span {
            None => (slot, slot),
            Some((first, last)) => (first.min(slot), last.max(slot)),
        });

        let closed = state.rollup.feed(&self.tiers, slot, sample.value);
        for row in closed {
            self.pending
                .push(row_write(&self.tiers, &sample.data_source, row));
        }
        if self.pending.len() >= FLUSH_THRESHOLD {
            self.flush().await?;
        }
        Ok(())
    }

    /// Closes all open windows, writes unknown rows for every window a source
    /// never touched within the migrated span, and returns the archive.
    pub async fn finish(mut self) -> Result<TargetArchive, MigrationError> {
        let tiers = &self.tiers;
        let pending = &mut self.pending;
        for (name, state) in &mut self.states {
            for row in state.rollup.finish(tiers) {
                pending.push(row_write(tiers, name, row));
            }
        }
        self.flush().await?;

        if let Some((first_slot, last_slot)) = self.span {
            for (tier_id, tier) in self.tiers.iter().enumerate() {
                let step = tier.step_multiplier as i64;
                let last_window = last_slot.div_euclid(step);
                // Windows older than the circular capacity would be
                // overwritten anyway; skip them.
                let start_window = first_slot
                    .div_euclid(step)
                    .max(last_window - tier.row_count as i64 + 1);
                for name in self.states.keys() {
                    let mut batch = Vec::new();
                    for window in start_window..=last_window {
                        batch.push(RowWrite {
                            tier_id: tier_id as i64,
                            data_source: name.clone(),
                            row_index: window.rem_euclid(tier.row_count as i64),
                            row_ts: rollup::row_timestamp(tier, window),
                            value: None,
                        });
                        if batch.len() >= FLUSH_THRESHOLD {
                            write_batch(&self.archive, &mut batch).await?;
                        }
                    }
                    write_batch(&self.archive, &mut batch).await?;
                }
            }
        }
        Ok(self.archive)
    }

    async fn flush(&mut self) -> Result<(), MigrationError> {
        write_batch(&self.archive, &mut self.pending).await
    }
}

async fn write_batch(
    archive: &TargetArchive,
    batch: &mut Vec<RowWrite>,
) -> Result<(), MigrationError> {
    if batch.is_empty() {
        return Ok(());
    }
    archive
        .write_rows(batch)
        .await
        .map_err(|e| MigrationError::ArchiveCreateFailed {
            path: archive.path().to_path_buf(),
            reason: e.to_string(),
        })?;
    batch.clear();
    Ok(())
}

fn row_write(tiers: &[RetentionTier], data_source: &str, row: ClosedRow) -> RowWrite {
    let tier = &tiers[row.tier_index];
    RowWrite {
        tier_id: row.tier_index as i64,
        data_source: data_source.to_string(),
        row_index: row.window.rem_euclid(tier.row_count as i64),
        row_ts: rollup::row_timestamp(tier, row.window),
        value: row.value,
    }
}
