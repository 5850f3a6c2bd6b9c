// Migration pipeline: legacy stream -> schema map / pressure normalization
// -> archive rollups. All-or-nothing: the first fatal error aborts and any
// partially written destination is invalid.

use std::path::Path;
use std::pin::pin;

use crate::archive_repo::ArchiveBuilder;
use crate::config::StationConfig;
use crate::error::MigrationError;
use crate::legacy_repo::LegacyArchive;
use crate::models::{MigrationStats, Sample};
use crate::pressure;
use crate::schema_map;
use futures_util::StreamExt;
use tracing::info;

/// Migrates the legacy archive at `source` into a new archive at `target`.
/// The source must exist and the destination must not; the destination is not
/// created when the source cannot be opened.
pub async fn migrate(
    source: &Path,
    target: &Path,
    station: &StationConfig,
) -> Result<MigrationStats, MigrationError> {
    let legacy = LegacyArchive::open(source).await?;
    let mut builder = ArchiveBuilder::create(target).await?;
    let mut stats = MigrationStats::default();

    {
        let mut samples = pin!(legacy.sample_stream());
        while let Some(next) = samples.next().await {
            let sample = next?;
            let target_name = schema_map::target_name(&sample.data_source)?;
            let value = if sample.data_source == schema_map::LEGACY_PRESSURE {
                pressure::normalize(sample.value, station)
            } else {
                sample.value
            };
            stats.record(target_name, value.is_none());
            builder
                .feed(&Sample {
                    data_source: target_name.to_string(),
                    timestamp: sample.timestamp,
                    value,
                })
                .await?;
        }
    }

    let archive = builder.finish().await?;
    archive.close().await;
    legacy.close().await;

    info!(samples = stats.total_samples(), "migration complete");
    Ok(stats)
}
