use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use weatherradio::*;

/// Migrate a legacy meteoweb archive to the weather radio schema.
#[derive(Debug, Parser)]
#[command(name = "wr-migrate", version)]
struct Cli {
    /// Legacy meteoweb archive
    #[arg(default_value = "meteo.rrd")]
    infile: PathBuf,
    /// Target weather radio archive (must not exist)
    #[arg(default_value = "weather.rrd")]
    outfile: PathBuf,
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let app_config = config::AppConfig::load()?;

    tracing::info!(
        infile = %cli.infile.display(),
        outfile = %cli.outfile.display(),
        elevation_m = app_config.station.elevation_m,
        "migrating archive"
    );

    let stats = migrate::migrate(&cli.infile, &cli.outfile, &app_config.station).await?;
    for (name, s) in stats.sources() {
        tracing::info!(
            data_source = %name,
            samples = s.samples,
            unknown = s.unknown,
            unknown_ratio = s.unknown_ratio(),
            "migrated"
        );
    }

    Ok(())
}
