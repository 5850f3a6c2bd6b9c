// End-to-end migration tests: full pipeline from a legacy archive file to the
// populated target archive.

mod common;

use common::{create_garbage_file, create_legacy_archive};
use tempfile::TempDir;
use weatherradio::archive_repo::TargetArchive;
use weatherradio::config::StationConfig;
use weatherradio::error::MigrationError;
use weatherradio::migrate::migrate;
use weatherradio::models::ConsolidationFn;
use weatherradio::pressure;

const ELEVATION_M: f64 = 500.0;
const RAW_PRESSURE: f64 = 950.0;

fn station() -> StationConfig {
    StationConfig {
        elevation_m: ELEVATION_M,
    }
}

fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-6
}

#[tokio::test]
async fn constant_pressure_day_populates_every_tier_normalized() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("meteo.rrd");
    let target = dir.path().join("weather.rrd");

    let samples: Vec<(&str, i64, Option<f64>)> = (0..1440)
        .map(|i| ("P", i * 60, Some(RAW_PRESSURE)))
        .collect();
    create_legacy_archive(&source, &samples).await;

    let stats = migrate(&source, &target, &station()).await.unwrap();
    assert_eq!(stats.sources()["Pressure"].samples, 1440);
    assert_eq!(stats.sources()["Pressure"].unknown, 0);

    let expected = pressure::normalize(Some(RAW_PRESSURE), &station()).unwrap();
    assert!(approx(expected, 1008.348492194597));

    let archive = TargetArchive::open(&target).await.unwrap();
    for cf in ConsolidationFn::ALL {
        let fine = archive.rows("Pressure", cf, 1).await.unwrap();
        assert_eq!(fine.len(), 1440);
        assert!(fine.iter().all(|(_, v)| approx(v.unwrap(), expected)));
    }

    // The 5-minute AVERAGE row covering minutes 0-4.
    let short = archive
        .rows("Pressure", ConsolidationFn::Average, 5)
        .await
        .unwrap();
    assert_eq!(short[0].0, 0);
    assert!(approx(short[0].1.unwrap(), expected));

    // 24 hourly rows and one daily row, all closed and normalized.
    let hourly = archive
        .rows("Pressure", ConsolidationFn::Min, 60)
        .await
        .unwrap();
    assert_eq!(hourly.len(), 24);
    assert!(hourly.iter().all(|(_, v)| approx(v.unwrap(), expected)));
    let daily = archive
        .rows("Pressure", ConsolidationFn::Max, 1440)
        .await
        .unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].0, 0);
    assert!(approx(daily[0].1.unwrap(), expected));
    archive.close().await;
}

#[tokio::test]
async fn lone_cloud_cover_sample_leaves_pressure_unknown() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("meteo.rrd");
    let target = dir.path().join("weather.rrd");
    create_legacy_archive(&source, &[("clouds", 120, Some(40.0))]).await;

    migrate(&source, &target, &station()).await.unwrap();

    let archive = TargetArchive::open(&target).await.unwrap();
    let clouds = archive
        .rows("CloudCover", ConsolidationFn::Average, 1)
        .await
        .unwrap();
    assert_eq!(clouds, vec![(120, Some(40.0))]);

    // No pressure sample fell in that window: zero of one expected input.
    let pressure_rows = archive
        .rows("Pressure", ConsolidationFn::Average, 1)
        .await
        .unwrap();
    assert_eq!(pressure_rows, vec![(120, None)]);

    // One known of five expected inputs fails xff even for the source itself.
    let clouds_short = archive
        .rows("CloudCover", ConsolidationFn::Average, 5)
        .await
        .unwrap();
    assert_eq!(clouds_short, vec![(0, None)]);
    archive.close().await;
}

#[tokio::test]
async fn migrating_all_seven_channels_declares_exactly_the_mapped_set() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("meteo.rrd");
    let target = dir.path().join("weather.rrd");
    create_legacy_archive(
        &source,
        &[
            ("T", 60, Some(18.5)),
            ("P", 60, Some(RAW_PRESSURE)),
            ("HR", 60, Some(55.0)),
            ("clouds", 60, Some(10.0)),
            ("skyT", 60, Some(-20.0)),
            ("Thr", 60, Some(8.0)),
            ("Light", 60, Some(20.9)),
        ],
    )
    .await;

    let stats = migrate(&source, &target, &station()).await.unwrap();
    assert_eq!(stats.total_samples(), 7);

    let archive = TargetArchive::open(&target).await.unwrap();
    let names: Vec<String> = archive
        .data_sources()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(
        names,
        [
            "CloudCover",
            "DewPoint",
            "Humidity",
            "Pressure",
            "SQM",
            "SkyTemperature",
            "Temperature"
        ]
    );

    // Only pressure was normalized on the way in.
    let expected = pressure::normalize(Some(RAW_PRESSURE), &station()).unwrap();
    let p = archive
        .rows("Pressure", ConsolidationFn::Average, 1)
        .await
        .unwrap();
    assert!(approx(p[0].1.unwrap(), expected));
    let t = archive
        .rows("Temperature", ConsolidationFn::Average, 1)
        .await
        .unwrap();
    assert_eq!(t, vec![(60, Some(18.5))]);
    archive.close().await;
}

#[tokio::test]
async fn missing_source_fails_without_creating_the_destination() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("nope.rrd");
    let target = dir.path().join("weather.rrd");

    let err = migrate(&source, &target, &station()).await.unwrap_err();
    assert!(matches!(err, MigrationError::NotFound { .. }));
    assert!(!target.exists());
}

#[tokio::test]
async fn unreadable_source_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("meteo.rrd");
    let target = dir.path().join("weather.rrd");
    create_garbage_file(&source);

    let err = migrate(&source, &target, &station()).await.unwrap_err();
    assert!(matches!(err, MigrationError::Corrupt { .. }));
}

#[tokio::test]
async fn existing_destination_is_rejected() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("meteo.rrd");
    let target = dir.path().join("weather.rrd");
    create_legacy_archive(&source, &[("T", 60, Some(1.0))]).await;
    std::fs::write(&target, b"do not clobber").unwrap();

    let err = migrate(&source, &target, &station()).await.unwrap_err();
    assert!(matches!(err, MigrationError::ArchiveCreateFailed { .. }));
    assert_eq!(std::fs::read(&target).unwrap(), b"do not clobber");
}

#[tokio::test]
async fn unmapped_channel_aborts_the_run() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("meteo.rrd");
    let target = dir.path().join("weather.rrd");
    create_legacy_archive(&source, &[("T", 60, Some(1.0)), ("Rain", 120, Some(0.2))]).await;

    let err = migrate(&source, &target, &station()).await.unwrap_err();
    assert!(matches!(err, MigrationError::UnknownDataSource { name } if name == "Rain"));
}

#[tokio::test]
async fn duplicate_timestamp_is_a_regression() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("meteo.rrd");
    let target = dir.path().join("weather.rrd");
    create_legacy_archive(&source, &[("T", 60, Some(1.0)), ("T", 60, Some(2.0))]).await;

    let err = migrate(&source, &target, &station()).await.unwrap_err();
    assert!(matches!(err, MigrationError::TimestampRegression { .. }));
}

#[tokio::test]
async fn unknown_samples_count_into_the_ratio() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("meteo.rrd");
    let target = dir.path().join("weather.rrd");
    create_legacy_archive(
        &source,
        &[
            ("HR", 60, Some(50.0)),
            ("HR", 120, None),
            ("HR", 180, Some(52.0)),
            ("HR", 240, None),
        ],
    )
    .await;

    let stats = migrate(&source, &target, &station()).await.unwrap();
    let humidity = stats.sources()["Humidity"];
    assert_eq!(humidity.samples, 4);
    assert_eq!(humidity.unknown, 2);
    assert!((humidity.unknown_ratio() - 0.5).abs() < 1e-12);
}
