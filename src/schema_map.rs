// Static mapping from legacy meteoweb data-source names to the weather radio
// schema. The mapping is total over the legacy set; anything else is a hard
// error, since silently dropping a channel would corrupt downstream statistics.

use crate::error::MigrationError;
use crate::models::{DataSourceDef, DsKind};

/// Legacy name of the raw pressure channel (the only normalized source).
pub const LEGACY_PRESSURE: &str = "P";

/// Heartbeat for every target data source (from the legacy GAUGE:600 defs).
pub const HEARTBEAT_SECONDS: u32 = 600;

/// (legacy name, target name, unit)
const MAPPINGS: [(&str, &str, &str); 7] = [
    ("T", "Temperature", "°C"),
    ("P", "Pressure", "hPa"),
    ("HR", "Humidity", "%"),
    ("clouds", "CloudCover", "%"),
    ("skyT", "SkyTemperature", "°C"),
    ("Thr", "DewPoint", "°C"),
    ("Light", "SQM", "mag/arcsec²"),
];

/// Target name for a legacy data source. Unmapped names fail.
pub fn target_name(legacy: &str) -> Result<&'static str, MigrationError> {
    MAPPINGS
        .iter()
        .find(|(from, _, _)| *from == legacy)
        .map(|(_, to, _)| *to)
        .ok_or_else(|| MigrationError::UnknownDataSource {
            name: legacy.to_string(),
        })
}

/// The full target schema: one gauge per mapped channel, unbounded range.
pub fn target_data_sources() -> Vec<DataSourceDef> {
    MAPPINGS
        .iter()
        .map(|(_, name, unit)| DataSourceDef {
            name: name.to_string(),
            kind: DsKind::Gauge,
            heartbeat_seconds: HEARTBEAT_SECONDS,
            range_min: None,
            range_max: None,
            unit: unit.to_string(),
        })
        .collect()
}
