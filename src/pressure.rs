// Sea-level pressure normalization (international barometric formula).
// Applied to each raw pressure sample exactly once, at ingestion; consolidated
// rows store the normalized unit. Not idempotent for a nonzero elevation.

use crate::config::StationConfig;

const TEMPERATURE_LAPSE_K_PER_M: f64 = 0.0065;
const STANDARD_TEMPERATURE_K: f64 = 288.15;
const BAROMETRIC_EXPONENT: f64 = 5.255;

/// Reduces a station pressure reading (hPa) to sea level. Unknown readings
/// pass through unchanged. Reference pair: 950.0 hPa at 500 m elevation
/// normalizes to 1008.348492194597 hPa; elevation 0 is the identity.
pub fn normalize(raw_hpa: Option<f64>, station: &StationConfig) -> Option<f64> {
    raw_hpa.map(|p| p * sea_level_factor(station.elevation_m))
}

/// Station-to-sea-level multiplier for the given elevation in meters.
pub fn sea_level_factor(elevation_m: f64) -> f64 {
    (1.0 - TEMPERATURE_LAPSE_K_PER_M * elevation_m / STANDARD_TEMPERATURE_K)
        .powf(-BAROMETRIC_EXPONENT)
}
