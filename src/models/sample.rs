// One raw reading from the archive stream.

/// One sample: data-source name, epoch-second timestamp, and value.
/// An unavailable reading is `None`; it stays `None` through normalization
/// and counts against the xff threshold during consolidation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub data_source: String,
    pub timestamp: i64,
    pub value: Option<f64>,
}
