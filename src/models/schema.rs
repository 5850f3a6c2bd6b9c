// Archive schema types: data-source definitions and retention tiers.

/// Data-source kind. Weather readings are gauges (values rise and fall
/// freely, no counter semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsKind {
    Gauge,
}

impl DsKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DsKind::Gauge => "GAUGE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GAUGE" => Some(DsKind::Gauge),
            _ => None,
        }
    }
}

/// Consolidation function applied to base-step samples in one tier window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsolidationFn {
    Average,
    Min,
    Max,
}

impl ConsolidationFn {
    pub const ALL: [Self; 3] = [Self::Average, Self::Min, Self::Max];

    pub fn as_str(self) -> &'static str {
        match self {
            ConsolidationFn::Average => "AVERAGE",
            ConsolidationFn::Min => "MIN",
            ConsolidationFn::Max => "MAX",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVERAGE" => Some(ConsolidationFn::Average),
            "MIN" => Some(ConsolidationFn::Min),
            "MAX" => Some(ConsolidationFn::Max),
            _ => None,
        }
    }
}

/// One data source of the target archive. Identity is the name; immutable
/// once the archive is created. `None` range bounds mean unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSourceDef {
    pub name: String,
    pub kind: DsKind,
    /// Maximum silence before a slot is considered unknown.
    pub heartbeat_seconds: u32,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub unit: String,
}

/// One retention tier: a consolidation function at one resolution/coverage.
/// `step_multiplier` is in base-step units; `row_count` bounds the circular
/// buffer; `xff` is the tolerated fraction of unknown inputs per window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionTier {
    pub cf: ConsolidationFn,
    pub xff: f64,
    pub step_multiplier: u32,
    pub row_count: u32,
}
