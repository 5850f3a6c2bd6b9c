// Domain models (ported from the meteoweb scripts)

mod sample;
mod schema;
mod stats;

pub use sample::Sample;
pub use schema::{ConsolidationFn, DataSourceDef, DsKind, RetentionTier};
pub use stats::{MigrationStats, SourceStats};
