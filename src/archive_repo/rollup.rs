// Multi-resolution consolidation. Open windows are tracked per
// (data source × tier × consolidation function); a window closes when a
// sample lands past its end, or at end of stream. Expected inputs per window
// = step_multiplier; base slots never delivered count as unknown.

use crate::models::{ConsolidationFn, RetentionTier};

/// Finest sampling interval of the target archive.
pub const BASE_STEP_SECONDS: i64 = 60;

const XFF_THRESHOLD: f64 = 0.5;

/// (step multiplier in base steps, retained rows):
/// 24 h at 1 min, 7 d at 5 min, ~1 y at 1 h, ~10 y at 1 d.
const RETENTION_CLASSES: [(u32, u32); 4] = [(1, 1440), (5, 2016), (60, 8760), (1440, 3650)];

/// The fixed tier set of the target archive: every retention class crossed
/// with AVERAGE, MIN and MAX. Tier index in this order is the tier id.
pub fn tier_set() -> Vec<RetentionTier> {
    let mut tiers = Vec::with_capacity(ConsolidationFn::ALL.len() * RETENTION_CLASSES.len());
    for cf in ConsolidationFn::ALL {
        for (step_multiplier, row_count) in RETENTION_CLASSES {
            tiers.push(RetentionTier {
                cf,
                xff: XFF_THRESHOLD,
                step_multiplier,
                row_count,
            });
        }
    }
    tiers
}

/// Base slot for a timestamp. Unaligned timestamps floor into the enclosing
/// slot.
pub fn slot_of(timestamp: i64) -> i64 {
    timestamp.div_euclid(BASE_STEP_SECONDS)
}

/// Start timestamp of a tier window (an exact multiple of the tier step).
pub fn row_timestamp(tier: &RetentionTier, window: i64) -> i64 {
    window * tier.step_multiplier as i64 * BASE_STEP_SECONDS
}

/// One consolidated row emitted by the rollup: tier index into the tier set,
/// window ordinal, and the consolidated value (`None` = unknown per xff).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedRow {
    pub tier_index: usize,
    pub window: i64,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct OpenWindow {
    window: i64,
    known: u32,
    acc: f64,
}

impl OpenWindow {
    fn start(window: i64) -> Self {
        Self {
            window,
            known: 0,
            acc: 0.0,
        }
    }

    fn add(&mut self, cf: ConsolidationFn, value: Option<f64>) {
        let Some(v) = value else { return };
        self.acc = if self.known == 0 {
            v
        } else {
            match cf {
                ConsolidationFn::Average => self.acc + v,
                ConsolidationFn::Min => self.acc.min(v),
                ConsolidationFn::Max => self.acc.max(v),
            }
        };
        self.known += 1;
    }
}

/// Rollup state for one data source: one open window per tier.
#[derive(Debug)]
pub struct SourceRollup {
    open: Vec<Option<OpenWindow>>,
}

impl SourceRollup {
    pub fn new(tier_count: usize) -> Self {
        Self {
            open: vec![None; tier_count],
        }
    }

    /// Feeds one base-step sample. Slots must be non-decreasing per source.
    /// Returns the rows closed by this sample (windows the sample moved past).
    pub fn feed(
        &mut self,
        tiers: &[RetentionTier],
        slot: i64,
        value: Option<f64>,
    ) -> Vec<ClosedRow> {
        let mut closed = Vec::new();
        for (tier_index, tier) in tiers.iter().enumerate() {
            let window = slot.div_euclid(tier.step_multiplier as i64);
            let open = &mut self.open[tier_index];
            match open {
                Some(w) if w.window == window => w.add(tier.cf, value),
                _ => {
                    if let Some(w) = open.take() {
                        closed.push(close(tier_index, tier, w));
                    }
                    let mut w = OpenWindow::start(window);
                    w.add(tier.cf, value);
                    *open = Some(w);
                }
            }
        }
        closed
    }

    /// Closes all open windows at end of stream. Unfilled slots of the final
    /// window count as unknown against the xff threshold.
    pub fn finish(&mut self, tiers: &[RetentionTier]) -> Vec<ClosedRow> {
        let mut closed = Vec::new();
        for (tier_index, tier) in tiers.iter().enumerate() {
            if let Some(w) = self.open[tier_index].take() {
                closed.push(close(tier_index, tier, w));
            }
        }
        closed
    }
}

fn close(tier_index: usize, tier: &RetentionTier, w: OpenWindow) -> ClosedRow {
    ClosedRow {
        tier_index,
        window: w.window,
        value: consolidate(tier, w.known, w.acc),
    }
}

/// The xff rule: unknown iff strictly more than `m * xff` of the `m` expected
/// inputs are unknown. AVERAGE is the mean of the known inputs; MIN/MAX are
/// exact over them.
fn consolidate(tier: &RetentionTier, known: u32, acc: f64) -> Option<f64> {
    let expected = tier.step_multiplier;
    let unknown = expected.saturating_sub(known);
    if known == 0 || unknown as f64 > tier.xff * expected as f64 {
        return None;
    }
    Some(match tier.cf {
        ConsolidationFn::Average => acc / known as f64,
        ConsolidationFn::Min | ConsolidationFn::Max => acc,
    })
}
