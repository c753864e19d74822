//! The cultivation engine: pure application of elapsed in-game days.
//!
//! [`apply_ticks`] is the only mutation path for progression state. It is
//! batched: catch-up windows of thousands of ticks settle in time
//! proportional to the stage boundaries crossed, not the ticks elapsed, and
//! one batched call produces exactly the same record as the equivalent
//! sequence of single-tick calls.
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, ProgressionTable};
use crate::player::PlayerRecord;
use crate::realm::{Realm, Stage};

const SECS_PER_HOUR: f64 = 3600.0;

/// Progression state of one cultivator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cultivation {
    #[serde(default)]
    pub realm: Realm,
    #[serde(default)]
    pub stage: Stage,
    /// Experience toward the next stage. After every settle this sits in
    /// `[0, required_exp)` for the current stage.
    #[serde(default)]
    pub exp: f64,
    /// Experience gained per tick.
    #[serde(default = "Cultivation::default_rate")]
    pub rate: f64,
}

impl Cultivation {
    const fn default_rate() -> f64 {
        crate::config::DEFAULT_EXP_GAIN_PER_TICK
    }

    /// Fresh progression state at the bottom of the first realm.
    #[must_use]
    pub fn with_rate(rate: f64) -> Self {
        Self {
            realm: Realm::default(),
            stage: Stage::default(),
            exp: 0.0,
            rate,
        }
    }

    /// Ticks left until the next stage threshold is reached, or `None` at
    /// the peak or when the rate cannot make progress.
    #[must_use]
    pub fn ticks_until_next_stage(&self, table: &ProgressionTable) -> Option<u64> {
        if self.stage.is_peak() || self.rate <= 0.0 {
            return None;
        }
        let required = table.required_exp(self.realm, self.stage);
        let deficit = (required - self.exp).max(0.0);
        Some((deficit / self.rate).ceil() as u64)
    }
}

impl Default for Cultivation {
    fn default() -> Self {
        Self::with_rate(Self::default_rate())
    }
}

/// One stage boundary crossed while applying ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageAdvance {
    pub realm: Realm,
    pub stage: Stage,
}

/// What a batch of ticks did to a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub ticks_applied: u64,
    pub advances: Vec<StageAdvance>,
}

/// Apply `ticks` elapsed in-game days to `record`. Pure compute, no I/O.
///
/// Experience overflow at a stage boundary carries forward into the next
/// stage; the peak of the active realm is absorbing (realm breakthroughs are
/// disabled), where experience clamps just below the final threshold while
/// hours keep accruing.
pub fn apply_ticks(record: &mut PlayerRecord, ticks: u64, config: &GameConfig) -> TickOutcome {
    let mut advances = Vec::new();
    if ticks > 0 {
        grow(&mut record.cultivation, ticks, &config.progression, &mut advances);
        let interval = config.tick_interval_secs.max(1);
        record.stats.hours_cultivated +=
            (ticks as f64) * (interval as f64) / SECS_PER_HOUR;
        record.last_tick_at = record
            .last_tick_at
            .saturating_add(ticks.saturating_mul(interval));
    }
    TickOutcome {
        ticks_applied: ticks,
        advances,
    }
}

fn grow(
    cultivation: &mut Cultivation,
    ticks: u64,
    table: &ProgressionTable,
    advances: &mut Vec<StageAdvance>,
) {
    let mut remaining = ticks;
    while remaining > 0 && !cultivation.stage.is_peak() {
        if cultivation.rate <= 0.0 {
            return;
        }
        let required = table.required_exp(cultivation.realm, cultivation.stage);
        if !(required > 0.0) {
            return;
        }
        // Chunk up to the next threshold so huge catch-up windows cost one
        // addition per stage crossing.
        let deficit = (required - cultivation.exp).max(0.0);
        let to_threshold = ((deficit / cultivation.rate).ceil() as u64).max(1);
        let step = to_threshold.min(remaining);
        cultivation.exp += cultivation.rate * step as f64;
        remaining -= step;
        settle(cultivation, table, advances);
    }
    if cultivation.stage.is_peak() && remaining > 0 && cultivation.rate > 0.0 {
        let cap = peak_cap(cultivation.realm, table);
        cultivation.exp = (cultivation.exp + cultivation.rate * remaining as f64).min(cap);
    }
}

/// Consume threshold crossings, carrying overflow into the next stage.
fn settle(
    cultivation: &mut Cultivation,
    table: &ProgressionTable,
    advances: &mut Vec<StageAdvance>,
) {
    while let Some(next) = cultivation.stage.next() {
        let required = table.required_exp(cultivation.realm, cultivation.stage);
        if !(required > 0.0) || cultivation.exp < required {
            return;
        }
        cultivation.exp -= required;
        cultivation.stage = next;
        advances.push(StageAdvance {
            realm: cultivation.realm,
            stage: next,
        });
    }
    // Overflow landed on the absorbing peak: hold below its threshold.
    let cap = peak_cap(cultivation.realm, table);
    if cultivation.exp > cap {
        cultivation.exp = cap;
    }
}

fn peak_cap(realm: Realm, table: &ProgressionTable) -> f64 {
    (table.required_exp(realm, Stage::Peak) - 1.0).max(0.0)
}
