//! Player records: the durable per-cultivator state and its derived views.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::config::GameConfig;
use crate::cultivation::Cultivation;
use crate::realm::{Realm, Stage};

/// Days per in-game year used when deriving ages from elapsed ticks.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Stable external identity of a registered cultivator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PlayerId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u64> for PlayerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Battle and journey counters. The tick core only touches
/// `hours_cultivated`; the combat counters belong to future systems but are
/// part of the persisted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlayerStats {
    #[serde(default)]
    pub enemies_defeated: u64,
    #[serde(default)]
    pub tribulations_survived: u64,
    #[serde(default)]
    pub hours_cultivated: f64,
    #[serde(default)]
    pub steps_travelled: u64,
}

/// One equipment slot. Placeholder data: nothing in the core mutates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentSlot {
    pub name: String,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_equipment() -> BTreeMap<String, EquipmentSlot> {
    let slot = |name: &str, description: &str| EquipmentSlot {
        name: name.to_string(),
        item: None,
        description: Some(description.to_string()),
    };
    BTreeMap::from([
        ("weapon".to_string(), slot("Weapon", "Empty hand")),
        ("armor".to_string(), slot("Armor", "Tattered robes")),
        ("artifact".to_string(), slot("Artifact", "None")),
        ("ring".to_string(), slot("Ring", "None")),
    ])
}

/// Durable state of one cultivator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    /// Epoch seconds of registration. Immutable.
    pub registered_at: u64,
    /// Epoch seconds of the most recently applied in-game day. Never runs
    /// ahead of wall-clock time.
    pub last_tick_at: u64,
    pub cultivation: Cultivation,
    #[serde(default)]
    pub stats: PlayerStats,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default = "default_equipment")]
    pub equipment: BTreeMap<String, EquipmentSlot>,
}

impl PlayerRecord {
    /// Fresh record for a newly registered cultivator.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, now: u64, config: &GameConfig) -> Self {
        Self {
            id,
            name: name.into(),
            registered_at: now,
            last_tick_at: now,
            cultivation: Cultivation::with_rate(config.exp_gain_per_tick),
            stats: PlayerStats::default(),
            inventory: Vec::new(),
            equipment: default_equipment(),
        }
    }

    /// Age in in-game years: elapsed real seconds become in-game days at the
    /// tick interval, and 365 days make a year.
    #[must_use]
    pub fn age_years(&self, now: u64, config: &GameConfig) -> f64 {
        let elapsed = now.saturating_sub(self.registered_at);
        let days = elapsed as f64 / config.tick_interval_secs.max(1) as f64;
        days / DAYS_PER_YEAR
    }

    /// In-game years left before the realm's lifespan runs out. Never
    /// negative.
    #[must_use]
    pub fn remaining_lifespan_years(&self, now: u64, config: &GameConfig) -> f64 {
        let lifespan = config.progression.lifespan_years(self.cultivation.realm);
        (lifespan - self.age_years(now, config)).max(0.0)
    }

    /// Record a journey leg. Travel is tracked even while cultivating.
    pub fn record_travel(&mut self, steps: u64, destination: &str) -> String {
        self.stats.steps_travelled = self.stats.steps_travelled.saturating_add(steps);
        format!("Travelled {steps} steps toward {destination}.")
    }

    /// Read-only derived snapshot for display layers.
    #[must_use]
    pub fn profile(&self, now: u64, config: &GameConfig) -> PlayerProfile {
        let cultivation = self.cultivation;
        PlayerProfile {
            id: self.id,
            name: self.name.clone(),
            realm: cultivation.realm,
            stage: cultivation.stage,
            exp: cultivation.exp,
            required_exp: config
                .progression
                .required_exp(cultivation.realm, cultivation.stage),
            rate: cultivation.rate,
            ticks_until_next_stage: cultivation.ticks_until_next_stage(&config.progression),
            age_years: self.age_years(now, config),
            remaining_lifespan_years: self.remaining_lifespan_years(now, config),
            hours_cultivated: self.stats.hours_cultivated,
            enemies_defeated: self.stats.enemies_defeated,
            tribulations_survived: self.stats.tribulations_survived,
            steps_travelled: self.stats.steps_travelled,
        }
    }
}

/// Derived, display-ready view of one record. Computed from a snapshot;
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub name: String,
    pub realm: Realm,
    pub stage: Stage,
    pub exp: f64,
    pub required_exp: f64,
    pub rate: f64,
    pub ticks_until_next_stage: Option<u64>,
    pub age_years: f64,
    pub remaining_lifespan_years: f64,
    pub hours_cultivated: f64,
    pub enemies_defeated: u64,
    pub tribulations_survived: u64,
    pub steps_travelled: u64,
}
