//! Tunable configuration consumed by the progression core.
//!
//! The shapes here are plain `serde` data so an outer layer can load them
//! from a JSON file; every field has a default reproducing the built-in
//! balance, and [`GameConfig::sanitize`] clamps degenerate values so the
//! engine never sees a zero interval or a non-finite threshold.
use serde::{Deserialize, Serialize};

use crate::realm::{Realm, Stage};

pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_EXP_GAIN_PER_TICK: f64 = 1.0;

/// Default lifespan in in-game years, indexed by realm order.
const DEFAULT_LIFESPAN_YEARS: [f64; 8] = [
    120.0, 200.0, 350.0, 600.0, 1000.0, 1800.0, 3000.0, 5000.0,
];

/// Top-level configuration for the tick scheduler and cultivation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seconds of real time per in-game day.
    #[serde(default = "GameConfig::default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Experience granted per tick to newly registered cultivators.
    #[serde(default = "GameConfig::default_exp_gain_per_tick")]
    pub exp_gain_per_tick: f64,
    /// Per-realm stage thresholds and lifespans.
    #[serde(default)]
    pub progression: ProgressionTable,
}

impl GameConfig {
    const fn default_tick_interval_secs() -> u64 {
        DEFAULT_TICK_INTERVAL_SECS
    }

    const fn default_exp_gain_per_tick() -> f64 {
        DEFAULT_EXP_GAIN_PER_TICK
    }

    /// Clamp invalid entries back to the built-in balance values.
    pub fn sanitize(&mut self) {
        if self.tick_interval_secs == 0 {
            self.tick_interval_secs = DEFAULT_TICK_INTERVAL_SECS;
        }
        if !self.exp_gain_per_tick.is_finite() || self.exp_gain_per_tick <= 0.0 {
            self.exp_gain_per_tick = DEFAULT_EXP_GAIN_PER_TICK;
        }
        self.progression.sanitize();
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            exp_gain_per_tick: DEFAULT_EXP_GAIN_PER_TICK,
            progression: ProgressionTable::default(),
        }
    }
}

/// Ordered per-realm progression rows.
///
/// Realms beyond the first are carried as data even though breakthroughs to
/// them are disabled, so re-enabling them later is a table edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionTable {
    pub realms: Vec<RealmParams>,
}

/// Thresholds and lifespan for one realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmParams {
    pub realm: Realm,
    /// Total lifespan granted by this realm, in in-game years.
    pub lifespan_years: f64,
    /// Experience required to leave each stage, indexed by stage order.
    pub stage_exp: Vec<f64>,
}

impl ProgressionTable {
    /// Experience required to advance out of `stage` in `realm`.
    #[must_use]
    pub fn required_exp(&self, realm: Realm, stage: Stage) -> f64 {
        self.row(realm)
            .and_then(|row| row.stage_exp.get(stage.index()).copied())
            .filter(|exp| exp.is_finite() && *exp >= 1.0)
            .unwrap_or_else(|| default_required_exp(realm, stage))
    }

    /// Lifespan in in-game years for a cultivator of `realm`.
    #[must_use]
    pub fn lifespan_years(&self, realm: Realm) -> f64 {
        self.row(realm)
            .map(|row| row.lifespan_years)
            .filter(|years| years.is_finite() && *years > 0.0)
            .unwrap_or(DEFAULT_LIFESPAN_YEARS[realm.index()])
    }

    fn row(&self, realm: Realm) -> Option<&RealmParams> {
        self.realms.iter().find(|row| row.realm == realm)
    }

    /// Fill in missing realms and clamp degenerate thresholds.
    pub fn sanitize(&mut self) {
        for realm in Realm::ORDER {
            if !self.realms.iter().any(|row| row.realm == realm) {
                self.realms.push(default_realm_params(realm));
            }
        }
        for row in &mut self.realms {
            if !row.lifespan_years.is_finite() || row.lifespan_years <= 0.0 {
                row.lifespan_years = DEFAULT_LIFESPAN_YEARS[row.realm.index()];
            }
            row.stage_exp
                .resize(Stage::ORDER.len(), f64::NAN);
            for (index, exp) in row.stage_exp.iter_mut().enumerate() {
                if !exp.is_finite() || *exp < 1.0 {
                    *exp = default_required_exp(row.realm, Stage::ORDER[index]);
                }
            }
        }
    }
}

impl Default for ProgressionTable {
    fn default() -> Self {
        Self {
            realms: Realm::ORDER.into_iter().map(default_realm_params).collect(),
        }
    }
}

fn default_realm_params(realm: Realm) -> RealmParams {
    RealmParams {
        realm,
        lifespan_years: DEFAULT_LIFESPAN_YEARS[realm.index()],
        stage_exp: Stage::ORDER
            .into_iter()
            .map(|stage| default_required_exp(realm, stage))
            .collect(),
    }
}

/// Built-in threshold curve: each realm's base cost scales with its depth,
/// each stage multiplies the base again.
fn default_required_exp(realm: Realm, stage: Stage) -> f64 {
    let base = (realm.index() as f64 + 1.0) * 100.0;
    base * (stage.index() as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_threshold_curve() {
        let table = ProgressionTable::default();
        assert_eq!(table.required_exp(Realm::QiCondensation, Stage::Initial), 100.0);
        assert_eq!(table.required_exp(Realm::QiCondensation, Stage::Peak), 500.0);
        assert_eq!(
            table.required_exp(Realm::FoundationEstablishment, Stage::Early),
            400.0
        );
        assert_eq!(table.required_exp(Realm::GreatAscension, Stage::Peak), 4000.0);
    }

    #[test]
    fn default_lifespans_grow_with_realm_depth() {
        let table = ProgressionTable::default();
        assert_eq!(table.lifespan_years(Realm::QiCondensation), 120.0);
        let mut previous = 0.0;
        for realm in Realm::ORDER {
            let lifespan = table.lifespan_years(realm);
            assert!(lifespan > previous);
            previous = lifespan;
        }
    }

    #[test]
    fn sanitize_restores_degenerate_values() {
        let mut config = GameConfig {
            tick_interval_secs: 0,
            exp_gain_per_tick: f64::NAN,
            progression: ProgressionTable {
                realms: vec![RealmParams {
                    realm: Realm::QiCondensation,
                    lifespan_years: -5.0,
                    stage_exp: vec![0.0, f64::INFINITY],
                }],
            },
        };
        config.sanitize();

        assert_eq!(config.tick_interval_secs, DEFAULT_TICK_INTERVAL_SECS);
        assert_eq!(config.exp_gain_per_tick, DEFAULT_EXP_GAIN_PER_TICK);
        assert_eq!(config.progression.lifespan_years(Realm::QiCondensation), 120.0);
        assert_eq!(
            config.progression.required_exp(Realm::QiCondensation, Stage::Initial),
            100.0
        );
        assert_eq!(
            config.progression.required_exp(Realm::QiCondensation, Stage::Peak),
            500.0
        );
        // missing realms are appended
        assert_eq!(config.progression.realms.len(), Realm::ORDER.len());
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: GameConfig = serde_json::from_str("{\"tick_interval_secs\": 5}").unwrap();
        assert_eq!(config.tick_interval_secs, 5);
        assert_eq!(config.exp_gain_per_tick, DEFAULT_EXP_GAIN_PER_TICK);
        assert_eq!(
            config.progression.required_exp(Realm::QiCondensation, Stage::Initial),
            100.0
        );
    }
}
