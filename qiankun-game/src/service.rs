//! The cultivation service: the single writer over all player records.
//!
//! Owns the in-memory map loaded from a [`PlayerStore`] and reconciles it
//! against wall-clock time through one settle path used both for startup
//! catch-up and for each live cycle. Readers outside the tick task consume
//! committed snapshots from the store; nothing here blocks on the network.
use std::collections::{BTreeMap, BTreeSet};

use crate::config::GameConfig;
use crate::cultivation::{self, StageAdvance};
use crate::player::{PlayerId, PlayerProfile, PlayerRecord};
use crate::store::{NotRegistered, PlayerStore, StoreError};

/// What one settle pass did across all players.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Total in-game days applied across all players.
    pub ticks_applied: u64,
    /// Stage boundaries crossed, with the player who crossed them.
    pub advances: Vec<(PlayerId, StageAdvance)>,
    /// Commits that failed and will be retried next cycle.
    pub failed_commits: Vec<(PlayerId, StoreError)>,
}

impl CycleReport {
    /// True when the pass changed nothing and nothing is awaiting retry.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.ticks_applied == 0 && self.failed_commits.is_empty()
    }
}

/// Register/lookup/settle facade over a [`PlayerStore`].
pub struct CultivationService<S: PlayerStore> {
    store: S,
    config: GameConfig,
    players: BTreeMap<PlayerId, PlayerRecord>,
    /// Records whose last commit failed; retried on the next cycle.
    pending_commits: BTreeSet<PlayerId>,
}

impl<S: PlayerStore> CultivationService<S> {
    /// Load every persisted record into memory.
    ///
    /// # Errors
    ///
    /// Fails when the backing store exists but is unreadable or corrupt;
    /// existing data is never silently discarded.
    pub fn load(store: S, config: GameConfig) -> Result<Self, StoreError> {
        let players = store.load_all()?;
        Ok(Self {
            store,
            config,
            players,
            pending_commits: BTreeSet::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Iterate the in-memory records.
    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    /// Register a new cultivator at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyRegistered`] for a duplicate id (the
    /// original record is untouched), or the store's failure if the initial
    /// commit does not land.
    pub fn register(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        now: u64,
    ) -> Result<&PlayerRecord, StoreError> {
        if self.players.contains_key(&id) {
            return Err(StoreError::AlreadyRegistered(id));
        }
        let record = PlayerRecord::new(id, name, now, &self.config);
        self.store.create(&record)?;
        Ok(self.players.entry(id).or_insert(record))
    }

    /// Look up a registered cultivator.
    ///
    /// # Errors
    ///
    /// Returns [`NotRegistered`] when no record exists for `id`.
    pub fn player(&self, id: PlayerId) -> Result<&PlayerRecord, NotRegistered> {
        self.players.get(&id).ok_or(NotRegistered(id))
    }

    /// Derived display snapshot for a registered cultivator.
    ///
    /// # Errors
    ///
    /// Returns [`NotRegistered`] when no record exists for `id`.
    pub fn profile(&self, id: PlayerId, now: u64) -> Result<PlayerProfile, NotRegistered> {
        self.player(id).map(|record| record.profile(now, &self.config))
    }

    /// Reconcile every player against `now`.
    ///
    /// Each player's elapsed whole intervals since `last_tick_at` are applied
    /// as one batched engine call; `last_tick_at` advances by the consumed
    /// intervals only, so sub-interval remainder time is preserved for the
    /// next cycle. At steady state this applies exactly one tick per player
    /// per cycle; after downtime it performs the whole catch-up at once.
    ///
    /// Every changed record gets exactly one commit. A failed commit keeps
    /// the advanced record in memory and queues it for retry, leaving the
    /// durable `last_tick_at` at the last confirmed point; failures never
    /// abort the rest of the pass.
    pub fn settle(&mut self, now: u64) -> CycleReport {
        let interval = self.config.tick_interval_secs.max(1);
        let mut report = CycleReport::default();
        let ids: Vec<PlayerId> = self.players.keys().copied().collect();
        for id in ids {
            let Some(record) = self.players.get_mut(&id) else {
                continue;
            };
            let elapsed = now.saturating_sub(record.last_tick_at) / interval;
            let mut dirty = self.pending_commits.contains(&id);
            if elapsed > 0 {
                let outcome = cultivation::apply_ticks(record, elapsed, &self.config);
                report.ticks_applied += outcome.ticks_applied;
                for advance in outcome.advances {
                    log::info!(
                        "{} advanced to the {} stage of {}",
                        record.name,
                        advance.stage,
                        advance.realm
                    );
                    report.advances.push((id, advance));
                }
                dirty = true;
            }
            if dirty {
                match self.store.save(record) {
                    Ok(()) => {
                        self.pending_commits.remove(&id);
                    }
                    Err(err) => {
                        log::warn!("commit for {} failed, retrying next cycle: {err}", record.name);
                        self.pending_commits.insert(id);
                        report.failed_commits.push((id, err));
                    }
                }
            }
        }
        report
    }

    /// Tear down into the underlying store, e.g. after the scheduler stops.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}
