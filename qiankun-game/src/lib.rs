//! Qiankun Cultivation Engine
//!
//! Platform-agnostic core for the Qiankun idle cultivation world: a tick
//! scheduler turns real time into in-game days, a pure progression engine
//! advances cultivators through the stages of a realm, and an atomic
//! single-file store keeps every record durable. UI layers (chat bots,
//! menus) sit outside this crate and consume committed snapshots.

pub mod calendar;
pub mod config;
pub mod cultivation;
pub mod player;
pub mod realm;
#[cfg(feature = "async")]
pub mod scheduler;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use calendar::{CalendarStore, GameCalendar};
pub use config::{
    DEFAULT_EXP_GAIN_PER_TICK, DEFAULT_TICK_INTERVAL_SECS, GameConfig, ProgressionTable,
    RealmParams,
};
pub use cultivation::{Cultivation, StageAdvance, TickOutcome, apply_ticks};
pub use player::{EquipmentSlot, PlayerId, PlayerProfile, PlayerRecord, PlayerStats};
pub use realm::{Realm, Stage};
#[cfg(feature = "async")]
pub use scheduler::{Clock, SchedulerHandle, SystemClock, TickScheduler};
pub use service::{CultivationService, CycleReport};
pub use store::{
    JsonPlayerStore, MemoryPlayerStore, NotRegistered, PlayerStore, StoreError,
};
