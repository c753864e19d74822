//! The tick scheduler: a supervised background task turning real time into
//! in-game days.
//!
//! On spawn it settles the offline gap once, then applies one cycle per tick
//! interval. Shutdown is cooperative and only observed between cycles, so a
//! cycle's batch either commits whole or has not started; the task is the
//! sole writer over the service it owns.
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, MissedTickBehavior};

use crate::service::{CultivationService, CycleReport};
use crate::store::PlayerStore;

/// Time source for the scheduler, injectable for deterministic tests.
pub trait Clock: Send + 'static {
    /// Current wall-clock time in epoch seconds.
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }
}

/// Spawner for the background tick task.
pub struct TickScheduler;

impl TickScheduler {
    /// Run the catch-up settle, then cycle every tick interval until
    /// [`SchedulerHandle::stop`] is called. The service moves into the task
    /// and comes back out of [`SchedulerHandle::join`].
    pub fn spawn<S, C>(mut service: CultivationService<S>, clock: C) -> SchedulerHandle<S>
    where
        S: PlayerStore + Send + 'static,
        C: Clock,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let catch_up = service.settle(clock.now());
            log_report("catch-up", &catch_up);

            let period = Duration::from_secs(service.config().tick_interval_secs.max(1));
            let mut timer = time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick completes immediately; the catch-up
            // settle already covered it.
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let report = service.settle(clock.now());
                        log_report("cycle", &report);
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            service
        });
        SchedulerHandle { stop_tx, task }
    }
}

fn log_report(label: &str, report: &CycleReport) {
    if report.is_quiet() {
        log::debug!("{label}: nothing to settle");
        return;
    }
    log::info!(
        "{label}: applied {} tick(s), {} advance(s), {} failed commit(s)",
        report.ticks_applied,
        report.advances.len(),
        report.failed_commits.len()
    );
}

/// Start/stop handle for a spawned scheduler.
pub struct SchedulerHandle<S: PlayerStore> {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<CultivationService<S>>,
}

impl<S: PlayerStore> SchedulerHandle<S> {
    /// Ask the loop to stop after the cycle in flight, if any.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Wait for the task to finish and recover the service.
    ///
    /// # Errors
    ///
    /// Returns the task's [`JoinError`] if it panicked or was aborted.
    pub async fn join(self) -> Result<CultivationService<S>, JoinError> {
        self.task.await
    }

    /// Stop, then join.
    ///
    /// # Errors
    ///
    /// Returns the task's [`JoinError`] if it panicked or was aborted.
    pub async fn shutdown(self) -> Result<CultivationService<S>, JoinError> {
        self.stop();
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::player::PlayerId;
    use crate::store::MemoryPlayerStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    const INTERVAL: u64 = 60;

    #[derive(Clone, Default)]
    struct SharedClock(Arc<AtomicU64>);

    impl SharedClock {
        fn at(start: u64) -> Self {
            Self(Arc::new(AtomicU64::new(start)))
        }

        fn advance(&self, secs: u64) {
            self.0.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for SharedClock {
        fn now(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    async fn drain_task_queue() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn service_with_player(
        registered_at: u64,
    ) -> CultivationService<MemoryPlayerStore> {
        let mut service =
            CultivationService::load(MemoryPlayerStore::new(), GameConfig::default()).unwrap();
        service.register(PlayerId(1), "Han", registered_at).unwrap();
        service
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_settles_the_offline_gap_once() {
        let service = service_with_player(1_000);
        // fifty intervals elapsed while the process was down
        let clock = SharedClock::at(1_000 + 50 * INTERVAL);

        let handle = TickScheduler::spawn(service, clock);
        drain_task_queue().await;

        let service = handle.shutdown().await.unwrap();
        let record = service.player(PlayerId(1)).unwrap();
        assert_eq!(record.cultivation.exp, 50.0);
        assert_eq!(record.last_tick_at, 1_000 + 50 * INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn live_loop_applies_one_tick_per_interval() {
        let service = service_with_player(0);
        let clock = SharedClock::at(0);

        let handle = TickScheduler::spawn(service, clock.clone());
        drain_task_queue().await;

        for _ in 0..3 {
            clock.advance(INTERVAL);
            time::advance(Duration::from_secs(INTERVAL)).await;
            drain_task_queue().await;
        }

        let service = handle.shutdown().await.unwrap();
        let record = service.player(PlayerId(1)).unwrap();
        assert_eq!(record.cultivation.exp, 3.0);
        assert_eq!(record.last_tick_at, 3 * INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_takes_effect_between_cycles() {
        let service = service_with_player(0);
        let clock = SharedClock::at(0);

        let handle = TickScheduler::spawn(service, clock.clone());
        drain_task_queue().await;

        // the next timer tick is a full interval away; the stop signal wins
        handle.stop();
        clock.advance(10 * INTERVAL);

        let service = handle.join().await.unwrap();
        let record = service.player(PlayerId(1)).unwrap();
        assert_eq!(record.cultivation.exp, 0.0);
        assert_eq!(record.last_tick_at, 0);
    }
}
