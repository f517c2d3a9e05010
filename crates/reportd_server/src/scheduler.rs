//! Timer-driven eviction scans with explicit start/stop lifecycle.

use chrono::Utc;
use reportd_core::models::cleanup::{
    CleanupConfig, CleanupConfigPatch, CleanupSummary, ConfigChanges,
};
use reportd_core::{AppError, Database, EvictionPolicy};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

struct SchedulerState {
    config: CleanupConfig,
    timer: Option<JoinHandle<()>>,
}

/// Owns the mutable [`CleanupConfig`] and the timer task that applies it.
///
/// The timer runs one scan shortly after it starts, then one per
/// `scan_interval_ms`. Manual triggers run independently of the timer.
pub struct CleanupScheduler {
    db: Arc<Database>,
    startup_delay: Duration,
    state: Mutex<SchedulerState>,
    scans_completed: AtomicU64,
}

impl CleanupScheduler {
    /// Create a stopped scheduler.
    ///
    /// # Arguments
    /// - `db`: Shared report storage.
    /// - `config`: Initial eviction settings.
    /// - `startup_delay`: Grace period before the first scan after each start.
    pub fn new(db: Arc<Database>, config: CleanupConfig, startup_delay: Duration) -> Self {
        Self {
            db,
            startup_delay,
            state: Mutex::new(SchedulerState {
                config,
                timer: None,
            }),
            scans_completed: AtomicU64::new(0),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, SchedulerState>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::StorageMessage("Cleanup scheduler lock poisoned".to_string()))
    }

    /// Current eviction settings.
    ///
    /// # Errors
    /// Returns an error when the scheduler lock is poisoned.
    pub fn config(&self) -> Result<CleanupConfig, AppError> {
        Ok(self.state()?.config)
    }

    /// Whether a timer task is scheduled.
    ///
    /// # Errors
    /// Returns an error when the scheduler lock is poisoned.
    pub fn is_running(&self) -> Result<bool, AppError> {
        let state = self.state()?;
        Ok(Self::timer_running(&state))
    }

    /// Number of scans, timed or manual, that have run to completion.
    pub fn scans_completed(&self) -> u64 {
        self.scans_completed.load(Ordering::Relaxed)
    }

    fn timer_running(state: &SchedulerState) -> bool {
        state
            .timer
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start the timer if cleanup is enabled and no timer is running.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    /// `true` when a new timer was spawned.
    ///
    /// # Errors
    /// Returns an error when the scheduler lock is poisoned.
    pub fn start(self: &Arc<Self>) -> Result<bool, AppError> {
        let mut state = self.state()?;
        Ok(self.start_locked(&mut state))
    }

    fn start_locked(self: &Arc<Self>, state: &mut SchedulerState) -> bool {
        if !state.config.enabled {
            tracing::info!("Report cleanup is disabled");
            return false;
        }
        if Self::timer_running(state) {
            return false;
        }

        let period = Duration::from_millis(state.config.scan_interval_ms);
        tracing::info!(
            "Starting cleanup job: every {}ms, idle limit {}ms, age limit {}ms",
            state.config.scan_interval_ms,
            state.config.max_idle_ms,
            state.config.max_age_ms
        );
        state.timer = Some(tokio::spawn(run_timer(
            Arc::downgrade(self),
            period,
            self.startup_delay,
        )));
        true
    }

    /// Cancel the timer. A scan already in progress runs to completion.
    ///
    /// # Returns
    /// `true` when a running timer was cancelled.
    ///
    /// # Errors
    /// Returns an error when the scheduler lock is poisoned.
    pub fn stop(&self) -> Result<bool, AppError> {
        let mut state = self.state()?;
        Ok(Self::stop_locked(&mut state))
    }

    fn stop_locked(state: &mut SchedulerState) -> bool {
        let Some(handle) = state.timer.take() else {
            return false;
        };
        let was_running = !handle.is_finished();
        handle.abort();
        if was_running {
            tracing::info!("Cleanup job stopped");
        }
        was_running
    }

    /// Apply a partial configuration update and adjust the timer.
    ///
    /// - enabling with no timer running starts one; enabling again is a no-op;
    /// - disabling cancels the timer;
    /// - a new interval while enabled restarts the timer immediately;
    /// - threshold changes only affect the next scan.
    ///
    /// # Returns
    /// The accepted and ignored changes.
    ///
    /// # Errors
    /// Returns an error when the scheduler lock is poisoned.
    pub fn apply(self: &Arc<Self>, patch: CleanupConfigPatch) -> Result<ConfigChanges, AppError> {
        let mut state = self.state()?;
        let changes = state.config.apply(patch);
        for change in &changes.changes {
            tracing::info!("Cleanup config changed: {}", change);
        }

        match patch.enabled {
            Some(false) => {
                Self::stop_locked(&mut state);
            }
            Some(true) if !changes.interval_changed => {
                self.start_locked(&mut state);
            }
            _ => {}
        }
        if changes.interval_changed && state.config.enabled {
            Self::stop_locked(&mut state);
            self.start_locked(&mut state);
        }
        Ok(changes)
    }

    /// Run one scan now and wait for it, leaving the timer schedule alone.
    ///
    /// When cleanup is disabled no scan runs and nothing is deleted.
    ///
    /// # Returns
    /// Scan counts; `remaining` is always the current report count.
    ///
    /// # Errors
    /// Returns an error when a lock is poisoned or the scan task panics.
    pub async fn trigger_now(&self) -> Result<CleanupSummary, AppError> {
        let config = self.config()?;
        if !config.enabled {
            tracing::info!("Manual cleanup skipped: cleanup is disabled");
            return Ok(CleanupSummary {
                remaining: self.db.count()?,
                ..CleanupSummary::default()
            });
        }
        self.scan(EvictionPolicy::from_config(&config)).await
    }

    async fn scan(&self, policy: EvictionPolicy) -> Result<CleanupSummary, AppError> {
        let db = self.db.clone();
        let summary = tokio::task::spawn_blocking(move || db.sweep_expired(&policy, Utc::now()))
            .await
            .map_err(|err| AppError::StorageMessage(format!("Cleanup task failed: {}", err)))??;
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        Ok(summary)
    }

    async fn scheduled_scan(&self) {
        let config = match self.config() {
            Ok(config) => config,
            Err(err) => {
                tracing::error!("Cleanup failed: {}", err);
                return;
            }
        };
        if !config.enabled {
            return;
        }
        if let Err(err) = self.scan(EvictionPolicy::from_config(&config)).await {
            tracing::error!("Cleanup failed: {}", err);
        }
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            if let Some(handle) = state.timer.take() {
                handle.abort();
            }
        }
    }
}

async fn run_timer(scheduler: Weak<CleanupScheduler>, period: Duration, startup_delay: Duration) {
    // A period too large to schedule leaves only the startup scan.
    let mut ticker = Instant::now().checked_add(period).map(|first_tick| {
        let mut ticker = tokio::time::interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    tokio::time::sleep(startup_delay).await;
    loop {
        let Some(scheduler) = scheduler.upgrade() else {
            return;
        };
        scheduler.scheduled_scan().await;
        drop(scheduler);
        match ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
