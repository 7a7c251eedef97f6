//! Fixed-interval scheduler for digest runs.
//!
//! Runs never overlap: the loop awaits each run before it looks at the
//! next tick. A failed run is logged and recorded; the next attempt happens
//! at the next regular tick.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between runs.
    pub interval: Duration,
    /// Whether to run once at startup instead of waiting one interval.
    pub run_immediately: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            run_immediately: false,
        }
    }
}

impl SchedulerConfig {
    /// Creates a config with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Creates a config running every `hours` hours.
    pub fn every_hours(hours: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(hours) * 60 * 60))
    }

    /// Builder: run once at startup.
    pub fn with_run_immediately(mut self, run_immediately: bool) -> Self {
        self.run_immediately = run_immediately;
        self
    }
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run the job now, outside the regular cadence.
    RunNow,
    /// Stop the scheduler.
    Stop,
}

/// Bookkeeping about past runs.
///
/// Nothing here feeds back into a run; it is only read for logging and by
/// tests.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Runs started so far.
    pub total_runs: u64,
    /// Number of failed runs in a row.
    pub consecutive_failures: u32,
    /// Last successful run.
    pub last_success: Option<DateTime<Utc>>,
    /// Last run, successful or not.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Error of the last run, if it failed.
    pub last_error: Option<String>,
}

impl SchedulerState {
    /// Creates a new scheduler state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful run.
    pub fn record_success(&mut self) {
        let now = Utc::now();
        self.total_runs += 1;
        self.consecutive_failures = 0;
        self.last_success = Some(now);
        self.last_attempt = Some(now);
        self.last_error = None;
    }

    /// Records a failed run.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.total_runs += 1;
        self.consecutive_failures += 1;
        self.last_attempt = Some(Utc::now());
        self.last_error = Some(error.into());
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Drives a job on a fixed interval.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: Arc::new(RwLock::new(SchedulerState::new())),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the scheduler loop until [`SchedulerCommand::Stop`] arrives or
    /// every handle is dropped.
    pub async fn run<F, Fut, E>(self, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send,
        E: Display,
    {
        let Self {
            config,
            state,
            command_tx,
            mut command_rx,
        } = self;
        // Only external handles keep the channel open.
        drop(command_tx);

        info!(
            interval_secs = config.interval.as_secs(),
            run_immediately = config.run_immediately,
            "Scheduler started"
        );

        let first_tick = if config.run_immediately {
            Instant::now()
        } else {
            Instant::now() + config.interval
        };
        let mut ticker = tokio::time::interval_at(first_tick, config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Scheduled run");
                    run_once(&state, &job).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RunNow) => {
                            debug!("Received RunNow command");
                            run_once(&state, &job).await;
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("Scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}

async fn run_once<F, Fut, E>(state: &SharedSchedulerState, job: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    match job().await {
        Ok(()) => {
            state.write().await.record_success();
        }
        Err(e) => {
            let mut state = state.write().await;
            state.record_failure(e.to_string());
            warn!(
                error = %e,
                consecutive_failures = state.consecutive_failures,
                "Run failed, waiting for next tick"
            );
        }
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Triggers a run outside the regular cadence.
    pub async fn run_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::RunNow).await
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns a snapshot of the scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}
