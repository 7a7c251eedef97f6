//! The calcast service: configuration, scheduling and the digest job.
//!
//! The `calcast` binary wires these together:
//!
//! - [`ServerSettings`] / [`DigestConfig`] - TOML file, flags and env
//! - [`DigestJob`] - fetch, resolve, format, publish
//! - [`Scheduler`] - runs the job on a fixed interval
//! - [`SignalHandler`] - SIGINT/SIGTERM shutdown, SIGHUP refresh
//!
//! # Example
//!
//! ```rust,no_run
//! use calcast_server::{DigestConfig, DigestJob, ServerSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ServerSettings::load()?;
//!     let config = DigestConfig::from_settings(&settings, true)?;
//!     let report = DigestJob::from_config(&config)?.run().await?;
//!     println!("{} occurrences", report.occurrences);
//!     Ok(())
//! }
//! ```

mod cli;
mod config;
mod error;
mod job;
mod scheduler;
mod signals;

pub use cli::Cli;
pub use config::{
    CalendarSettings, DEFAULT_DAY_RANGE, DEFAULT_FREQ_HOURS, DEFAULT_TIMEZONE, DigestConfig,
    DiscordSettings, PublishTarget, ScheduleSettings, ServerSettings,
};
pub use error::{ServerError, ServerResult};
pub use job::{DigestJob, RunReport};
pub use scheduler::{
    Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState,
};
pub use signals::{RefreshSignal, ShutdownSignal, SignalHandler};
