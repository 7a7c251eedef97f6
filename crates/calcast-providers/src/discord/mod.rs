//! Discord message publisher.
//!
//! The digest lives in one bot message that is edited in place on every
//! run.
//!
//! # Example
//!
//! ```ignore
//! use calcast_providers::discord::{DiscordConfig, DiscordPublisher};
//!
//! let config = DiscordConfig::new(DiscordConfig::DEFAULT_BASE_PATH, "123", "456", token)?;
//! let publisher = DiscordPublisher::new(config)?;
//! publisher.publish("* 3/4 @ 9:00 AM, Standup\n").await?;
//! ```

mod config;
mod publisher;

pub use config::DiscordConfig;
pub use publisher::{DiscordPublisher, MAX_CONTENT_CHARS};
