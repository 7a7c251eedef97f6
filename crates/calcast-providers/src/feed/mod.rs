//! HTTP calendar feed source.
//!
//! Downloads a published iCalendar feed with a plain GET. `webcal://` links,
//! as handed out by most calendar apps, are fetched over `https://`.
//!
//! # Example
//!
//! ```ignore
//! use calcast_providers::feed::{FeedConfig, HttpFeedSource};
//!
//! let config = FeedConfig::new("webcal://example.com/team.ics")?;
//! let source = HttpFeedSource::new(config)?;
//! let bytes = source.fetch().await?;
//! ```

mod config;
mod source;

pub use config::FeedConfig;
pub use source::HttpFeedSource;
