//! Calendar sources and digest publishers.
//!
//! - [`CalendarSource`] - yields raw iCalendar bytes
//! - [`DigestPublisher`] - puts the rendered digest somewhere
//! - [`ProviderError`] - error type shared by both
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                       ┌──────────────────┐
//! │  HTTP(S) feed   │                       │   Discord API    │
//! └────────┬────────┘                       └────────▲─────────┘
//!          │ GET                                     │ PATCH
//! ┌────────▼────────┐   bytes   ┌────────┐  text  ┌──┴───────────────┐
//! │ HttpFeedSource  ├──────────▶│  core  ├───────▶│ DiscordPublisher │
//! └─────────────────┘           └────────┘        └──────────────────┘
//! ```

#[cfg(feature = "discord")]
pub mod discord;
pub mod error;
#[cfg(feature = "feed")]
pub mod feed;
#[cfg(any(feature = "feed", feature = "discord"))]
pub mod http;
pub mod provider;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{
    BoxFuture, CalendarSource, DigestPublisher, ErrorSource, StaticSource, StdoutPublisher,
};
