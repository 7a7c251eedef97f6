//! The digest job: fetch, resolve, format, publish.
//!
//! A run either publishes a complete digest or fails without touching the
//! destination.

use std::time::Instant;

use calcast_core::{DigestFormatter, Window, resolve_at};
use calcast_providers::discord::DiscordPublisher;
use calcast_providers::feed::HttpFeedSource;
use calcast_providers::{CalendarSource, DigestPublisher, StdoutPublisher};
use chrono_tz::Tz;
use tracing::{debug, info, instrument};

use crate::config::{DigestConfig, PublishTarget};
use crate::error::{ServerError, ServerResult};

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Occurrences in the digest.
    pub occurrences: usize,
    /// The published text.
    pub digest: String,
}

/// One digest pipeline, wired to its source and destination.
pub struct DigestJob {
    source: Box<dyn CalendarSource>,
    publisher: Box<dyn DigestPublisher>,
    day_range: u32,
    timezone: Tz,
}

impl DigestJob {
    /// Creates a job from explicit parts.
    pub fn new(
        source: Box<dyn CalendarSource>,
        publisher: Box<dyn DigestPublisher>,
        day_range: u32,
        timezone: Tz,
    ) -> Self {
        Self {
            source,
            publisher,
            day_range,
            timezone,
        }
    }

    /// Builds the HTTP source and the configured publisher.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an HTTP client cannot be built.
    pub fn from_config(config: &DigestConfig) -> ServerResult<Self> {
        let source = HttpFeedSource::new(config.feed.clone())
            .map_err(|e| ServerError::config(e.to_string()))?;
        let publisher: Box<dyn DigestPublisher> = match &config.target {
            PublishTarget::Discord(discord) => Box::new(
                DiscordPublisher::new(discord.clone())
                    .map_err(|e| ServerError::config(e.to_string()))?,
            ),
            PublishTarget::DryRun => Box::new(StdoutPublisher),
        };
        Ok(Self::new(
            Box::new(source),
            publisher,
            config.day_range,
            config.timezone,
        ))
    }

    /// Runs the pipeline against a window starting now.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error; nothing is published then.
    pub async fn run(&self) -> ServerResult<RunReport> {
        self.run_in(Window::from_now(self.day_range)).await
    }

    /// Runs the pipeline against an explicit window.
    ///
    /// # Errors
    ///
    /// See [`DigestJob::run`].
    #[instrument(
        name = "digest_run",
        skip_all,
        fields(
            source = self.source.name(),
            publisher = self.publisher.name(),
            window_start = %window.start,
            window_end = %window.end,
        )
    )]
    pub async fn run_in(&self, window: Window) -> ServerResult<RunReport> {
        let started = Instant::now();

        let bytes = self.source.fetch().await.map_err(ServerError::Fetch)?;
        debug!(bytes = bytes.len(), "Fetched calendar");

        let occurrences = resolve_at(&bytes, &window, self.timezone)?;
        let digest = DigestFormatter::new(self.timezone).format(&occurrences);

        self.publisher
            .publish(&digest)
            .await
            .map_err(ServerError::Publish)?;

        info!(
            occurrences = occurrences.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Digest published"
        );
        Ok(RunReport {
            occurrences: occurrences.len(),
            digest,
        })
    }
}
