//! The HTTP feed source.

use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, check_response, transport_error};
use crate::provider::{BoxFuture, CalendarSource};

use super::config::FeedConfig;

const PROVIDER_NAME: &str = "feed";

/// Fetches a calendar feed over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: Client,
    config: FeedConfig,
}

impl HttpFeedSource {
    /// Creates a new feed source.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: FeedConfig) -> ProviderResult<Self> {
        let client = build_client(config.timeout, &config.user_agent)
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    #[instrument(skip(self), fields(host = self.config.url.host_str().unwrap_or_default()))]
    async fn download(&self) -> ProviderResult<Vec<u8>> {
        let response = self
            .client
            .get(self.config.url.clone())
            .header("Accept", "text/calendar, */*;q=0.5")
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_response(response).await?;

        let bytes = response.bytes().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e)).with_source(e)
        })?;
        debug!(bytes = bytes.len(), "Downloaded calendar feed");
        Ok(bytes.to_vec())
    }
}

impl CalendarSource for HttpFeedSource {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch(&self) -> BoxFuture<'_, ProviderResult<Vec<u8>>> {
        Box::pin(async move {
            self.download()
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use std::time::Duration;

    #[test]
    fn source_creation() {
        let config = FeedConfig::new("https://example.com/cal.ics").unwrap();
        let source = HttpFeedSource::new(config).unwrap();
        assert_eq!(source.name(), "feed");
        assert_eq!(source.config().url_str(), "https://example.com/cal.ics");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 on localhost is the discard service; nothing listens there.
        let config = FeedConfig::new("http://127.0.0.1:9/cal.ics")
            .unwrap()
            .with_timeout(Duration::from_secs(2));
        let source = HttpFeedSource::new(config).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        assert_eq!(err.provider(), Some("feed"));
    }
}
