//! Feed source configuration.

use std::time::Duration;
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{DEFAULT_TIMEOUT_SECS, default_user_agent};

/// Configuration for [`super::HttpFeedSource`].
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// The feed URL, always `http` or `https`.
    pub url: Url,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl FeedConfig {
    /// Creates a feed configuration for the given URL.
    ///
    /// A `webcal` or `webcals` scheme is rewritten to `https`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL does not parse or uses a
    /// scheme other than http(s) or webcal(s).
    pub fn new(url: impl AsRef<str>) -> ProviderResult<Self> {
        let raw = url.as_ref().trim();
        let parsed = match raw.split_once("://") {
            Some((scheme, rest))
                if scheme.eq_ignore_ascii_case("webcal") || scheme.eq_ignore_ascii_case("webcals") =>
            {
                Url::parse(&format!("https://{rest}"))
            }
            _ => Url::parse(raw),
        }
        .map_err(|e| {
            ProviderError::configuration(format!("invalid calendar URL `{}`: {}", raw, e))
                .with_source(e)
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::configuration(format!(
                "unsupported calendar URL scheme `{}`",
                parsed.scheme()
            )));
        }

        Ok(Self {
            url: parsed,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the URL as a string.
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }
}
