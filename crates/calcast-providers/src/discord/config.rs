//! Discord publisher configuration.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{DEFAULT_TIMEOUT_SECS, default_user_agent};

/// Where and as whom the digest is published.
#[derive(Clone)]
pub struct DiscordConfig {
    /// API base, e.g. `https://discord.com/api/v10`.
    pub base_url: Url,

    /// Channel holding the digest message.
    pub channel_id: String,

    /// The message that is edited on every run.
    pub message_id: String,

    token: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl DiscordConfig {
    /// The public Discord API.
    pub const DEFAULT_BASE_PATH: &'static str = "https://discord.com/api/v10";

    /// Creates a new configuration.
    ///
    /// `token` may be given with or without its `Bot ` prefix.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base path is not a URL or any of
    /// the ids or the token is blank.
    pub fn new(
        base_path: impl AsRef<str>,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
        token: impl Into<String>,
    ) -> ProviderResult<Self> {
        let base_path = base_path.as_ref().trim();
        let base_url = Url::parse(base_path).map_err(|e| {
            ProviderError::configuration(format!("invalid Discord base path `{}`: {}", base_path, e))
                .with_source(e)
        })?;

        let channel_id = required("channel id", channel_id.into())?;
        let message_id = required("message id", message_id.into())?;
        let token = required("bot token", token.into())?;
        let token = token
            .strip_prefix("Bot ")
            .map(str::trim)
            .map(String::from)
            .unwrap_or(token);

        Ok(Self {
            base_url,
            channel_id,
            message_id,
            token,
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

    /// URL of the message to edit.
    pub fn message_url(&self) -> String {
        format!(
            "{}/channels/{}/messages/{}",
            self.base_url.as_str().trim_end_matches('/'),
            urlencoding::encode(&self.channel_id),
            urlencoding::encode(&self.message_id)
        )
    }

    /// Value of the `Authorization` header.
    pub(crate) fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("base_url", &self.base_url.as_str())
            .field("channel_id", &self.channel_id)
            .field("message_id", &self.message_id)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn required(what: &str, value: String) -> ProviderResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::configuration(format!("Discord {} is empty", what)));
    }
    Ok(trimmed.to_string())
}
