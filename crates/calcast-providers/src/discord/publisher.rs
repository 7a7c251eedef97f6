//! The Discord publisher.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, check_response, transport_error};
use crate::provider::{BoxFuture, DigestPublisher};

use super::config::DiscordConfig;

const PROVIDER_NAME: &str = "discord";

/// Longest message content Discord accepts, in characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Body of an edit-message request.
#[derive(Debug, Serialize)]
struct EditMessage<'a> {
    content: &'a str,
}

/// The part of the returned message object we log.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
    #[serde(default)]
    edited_timestamp: Option<String>,
}

/// Publishes the digest by editing an existing Discord message.
#[derive(Debug, Clone)]
pub struct DiscordPublisher {
    client: Client,
    config: DiscordConfig,
}

impl DiscordPublisher {
    /// Creates a new publisher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: DiscordConfig) -> ProviderResult<Self> {
        let client = build_client(config.timeout, &config.user_agent)
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }

    #[instrument(skip(self, digest), fields(channel = %self.config.channel_id, message = %self.config.message_id))]
    async fn edit_message(&self, digest: &str) -> ProviderResult<()> {
        check_length(digest)?;

        let response = self
            .client
            .patch(self.config.message_url())
            .header("Authorization", self.config.authorization())
            .header("Accept", "application/json")
            .json(&EditMessage { content: digest })
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_response(response).await?;

        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e)).with_source(e)
        })?;
        match serde_json::from_str::<MessageResponse>(&body) {
            Ok(message) => debug!(
                id = %message.id,
                edited = message.edited_timestamp.as_deref().unwrap_or("-"),
                "Message updated"
            ),
            Err(e) => debug!(error = %e, "Message updated, response not understood"),
        }
        Ok(())
    }
}

impl DigestPublisher for DiscordPublisher {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn publish<'a>(&'a self, digest: &'a str) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.edit_message(digest)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}

fn check_length(digest: &str) -> ProviderResult<()> {
    let chars = digest.chars().count();
    if chars > MAX_CONTENT_CHARS {
        return Err(ProviderError::bad_request(format!(
            "digest is {} characters, Discord allows at most {}",
            chars, MAX_CONTENT_CHARS
        )));
    }
    Ok(())
}
