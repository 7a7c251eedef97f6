//! Shared HTTP plumbing for the feed source and the Discord publisher.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, trace};

use crate::error::{ProviderError, ProviderResult};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The `User-Agent` sent with every request.
pub fn default_user_agent() -> String {
    format!("calcast/{}", env!("CARGO_PKG_VERSION"))
}

/// Builds the HTTP client shared by a provider.
pub(crate) fn build_client(timeout: Duration, user_agent: &str) -> ProviderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| ProviderError::network(format!("failed to create HTTP client: {}", e)))
}

/// Maps a transport failure from `send()`.
pub(crate) fn transport_error(err: reqwest::Error) -> ProviderError {
    let error = if err.is_timeout() {
        ProviderError::network("request timeout")
    } else if err.is_connect() {
        ProviderError::network(format!("connection failed: {}", err))
    } else {
        ProviderError::network(format!("request failed: {}", err))
    };
    error.with_source(err)
}

/// Maps a non-success status to an error.
///
/// `retry_after` is the `Retry-After` header in seconds, when present.
pub fn status_error(status: StatusCode, body: &str, retry_after: Option<u64>) -> ProviderError {
    let body = body.trim();
    match status {
        StatusCode::BAD_REQUEST => ProviderError::bad_request(format!("request rejected: {}", body)),
        StatusCode::UNAUTHORIZED => ProviderError::authentication("credentials rejected"),
        StatusCode::FORBIDDEN => ProviderError::authorization("access denied"),
        StatusCode::NOT_FOUND => ProviderError::not_found("resource not found"),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        s if s.is_server_error() => ProviderError::server(format!("server error ({}): {}", s, body)),
        s => ProviderError::invalid_response(format!("unexpected status {}: {}", s, body)),
    }
}

/// Passes successful responses through and turns everything else into a
/// [`ProviderError`].
pub(crate) async fn check_response(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    trace!(status = %status, "Received response");

    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .map(|s| s.ceil() as u64);
    let body = response.text().await.unwrap_or_default();
    debug!(status = %status, body = %body, "Request failed");
    Err(status_error(status, &body, retry_after))
}
