//! Source and publisher traits.
//!
//! A digest run reads raw calendar bytes from a [`CalendarSource`] and hands
//! the rendered text to a [`DigestPublisher`]. Both traits return boxed
//! futures so the job can hold them as trait objects.

use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxing keeps the traits object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that yields the raw bytes of an iCalendar document.
///
/// # Example Implementation
///
/// ```ignore
/// struct FileSource { path: PathBuf }
///
/// impl CalendarSource for FileSource {
///     fn name(&self) -> &str { "file" }
///
///     fn fetch(&self) -> BoxFuture<'_, ProviderResult<Vec<u8>>> {
///         Box::pin(async move {
///             std::fs::read(&self.path).map_err(|e| ProviderError::network(e.to_string()))
///         })
///     }
/// }
/// ```
pub trait CalendarSource: Send + Sync {
    /// Returns the name of this source (e.g. "feed").
    fn name(&self) -> &str;

    /// Fetches the current calendar document.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on transport failures or non-success
    /// responses.
    fn fetch(&self) -> BoxFuture<'_, ProviderResult<Vec<u8>>>;
}

/// Something that puts a rendered digest in front of readers.
pub trait DigestPublisher: Send + Sync {
    /// Returns the name of this publisher (e.g. "discord").
    fn name(&self) -> &str;

    /// Publishes the digest, replacing whatever was published before.
    ///
    /// An empty digest is valid and is published as-is.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the destination rejects the update.
    fn publish<'a>(&'a self, digest: &'a str) -> BoxFuture<'a, ProviderResult<()>>;
}

/// A source that always returns the same bytes.
#[derive(Debug, Clone)]
pub struct StaticSource {
    bytes: Vec<u8>,
}

impl StaticSource {
    /// Creates a source serving `bytes`.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl CalendarSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self) -> BoxFuture<'_, ProviderResult<Vec<u8>>> {
        let bytes = self.bytes.clone();
        Box::pin(async move { Ok(bytes) })
    }
}

/// A source that always fails.
///
/// Stands in for a source that could not be constructed.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: ProviderError,
}

impl ErrorSource {
    /// Creates a new failing source.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl CalendarSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> BoxFuture<'_, ProviderResult<Vec<u8>>> {
        // ProviderError is not Clone; rebuild it from its parts.
        let error =
            ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}

/// A publisher that writes the digest to standard output.
///
/// Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutPublisher;

impl DigestPublisher for StdoutPublisher {
    fn name(&self) -> &str {
        "stdout"
    }

    fn publish<'a>(&'a self, digest: &'a str) -> BoxFuture<'a, ProviderResult<()>> {
        let mut stdout = std::io::stdout().lock();
        let result = stdout
            .write_all(digest.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| {
                ProviderError::network("failed to write digest to stdout")
                    .with_provider("stdout")
                    .with_source(e)
            });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[tokio::test]
    async fn static_source_returns_bytes() {
        let source = StaticSource::new("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n");
        assert_eq!(source.name(), "static");

        let bytes = source.fetch().await.unwrap();
        assert!(bytes.starts_with(b"BEGIN:VCALENDAR"));

        // Repeated fetches see the same document.
        assert_eq!(source.fetch().await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn error_source_fails() {
        let source = ErrorSource::new("feed", ProviderError::not_found("calendar is gone"));
        assert_eq!(source.name(), "feed");

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert_eq!(err.provider(), Some("feed"));
        assert_eq!(err.message(), "calendar is gone");
    }

    #[tokio::test]
    async fn stdout_publisher_accepts_empty_digest() {
        let publisher = StdoutPublisher;
        assert_eq!(publisher.name(), "stdout");
        publisher.publish("").await.unwrap();
    }

    #[test]
    fn traits_are_object_safe() {
        let _sources: Vec<Box<dyn CalendarSource>> = vec![
            Box::new(StaticSource::new(Vec::new())),
            Box::new(ErrorSource::new("x", ProviderError::network("down"))),
        ];
        let _publisher: Box<dyn DigestPublisher> = Box::new(StdoutPublisher);
    }
}
