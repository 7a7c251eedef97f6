//! Core pipeline: calendar parsing, occurrence resolution, digest formatting

pub mod calendar;
pub mod error;
pub mod event;
pub mod format;
pub mod resolve;
pub mod time;
pub mod tracing;

pub use calendar::CalendarDocument;
pub use error::{CoreError, CoreResult};
pub use event::{EventDefinition, EventStart, Occurrence, UNTITLED};
pub use format::{format_digest, DigestFormatter};
pub use resolve::{resolve, resolve_at, resolve_document};
pub use time::{localize, parse_timezone, Window};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
