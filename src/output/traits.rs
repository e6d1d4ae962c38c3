//! Record sink trait and errors
//!
//! A sink receives every completed product record of a crawl. Detail fetches
//! finish concurrently, so sinks are called from many tasks at once and must
//! serialize their own writes.

use crate::product::ProductRecord;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink lock poisoned")]
    Poisoned,

    #[error("Failed to write record: {0}")]
    Write(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Append-only destination for product records
///
/// The sink owns the output format and column order; callers only guarantee
/// that each record is complete.
pub trait RecordSink: Send + Sync {
    /// Appends one record
    ///
    /// Called directly from async crawl tasks, so implementations should
    /// return quickly.
    fn write(&self, record: ProductRecord) -> SinkResult<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for std::sync::Arc<S> {
    fn write(&self, record: ProductRecord) -> SinkResult<()> {
        (**self).write(record)
    }
}
