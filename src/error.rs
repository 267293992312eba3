use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds a single trading tick can produce.
///
/// Callers branch on the kind instead of catching broad errors:
/// data and artifact problems turn the tick into an `ERROR` no-op,
/// persistence and venue problems are reported but never roll back a
/// position transition that already happened.
#[derive(Debug, Error)]
pub enum TickError {
    /// Market data or sentiment fetch failed after retries.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Model or scaler artifact could not be found or parsed.
    #[error("model artifact missing or unreadable: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// A log append failed. In-memory state may now be ahead of disk.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The execution venue rejected or failed an order.
    #[error("venue error: {0}")]
    Venue(String),

    /// Price input was missing, non-finite, or non-positive.
    #[error("invalid price input: {0}")]
    InvalidPrice(f64),
}

impl TickError {
    /// Whether this failure should surface as an `ERROR` signal tick
    /// (as opposed to being logged and carried past).
    pub fn is_error_tick(&self) -> bool {
        matches!(
            self,
            TickError::DataUnavailable(_) | TickError::ArtifactMissing(_)
        )
    }
}
