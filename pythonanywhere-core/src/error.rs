//! Error taxonomy for PythonAnywhere operations.

use thiserror::Error;

/// Error type covering both access paths and the console starter.
///
/// Errors never cross the public operation boundary as `Err` values: each
/// operation converts them into an [`crate::ApiResponse`] with the `error`
/// flag set. The enum exists so internal helpers can propagate with `?` and
/// so the diagnostic text stays consistent per failure class.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure; no response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response arrived but its status code was outside the expected set.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// The status code the server actually returned.
        status: u16,
        /// Operation-specific diagnostic.
        message: String,
    },

    /// The hidden CSRF token input was absent from the fetched page.
    #[error("CSRF token extraction failed")]
    TokenExtraction,

    /// Expected structured data (date, JSON) was missing or malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The platform rejected the supplied credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// An expected page fragment was absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid configuration (unknown region, client build failure).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Timed out waiting for the console marker element.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// Any other browser-driver failure.
    #[error("automation error: {0}")]
    Automation(String),
}
