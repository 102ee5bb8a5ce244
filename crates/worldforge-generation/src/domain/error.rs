//! Failure modes of a single remote generation attempt.

use std::time::Duration;

use thiserror::Error;

/// Why one attempt at a remote generation call failed.
///
/// Every variant is retried by the call executor until the attempt budget is
/// spent; no variant is treated as permanent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The backend answered but the payload was missing or empty.
    #[error("empty payload")]
    EmptyPayload,

    /// The payload could not be parsed into the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The backend answered with a non-2xx status.
    #[error("transport error: status {status}: {body}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Request(String),

    /// The attempt exceeded its time budget and was abandoned.
    #[error("attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}
