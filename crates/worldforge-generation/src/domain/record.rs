//! Audit records for remote generation calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::call::{CallCorrelation, CallKind, TokenUsage};

/// What the executor knows about a logical call when it reaches a terminal
/// outcome. The recorder turns this into a [`CallAttemptRecord`].
#[derive(Debug, Clone)]
pub struct CallRecordDraft {
    /// Pre-assigned record ID, if the caller has one.
    pub id: Option<Uuid>,
    /// Call kind.
    pub kind: CallKind,
    /// Entity correlation.
    pub correlation: CallCorrelation,
    /// Prompt sent to the backend.
    pub prompt: String,
    /// Whether the final attempt succeeded.
    pub success: bool,
    /// Raw response of the successful attempt.
    pub response: Option<String>,
    /// Error message of the last failed attempt.
    pub error: Option<String>,
    /// Model identifier.
    pub model: Option<String>,
    /// Token usage, for text calls.
    pub usage: Option<TokenUsage>,
    /// Wall time across all attempts and backoff waits.
    pub duration_ms: u64,
    /// Attempts beyond the first.
    pub retry_count: u32,
    /// Pre-assigned timestamp, if the caller has one.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// One persisted record per logical remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallAttemptRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Call kind.
    pub kind: CallKind,
    /// Entity correlation.
    pub correlation: CallCorrelation,
    /// Prompt sent to the backend.
    pub prompt: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Raw response on success.
    pub response: Option<String>,
    /// Last error on failure.
    pub error: Option<String>,
    /// Model identifier.
    pub model: Option<String>,
    /// Token usage, for text calls.
    pub usage: Option<TokenUsage>,
    /// Wall time across all attempts.
    pub duration_ms: u64,
    /// Attempts beyond the first.
    pub retry_count: u32,
    /// When the record was made.
    pub recorded_at: DateTime<Utc>,
}
