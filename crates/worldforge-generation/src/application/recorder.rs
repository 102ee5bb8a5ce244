//! Call Recorder: persists one audit record per logical remote call.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use worldforge_core::clock::Clock;

use crate::domain::ports::CallRecordRepository;
use crate::domain::record::{CallAttemptRecord, CallRecordDraft};

/// Stamps call drafts with an ID and timestamp and hands them to the
/// call-record repository.
///
/// Persistence failures are logged and swallowed: a record that cannot be
/// stored never fails the call it describes.
#[derive(Clone)]
pub struct CallRecorder {
    repository: Arc<dyn CallRecordRepository>,
    clock: Arc<dyn Clock>,
}

impl CallRecorder {
    /// Creates a recorder writing to `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn CallRecordRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Records a terminal call outcome and returns the stored record.
    pub async fn record(&self, draft: CallRecordDraft) -> CallAttemptRecord {
        let record = CallAttemptRecord {
            id: draft.id.unwrap_or_else(Uuid::new_v4),
            kind: draft.kind,
            correlation: draft.correlation,
            prompt: draft.prompt,
            success: draft.success,
            response: draft.response,
            error: draft.error,
            model: draft.model,
            usage: draft.usage,
            duration_ms: draft.duration_ms,
            retry_count: draft.retry_count,
            recorded_at: draft.recorded_at.unwrap_or_else(|| self.clock.now()),
        };

        if let Err(err) = self.repository.save_call_record(&record).await {
            warn!(record_id = %record.id, error = %err, "failed to persist call record");
        }

        let glyph = if record.success { "✓" } else { "✗" };
        info!(
            record_id = %record.id,
            kind = %record.kind,
            duration_ms = record.duration_ms,
            retry_count = record.retry_count,
            "{glyph} {} call recorded",
            record.kind
        );

        record
    }
}
