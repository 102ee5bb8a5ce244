//! Retrying Call Executor.
//!
//! Turns one unreliable remote call into a bounded-attempt operation: every
//! attempt gets its own timeout, failed attempts are followed by a linear
//! backoff wait, and exactly one call record is emitted at the terminal
//! outcome. Every error is retried the same way; the executor does not try
//! to tell permanent failures from transient ones.

use std::future::Future;

use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::application::recorder::CallRecorder;
use crate::application::settings::RetryPolicy;
use crate::domain::call::{CallCorrelation, CallFailure, CallKind, CallOutcome, CallSuccess, TokenUsage};
use crate::domain::error::GenerationError;
use crate::domain::record::CallRecordDraft;

const PROMPT_LOG_CHARS: usize = 120;

/// Identifies a logical call for logging and recording.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    /// Call kind.
    pub kind: CallKind,
    /// Prompt or other input, recorded verbatim.
    pub prompt: String,
    /// Entity correlation.
    pub correlation: CallCorrelation,
}

/// What one successful attempt produced.
#[derive(Debug, Clone)]
pub struct AttemptOutput<T> {
    /// Parsed value.
    pub value: T,
    /// Raw response, for the call record.
    pub response: String,
    /// Model that answered.
    pub model: Option<String>,
    /// Token usage, for text calls.
    pub usage: Option<TokenUsage>,
}

/// Runs attempts under a [`RetryPolicy`] and records the outcome.
#[derive(Clone)]
pub struct CallExecutor {
    recorder: CallRecorder,
}

impl CallExecutor {
    /// Creates an executor that reports to `recorder`.
    #[must_use]
    pub fn new(recorder: CallRecorder) -> Self {
        Self { recorder }
    }

    /// Executes `attempt` up to `policy.attempts()` times.
    ///
    /// `attempt` receives the 1-based attempt index. The returned outcome is
    /// never an `Err`: exhaustion is reported as `CallOutcome::Failure`.
    pub async fn execute<T, F, Fut>(
        &self,
        call: CallDescriptor,
        policy: &RetryPolicy,
        mut attempt: F,
    ) -> CallOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<AttemptOutput<T>, GenerationError>>,
    {
        let max_attempts = policy.attempts();
        let started = Instant::now();
        let mut last_error = GenerationError::EmptyPayload;

        for attempt_index in 1..=max_attempts {
            debug!(
                kind = %call.kind,
                attempt = attempt_index,
                max_attempts,
                prompt = %truncate(&call.prompt, PROMPT_LOG_CHARS),
                "calling generation backend"
            );
            let attempt_started = Instant::now();
            let result = match timeout(policy.timeout, attempt(attempt_index)).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(policy.timeout)),
            };

            match result {
                Ok(output) => {
                    let latency_ms = elapsed_ms(attempt_started);
                    info!(
                        kind = %call.kind,
                        attempt = attempt_index,
                        latency_ms,
                        total_tokens = output.usage.map(|u| u.total_tokens),
                        response = %truncate(&output.response, PROMPT_LOG_CHARS),
                        "generation call succeeded"
                    );
                    self.recorder
                        .record(CallRecordDraft {
                            id: None,
                            kind: call.kind,
                            correlation: call.correlation,
                            prompt: call.prompt,
                            success: true,
                            response: Some(output.response),
                            error: None,
                            model: output.model,
                            usage: output.usage,
                            duration_ms: elapsed_ms(started),
                            retry_count: attempt_index - 1,
                            recorded_at: None,
                        })
                        .await;
                    return CallOutcome::Success(CallSuccess {
                        value: output.value,
                        attempts: attempt_index,
                        usage: output.usage,
                    });
                }
                Err(err) => {
                    warn!(
                        kind = %call.kind,
                        attempt = attempt_index,
                        max_attempts,
                        latency_ms = elapsed_ms(attempt_started),
                        error = %err,
                        "generation attempt failed"
                    );
                    last_error = err;
                    if attempt_index < max_attempts {
                        sleep(policy.backoff_after(attempt_index)).await;
                    }
                }
            }
        }

        let message = last_error.to_string();
        error!(
            kind = %call.kind,
            attempts = max_attempts,
            error = %message,
            "generation call exhausted its attempts"
        );
        self.recorder
            .record(CallRecordDraft {
                id: None,
                kind: call.kind,
                correlation: call.correlation,
                prompt: call.prompt,
                success: false,
                response: None,
                error: Some(message.clone()),
                model: None,
                usage: None,
                duration_ms: elapsed_ms(started),
                retry_count: max_attempts - 1,
                recorded_at: None,
            })
            .await;

        CallOutcome::Failure(CallFailure {
            error: message,
            attempts: max_attempts,
        })
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
