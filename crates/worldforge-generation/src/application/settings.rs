//! Retry policies and model settings for generation calls.

use std::time::Duration;

use crate::domain::call::{ImageDimensions, ModelConfig};

/// Attempt budget, linear backoff base, and per-attempt timeout for one
/// logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first; `0` is treated as `1`.
    pub max_attempts: u32,
    /// Wait before attempt `i + 1` is `base_backoff * i`.
    pub base_backoff: Duration,
    /// Budget for each individual attempt.
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Builds a policy from millisecond values.
    #[must_use]
    pub fn from_millis(max_attempts: u32, base_backoff_ms: u64, timeout_ms: u64) -> Self {
        Self {
            max_attempts,
            base_backoff: Duration::from_millis(base_backoff_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// The attempt budget, never less than one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after failed attempt `attempt_index` (1-based).
    #[must_use]
    pub fn backoff_after(&self, attempt_index: u32) -> Duration {
        self.base_backoff * attempt_index
    }
}

/// Everything the generation client needs besides the backends themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Policy for text calls.
    pub text_policy: RetryPolicy,
    /// Policy for image calls.
    pub image_policy: RetryPolicy,
    /// Model parameters for text calls.
    pub text_model: ModelConfig,
    /// System prompt sent with every text call.
    pub system_prompt: String,
    /// Dimensions for every generated image.
    pub image_dimensions: ImageDimensions,
    /// Style hint for every generated image.
    pub image_style: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            text_policy: RetryPolicy::from_millis(3, 1_000, 60_000),
            image_policy: RetryPolicy::from_millis(2, 2_000, 120_000),
            text_model: ModelConfig {
                model: "gpt-4o-mini".to_owned(),
                temperature: 0.9,
                max_tokens: 2_048,
            },
            system_prompt: "You are a worldbuilding assistant for a tabletop RPG. \
                            Reply with a single JSON object and nothing else."
                .to_owned(),
            image_dimensions: ImageDimensions {
                width: 1024,
                height: 1024,
            },
            image_style: Some("painterly fantasy illustration".to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear_in_attempt_index() {
        let policy = RetryPolicy::from_millis(5, 250, 1_000);

        assert_eq!(policy.backoff_after(1), Duration::from_millis(250));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(500));
        assert_eq!(policy.backoff_after(4), Duration::from_millis(1_000));
    }

    #[test]
    fn test_zero_attempts_is_treated_as_one() {
        assert_eq!(RetryPolicy::from_millis(0, 10, 10).attempts(), 1);
    }
}
