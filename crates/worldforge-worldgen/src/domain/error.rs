//! Orchestration failures surfaced to the task queue.

use std::fmt;

use thiserror::Error;
use worldforge_core::error::DomainError;

/// A level of the generation tree whose text call can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The world description.
    World,
    /// The batched region list.
    RegionList,
    /// A region's spot list.
    SpotList,
    /// A vehicle description.
    Vehicle,
    /// An NPC's dialog lines.
    Dialog,
}

impl Stage {
    /// Human-readable stage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::RegionList => "region list",
            Self::SpotList => "spot list",
            Self::Vehicle => "vehicle",
            Self::Dialog => "dialog",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an orchestration operation stopped.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// A required text call exhausted its retries.
    #[error("{stage} stage failed: {message}")]
    StageFailed {
        /// The stage whose text call failed.
        stage: Stage,
        /// The last attempt's error.
        message: String,
    },

    /// Lookup, validation, or persistence failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl OrchestrationError {
    /// Shorthand for a `StageFailed` error.
    #[must_use]
    pub fn stage(stage: Stage, message: impl Into<String>) -> Self {
        Self::StageFailed {
            stage,
            message: message.into(),
        }
    }
}
