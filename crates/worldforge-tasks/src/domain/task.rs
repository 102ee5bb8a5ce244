//! The task record polled by callers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in the FIFO.
    Pending,
    /// Being executed by the worker.
    Running,
    /// Finished with a result.
    Completed,
    /// Finished with an error.
    Failed,
}

impl TaskStatus {
    /// Whether the task has finished.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A unit of background work as seen by pollers.
///
/// Mutated only through the transition methods below, which keep status
/// monotonic and `result`/`error` exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,
    /// Work-kind tag, e.g. `"generate_world"`.
    pub kind: String,
    /// Current status.
    pub status: TaskStatus,
    /// Progress percentage, 0-100.
    pub progress: u8,
    /// Latest progress message.
    pub progress_message: Option<String>,
    /// Result payload; present iff completed.
    pub result: Option<serde_json::Value>,
    /// Error message; present iff failed.
    pub error: Option<String>,
    /// When the task was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the worker picked it up.
    pub started_at: Option<DateTime<Utc>>,
    /// When it reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a pending task.
    #[must_use]
    pub fn new(id: TaskId, kind: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: kind.into(),
            status: TaskStatus::Pending,
            progress: 0,
            progress_message: None,
            result: None,
            error: None,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// `pending → running`. Returns `false` if the task was not pending.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Running;
        self.started_at = Some(now);
        true
    }

    /// Records progress while running.
    ///
    /// The percentage never moves backwards; the message always reflects the
    /// latest report. Ignored outside `running`.
    pub fn record_progress(&mut self, percent: u8, message: &str) {
        if self.status != TaskStatus::Running {
            return;
        }
        self.progress = self.progress.max(percent.min(100));
        self.progress_message = Some(message.to_owned());
    }

    /// `running → completed`. Returns `false` if the task was not running.
    pub fn complete(&mut self, result: serde_json::Value, now: DateTime<Utc>) -> bool {
        if self.status != TaskStatus::Running {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.completed_at = Some(now);
        true
    }

    /// `running → failed`. Returns `false` if the task was not running.
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> bool {
        if self.status != TaskStatus::Running {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(now);
        true
    }
}

/// Converts a `(current, total)` report into a clamped percentage.
#[must_use]
pub fn percent_of(current: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (u64::from(current) * 100 / u64::from(total)).min(100);
    u8::try_from(percent).unwrap_or(100)
}
