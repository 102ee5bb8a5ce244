//! Progress handle given to each running job.

use std::sync::Arc;

use tracing::debug;
use worldforge_core::progress::ProgressReporter;

use crate::application::queue::Shared;
use crate::domain::task::{TaskId, percent_of};

/// Writes progress reports into the owning task's record.
#[derive(Clone)]
pub struct TaskProgress {
    shared: Arc<Shared>,
    task_id: TaskId,
}

impl TaskProgress {
    pub(crate) fn new(shared: Arc<Shared>, task_id: TaskId) -> Self {
        Self { shared, task_id }
    }

    /// The task this handle reports for.
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }
}

impl ProgressReporter for TaskProgress {
    fn report(&self, current: u32, total: u32, message: &str) {
        let percent = percent_of(current, total);
        debug!(task_id = %self.task_id, percent, message, "task progress");
        self.shared.with_task(self.task_id, |task| {
            task.record_progress(percent, message);
        });
    }
}
