//! Task Queue.
//!
//! One FIFO of pending task IDs, one map of task records, and at most one
//! worker draining the FIFO. The worker runs each job to completion before
//! it picks up the next; it exits when the FIFO is empty and the next
//! `submit` starts a new one.

use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, warn};
use worldforge_core::clock::Clock;

use crate::application::progress::TaskProgress;
use crate::domain::task::{Task, TaskId, TaskStatus};

/// Default number of terminal tasks kept by [`TaskQueue::cleanup`].
pub const DEFAULT_RETENTION: usize = 100;

type TaskOutcome = Result<serde_json::Value, String>;
type BoxedWork = Box<dyn FnOnce(TaskProgress) -> BoxFuture<'static, TaskOutcome> + Send>;

struct TaskEntry {
    task: Task,
    work: Option<BoxedWork>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<TaskId>,
    tasks: HashMap<TaskId, TaskEntry>,
    worker_active: bool,
}

/// State shared between the queue handle, its worker, and progress handles.
pub(crate) struct Shared {
    state: Mutex<QueueState>,
    clock: Arc<dyn Clock>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with_task(&self, id: TaskId, f: impl FnOnce(&mut Task)) {
        if let Some(entry) = self.lock().tasks.get_mut(&id) {
            f(&mut entry.task);
        }
    }
}

/// A single-process FIFO job queue. Cloning yields another handle to the
/// same queue.
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
}

impl TaskQueue {
    /// Creates an empty queue using `clock` for task timestamps.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                clock,
            }),
        }
    }

    /// Enqueues `work` and returns the pending task.
    ///
    /// `work` receives a progress handle and resolves to a serializable
    /// result or a displayable error. Must be called from within a Tokio
    /// runtime; the worker is spawned on it if idle.
    pub fn submit<F, Fut, T, E>(&self, kind: impl Into<String>, work: F) -> Task
    where
        F: FnOnce(TaskProgress) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
    {
        let boxed: BoxedWork = Box::new(move |progress| {
            Box::pin(async move {
                let value = work(progress).await.map_err(|e| e.to_string())?;
                serde_json::to_value(value).map_err(|e| format!("failed to serialize task result: {e}"))
            })
        });

        let task = Task::new(TaskId::new(), kind, self.shared.clock.now());
        let snapshot = task.clone();
        let start_worker = {
            let mut state = self.shared.lock();
            state.pending.push_back(task.id);
            state.tasks.insert(
                task.id,
                TaskEntry {
                    task,
                    work: Some(boxed),
                },
            );
            let idle = !state.worker_active;
            state.worker_active = true;
            idle
        };

        info!(task_id = %snapshot.id, kind = %snapshot.kind, "task queued");
        if start_worker {
            tokio::spawn(drain(Arc::clone(&self.shared)));
        }
        snapshot
    }

    /// Returns a snapshot of the task, if it is still retained.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.shared.lock().tasks.get(&id).map(|entry| entry.task.clone())
    }

    /// Returns the tasks currently executing.
    #[must_use]
    pub fn list_running(&self) -> Vec<Task> {
        self.shared
            .lock()
            .tasks
            .values()
            .filter(|entry| entry.task.status == TaskStatus::Running)
            .map(|entry| entry.task.clone())
            .collect()
    }

    /// Returns every retained task, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .shared
            .lock()
            .tasks
            .values()
            .map(|entry| entry.task.clone())
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Number of tasks waiting in the FIFO.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Drops the oldest terminal tasks so at most `max_retained` remain.
    ///
    /// Pending and running tasks are never removed. Returns how many tasks
    /// were dropped.
    pub fn cleanup(&self, max_retained: usize) -> usize {
        let mut state = self.shared.lock();
        let mut terminal: Vec<(TaskId, chrono::DateTime<chrono::Utc>)> = state
            .tasks
            .values()
            .filter(|entry| entry.task.status.is_terminal())
            .map(|entry| (entry.task.id, entry.task.created_at))
            .collect();
        if terminal.len() <= max_retained {
            return 0;
        }
        terminal.sort_by(|a, b| b.1.cmp(&a.1));
        let removed = terminal.split_off(max_retained);
        for (id, _) in &removed {
            state.tasks.remove(id);
        }
        info!(removed = removed.len(), retained = max_retained, "pruned finished tasks");
        removed.len()
    }
}

/// Worker loop: runs pending tasks one at a time until the FIFO is empty.
async fn drain(shared: Arc<Shared>) {
    loop {
        let next = {
            let mut state = shared.lock();
            let now = shared.clock.now();
            loop {
                let Some(id) = state.pending.pop_front() else {
                    state.worker_active = false;
                    break None;
                };
                let Some(entry) = state.tasks.get_mut(&id) else {
                    continue;
                };
                let Some(work) = entry.work.take() else {
                    continue;
                };
                entry.task.start(now);
                break Some((id, entry.task.kind.clone(), work));
            }
        };
        let Some((id, kind, work)) = next else {
            return;
        };

        info!(task_id = %id, kind = %kind, "task started");
        let started = Instant::now();
        let progress = TaskProgress::new(Arc::clone(&shared), id);
        let outcome = match tokio::spawn(work(progress)).await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                error!(task_id = %id, error = %join_error, "task panicked");
                Err("task panicked".to_owned())
            }
        };
        let elapsed_ms = started.elapsed().as_millis();

        let now = shared.clock.now();
        shared.with_task(id, |task| match outcome {
            Ok(value) => {
                task.complete(value, now);
                info!(task_id = %id, kind = %kind, elapsed_ms, "task completed");
            }
            Err(message) => {
                warn!(task_id = %id, kind = %kind, elapsed_ms, error = %message, "task failed");
                task.fail(message, now);
            }
        });
    }
}
