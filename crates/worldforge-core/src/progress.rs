//! Progress reporting for long-running jobs.

/// Receives `(current, total, message)` progress updates from a running job.
///
/// The task queue hands one of these to every job it executes; jobs that run
/// outside the queue can pass [`NoopProgress`].
pub trait ProgressReporter: Send + Sync {
    /// Reports that `current` of `total` steps are done.
    fn report(&self, current: u32, total: u32, message: &str);
}

/// A reporter that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _current: u32, _total: u32, _message: &str) {}
}
