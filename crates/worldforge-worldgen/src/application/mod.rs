//! The generation orchestrator and its task-queue jobs.

pub mod detached;
pub mod jobs;
pub mod orchestrator;
pub mod prompts;
