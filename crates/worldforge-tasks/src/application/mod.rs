//! The queue worker and its progress handle.

pub mod progress;
pub mod queue;
