//! Worldforge: Task Queue context.
//!
//! Runs long jobs in the background, strictly one at a time in arrival
//! order, and lets callers poll each job's status, progress, and outcome by
//! ID.

pub mod application;
pub mod domain;
