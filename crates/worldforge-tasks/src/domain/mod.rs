//! Task records and their lifecycle.

pub mod task;
