//! Application services that execute and record remote generation calls.

pub mod client;
pub mod executor;
pub mod recorder;
pub mod settings;
