//! Worldforge Core: shared domain abstractions.
//!
//! This crate defines the traits and types every Worldforge context depends
//! on: time, progress reporting, and the domain error type. It contains no
//! infrastructure code.

pub mod clock;
pub mod error;
pub mod progress;
