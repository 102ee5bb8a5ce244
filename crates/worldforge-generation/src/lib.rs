//! Worldforge: Remote Generation context.
//!
//! Wraps unreliable text and image generation backends in bounded-attempt
//! calls with linear backoff, per-attempt timeouts, and exactly one audit
//! record per logical call.

pub mod application;
pub mod domain;
