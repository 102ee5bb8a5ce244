//! Worldforge: World Generation context.
//!
//! Turns a theme into a persisted world → region → spot → NPC tree by
//! sequencing and fanning out remote generation calls, and owns the
//! generation-status state machine of every entity in that tree.

pub mod application;
pub mod domain;
