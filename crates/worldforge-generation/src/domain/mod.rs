//! Domain types and ports for remote generation calls.

pub mod call;
pub mod error;
pub mod payload;
pub mod ports;
pub mod record;
