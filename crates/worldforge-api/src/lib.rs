//! Worldforge HTTP server: submits generation jobs and serves task polling.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
