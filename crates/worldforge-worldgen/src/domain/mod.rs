//! Entities, status machines, commands, and ports of the World Generation
//! context.

pub mod commands;
pub mod entities;
pub mod error;
pub mod ports;
pub mod status;
