//! In-memory persistence for generated entities and call records.

pub mod memory;

pub use memory::InMemoryStore;
