//! Durable storage
//!
//! The key-value port the persistence layer writes through, with a
//! file-backed and an in-memory implementation.

mod file_store;
mod memory_store;
mod repository;

pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
pub use repository::KeyValueStore;
