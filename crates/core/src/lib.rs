//! Core library for TaskFlow
//!
//! This crate contains the task state and persistence core:
//! - Task records, the in-memory task store and its derived views
//! - Profile namespaces and the last-used profile descriptor
//! - Durable key-value storage and the background save queue
//! - The session tying them together

pub mod clock;
pub mod config;
pub mod error;
pub mod profile;
pub mod session;
pub mod storage;
pub mod sync;
pub mod task;

pub use error::Error;
pub use session::TaskSession;
pub type Result<T> = std::result::Result<T, Error>;
