//! Error types for the task core
//!
//! Only the storage adapters, caller-edge validation and id resolution
//! produce these. The task store and the persistence synchronizer never
//! surface an error to their callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
