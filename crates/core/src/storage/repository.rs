//! Durable key-value storage trait
//!
//! Keys and values are both strings; task blobs and the profile
//! descriptor are JSON documents stored under their keys.

use async_trait::async_trait;

use crate::Result;

/// Storage interface for string blobs
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value at `key`, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` at `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key succeeds
    async fn remove(&self, key: &str) -> Result<()>;
}
