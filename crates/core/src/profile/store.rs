//! Last-used profile persistence
//!
//! The descriptor lives under its own key beside the task blobs. Like task
//! writes, failures here are logged and never surface: a missing or
//! unreadable descriptor just means "no profile".

use std::sync::Arc;

use tracing::{debug, warn};

use super::model::Profile;
use crate::storage::KeyValueStore;

#[derive(Clone)]
pub struct ProfileStore {
    storage: Arc<dyn KeyValueStore>,
    key: String,
}

impl ProfileStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn load(&self) -> Option<Profile> {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read profile descriptor: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Profile>(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Ignoring corrupt profile descriptor: {}", e);
                None
            }
        }
    }

    pub async fn save(&self, profile: &Profile) {
        let raw = match serde_json::to_string(profile) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize profile descriptor: {}", e);
                return;
            }
        };

        match self.storage.set(&self.key, &raw).await {
            Ok(()) => debug!("Saved profile descriptor for {}", profile.slug()),
            Err(e) => warn!("Failed to save profile descriptor: {}", e),
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.storage.remove(&self.key).await {
            warn!("Failed to clear profile descriptor: {}", e);
        }
    }
}
