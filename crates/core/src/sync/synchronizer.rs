//! Task persistence synchronizer
//!
//! Keeps the durable task blob of the active profile namespace in step
//! with the in-memory store. Saves are snapshots of the full collection,
//! serialized at call time and written in the background; loads treat a
//! missing, unreadable or corrupt blob as an empty collection.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::queue::SaveQueue;
use crate::config::StorageLayout;
use crate::storage::KeyValueStore;
use crate::task::Task;

pub struct TaskSync {
    storage: Arc<dyn KeyValueStore>,
    layout: StorageLayout,
    active_key: String,
    queue: SaveQueue,
}

impl TaskSync {
    /// Create a synchronizer pointed at the default namespace.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(storage: Arc<dyn KeyValueStore>, layout: StorageLayout) -> Self {
        let queue = SaveQueue::new(Arc::clone(&storage));
        Self {
            storage,
            active_key: layout.default_key(),
            layout,
            queue,
        }
    }

    pub fn key_for(&self, profile_name: Option<&str>) -> String {
        self.layout.key_for(profile_name)
    }

    pub fn active_key(&self) -> &str {
        &self.active_key
    }

    /// Read the collection stored at `key`
    pub async fn load(&self, key: &str) -> Vec<Task> {
        let raw = match self.storage.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No tasks stored at {}", key);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read tasks at {}: {}", key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!("Loaded {} tasks from {}", tasks.len(), key);
                tasks
            }
            Err(e) => {
                warn!("Ignoring corrupt task data at {}: {}", key, e);
                Vec::new()
            }
        }
    }

    /// Snapshot `tasks` and schedule the write at `key`
    pub fn save(&mut self, key: &str, tasks: &[Task]) {
        match serde_json::to_string(tasks) {
            Ok(blob) => self.queue.enqueue(key, blob),
            Err(e) => warn!("Failed to serialize tasks for {}: {}", key, e),
        }
    }

    /// Snapshot `tasks` into the active namespace
    pub fn save_active(&mut self, tasks: &[Task]) {
        let key = self.active_key.clone();
        self.save(&key, tasks);
    }

    /// Make `profile_name`'s namespace active and return what it holds.
    ///
    /// Pending writes to that namespace finish before it is read, so
    /// switching away and straight back never loads a stale blob. The
    /// previous namespace's lane is drained and stopped. The active key
    /// only changes once all of that is done; a switch dropped part way
    /// leaves the synchronizer on its old namespace.
    pub async fn switch(&mut self, profile_name: Option<&str>) -> Vec<Task> {
        let key = self.key_for(profile_name);
        info!("Switching task namespace {} -> {}", self.active_key, key);
        self.queue.flush(&key).await;
        let tasks = self.load(&key).await;
        if key != self.active_key {
            self.queue.retire(&self.active_key).await;
            self.active_key = key;
        }
        tasks
    }

    /// Wait for every scheduled write to finish
    pub async fn flush(&self) {
        self.queue.flush_all().await;
    }

    pub async fn flush_key(&self, key: &str) {
        self.queue.flush(key).await;
    }
}
