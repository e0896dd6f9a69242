//! Per-key serial write queue
//!
//! Each key gets its own writer lane: a background task draining an
//! unbounded channel. Writes to one key therefore land in the order they
//! were enqueued, while callers never wait on I/O. Failed writes are
//! logged and dropped.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

enum LaneCommand {
    Write(String),
    Flush(oneshot::Sender<()>),
}

pub struct SaveQueue {
    storage: Arc<dyn KeyValueStore>,
    runtime: Handle,
    lanes: HashMap<String, mpsc::UnboundedSender<LaneCommand>>,
}

impl SaveQueue {
    /// Create a queue whose lanes run on the current tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_runtime(storage, Handle::current())
    }

    pub fn with_runtime(storage: Arc<dyn KeyValueStore>, runtime: Handle) -> Self {
        Self {
            storage,
            runtime,
            lanes: HashMap::new(),
        }
    }

    /// Schedule `value` to be written at `key` after every earlier write
    /// to that key
    pub fn enqueue(&mut self, key: &str, value: String) {
        let command = LaneCommand::Write(value);
        let command = match self.lane(key).send(command) {
            Ok(()) => return,
            Err(mpsc::error::SendError(command)) => command,
        };

        // The lane's worker is gone (runtime shut down); start a fresh one
        warn!("Save lane for {} closed, restarting", key);
        self.lanes.remove(key);
        if self.lane(key).send(command).is_err() {
            warn!("Dropping write for {}: save lane unavailable", key);
        }
    }

    /// Wait until every write enqueued so far for `key` has finished
    pub async fn flush(&self, key: &str) {
        let Some(lane) = self.lanes.get(key) else {
            return;
        };
        let (done_tx, done_rx) = oneshot::channel();
        if lane.send(LaneCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Drain `key`'s lane and stop its worker. A later write to the key
    /// starts a fresh lane, which can only run after this one finished.
    pub async fn retire(&mut self, key: &str) {
        self.flush(key).await;
        if self.lanes.remove(key).is_some() {
            debug!("Retired save lane for {}", key);
        }
    }

    /// Wait for every lane to drain
    pub async fn flush_all(&self) {
        join_all(self.lanes.keys().map(|key| self.flush(key))).await;
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    fn lane(&mut self, key: &str) -> &mpsc::UnboundedSender<LaneCommand> {
        if !self.lanes.contains_key(key) {
            let (tx, rx) = mpsc::unbounded_channel();
            self.runtime
                .spawn(run_lane(key.to_string(), Arc::clone(&self.storage), rx));
            debug!("Started save lane for {}", key);
            self.lanes.insert(key.to_string(), tx);
        }
        &self.lanes[key]
    }
}

async fn run_lane(
    key: String,
    storage: Arc<dyn KeyValueStore>,
    mut rx: mpsc::UnboundedReceiver<LaneCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            LaneCommand::Write(value) => match storage.set(&key, &value).await {
                Ok(()) => debug!("Persisted {} bytes to {}", value.len(), key),
                Err(e) => warn!("Failed to persist {}: {}", key, e),
            },
            LaneCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Save lane for {} stopped", key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every write; the first write to each key is slow so a
    /// racing later write would overtake it if ordering were not enforced
    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<(String, String)>>,
        inner: MemoryKeyValueStore,
    }

    #[async_trait]
    impl KeyValueStore for RecordingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if value == "slow" {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            self.writes
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Storage("unavailable".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("unavailable".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Err(Error::Storage("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_writes_to_one_key_land_in_order() {
        let storage = Arc::new(RecordingStore::default());
        let mut queue = SaveQueue::new(storage.clone());

        queue.enqueue("k", "slow".to_string());
        queue.enqueue("k", "fast".to_string());
        queue.flush("k").await;

        let writes = storage.writes.lock().unwrap().clone();
        assert_eq!(
            writes,
            vec![
                ("k".to_string(), "slow".to_string()),
                ("k".to_string(), "fast".to_string()),
            ]
        );
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("fast"));
    }

    #[tokio::test]
    async fn test_one_lane_per_key() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let mut queue = SaveQueue::new(storage.clone());

        queue.enqueue("a", "1".to_string());
        queue.enqueue("b", "2".to_string());
        queue.enqueue("a", "3".to_string());
        queue.flush_all().await;

        assert_eq!(queue.lane_count(), 2);
        assert_eq!(storage.get("a").await.unwrap().as_deref(), Some("3"));
        assert_eq!(storage.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_flush_unknown_key_returns_immediately() {
        let queue = SaveQueue::new(Arc::new(MemoryKeyValueStore::new()));
        queue.flush("never-written").await;
        queue.flush_all().await;
    }

    #[tokio::test]
    async fn test_retire_drains_and_drops_lane() {
        let storage = Arc::new(RecordingStore::default());
        let mut queue = SaveQueue::new(storage.clone());

        queue.enqueue("k", "slow".to_string());
        queue.retire("k").await;
        assert_eq!(queue.lane_count(), 0);
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("slow"));

        queue.enqueue("k", "again".to_string());
        assert_eq!(queue.lane_count(), 1);
        queue.flush("k").await;
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("again"));

        queue.retire("never-written").await;
        assert_eq!(queue.lane_count(), 1);
    }

    #[tokio::test]
    async fn test_write_failures_are_swallowed() {
        let mut queue = SaveQueue::new(Arc::new(FailingStore));

        queue.enqueue("k", "v".to_string());
        queue.enqueue("k", "w".to_string());
        queue.flush("k").await;

        assert_eq!(queue.lane_count(), 1);
    }
}
