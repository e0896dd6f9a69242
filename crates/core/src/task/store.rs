//! In-memory task store
//!
//! A synchronous reducer over the task collection. It never validates
//! input and never reports a missing id as an error: callers may act on
//! stale references after a delete, and those calls simply do nothing.
//! Persistence is not its concern; every mutation tells the caller
//! whether the collection changed so it can schedule a save.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::model::{NewTask, Task, TaskChanges, TaskId};
use crate::clock::{Clock, SystemClock};

pub struct TaskStore {
    tasks: Vec<Task>,
    clock: Arc<dyn Clock>,
    revision: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks)
            .field("revision", &self.revision)
            .finish()
    }
}

impl TaskStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Vec::new(),
            clock,
            revision: 0,
        }
    }

    /// Replace the whole collection verbatim
    pub fn hydrate(&mut self, tasks: Vec<Task>) {
        debug!("Hydrating task store with {} tasks", tasks.len());
        self.tasks = tasks;
        self.bump();
    }

    /// Append a new open task and return it
    pub fn add(&mut self, new_task: NewTask) -> Task {
        let now = self.clock.now();
        let mut task = Task::new(new_task.title, new_task.due_at, now);
        task.description = new_task.description;

        self.tasks.push(task.clone());
        self.bump();
        task
    }

    /// Merge `changes` into the task with `id`.
    ///
    /// Returns the updated record, or `None` when the id is unknown or
    /// the changes match the current values.
    pub fn update(&mut self, id: &TaskId, changes: &TaskChanges) -> Option<Task> {
        let now = self.clock.now();
        let task = self.tasks.iter_mut().find(|t| t.id == *id)?;
        if !changes.apply_to(task) {
            return None;
        }
        task.updated_at = next_updated_at(task.updated_at, now);
        let updated = task.clone();
        self.bump();
        Some(updated)
    }

    /// Flip the completion flag of the task with `id`
    pub fn toggle_complete(&mut self, id: &TaskId) -> Option<Task> {
        let now = self.clock.now();
        let task = self.tasks.iter_mut().find(|t| t.id == *id)?;
        task.completed = !task.completed;
        task.updated_at = next_updated_at(task.updated_at, now);
        let toggled = task.clone();
        self.bump();
        Some(toggled)
    }

    /// Remove the task with `id`, keeping the order of the rest
    pub fn delete(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != *id);
        let removed = self.tasks.len() != before;
        if removed {
            self.bump();
        }
        removed
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks not yet completed
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    /// Changes on every mutation, hydrate included
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// `updated_at` never stands still or moves backwards, even when the
/// clock is coarse or has been set back.
fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + Duration::milliseconds(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    fn create_test_store() -> (TaskStore, ManualClock) {
        let clock = ManualClock::new(start());
        let store = TaskStore::new(Arc::new(clock.clone()));
        (store, clock)
    }

    #[test]
    fn test_add_task() {
        let (mut store, _clock) = create_test_store();

        let task = store.add(NewTask::new("Buy milk", "2025-01-02T00:00:00.000Z"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.tasks()[0], task);
        assert!(!task.completed);
        assert_eq!(task.created_at, start());
        assert_eq!(task.updated_at, start());
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let (mut store, _clock) = create_test_store();
        let a = store.add(NewTask::new("A", "2025-01-05"));
        let b = store.add(NewTask::new("B", "2025-01-01"));
        let c = store.add(NewTask::new("C", "2025-01-03"));

        let ids: Vec<TaskId> = store.tasks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![a.id.clone(), b.id.clone(), c.id.clone()]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_store_does_not_validate() {
        let (mut store, _clock) = create_test_store();
        let task = store.add(NewTask::new("   ", "not a date"));
        assert_eq!(task.title, "   ");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_preserves_identity_fields() {
        let (mut store, clock) = create_test_store();
        let task = store.add(NewTask::new("Original", "2025-01-02"));

        clock.advance(Duration::seconds(30));
        let updated = store
            .update(&task.id, &TaskChanges::default().title("x"))
            .unwrap();

        assert_eq!(updated.id, task.id);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.title, "x");
        assert!(updated.updated_at > task.updated_at);
        assert_eq!(store.get(&task.id), Some(&updated));
    }

    #[test]
    fn test_updated_at_strictly_increases_with_frozen_clock() {
        let (mut store, _clock) = create_test_store();
        let task = store.add(NewTask::new("T", "2025-01-02"));

        let first = store.toggle_complete(&task.id).unwrap();
        let second = store.toggle_complete(&task.id).unwrap();

        assert!(first.updated_at > task.updated_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[test]
    fn test_updated_at_never_moves_backwards() {
        let (mut store, clock) = create_test_store();
        let task = store.add(NewTask::new("T", "2025-01-02"));

        clock.set(start() - Duration::days(1));
        let updated = store
            .update(&task.id, &TaskChanges::default().title("later"))
            .unwrap();

        assert!(updated.updated_at > task.updated_at);
        assert!(updated.created_at <= updated.updated_at);
    }

    #[test]
    fn test_update_without_real_change_is_noop() {
        let (mut store, clock) = create_test_store();
        let task = store.add(NewTask::new("Same", "2025-01-02"));
        let revision = store.revision();

        clock.advance(Duration::minutes(1));
        assert!(store
            .update(&task.id, &TaskChanges::default().title("Same"))
            .is_none());
        assert!(store.update(&task.id, &TaskChanges::default()).is_none());

        assert_eq!(store.get(&task.id), Some(&task));
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_toggle_complete() {
        let (mut store, _clock) = create_test_store();
        let task = store.add(NewTask::new("Buy milk", "2025-01-02"));

        let toggled = store.toggle_complete(&task.id).unwrap();
        assert!(toggled.completed);
        assert!(toggled.updated_at > task.updated_at);

        let toggled_back = store.toggle_complete(&task.id).unwrap();
        assert!(!toggled_back.completed);
    }

    #[test]
    fn test_delete_keeps_remaining_order() {
        let (mut store, _clock) = create_test_store();
        let a = store.add(NewTask::new("A", "2025-01-01"));
        let b = store.add(NewTask::new("B", "2025-01-02"));
        let c = store.add(NewTask::new("C", "2025-01-03"));

        assert!(store.delete(&b.id));
        let ids: Vec<TaskId> = store.tasks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![a.id.clone(), c.id.clone()]);

        assert!(!store.delete(&b.id));
    }

    #[test]
    fn test_missing_id_is_silent_noop() {
        let (mut store, _clock) = create_test_store();
        store.add(NewTask::new("A", "2025-01-01"));
        store.add(NewTask::new("B", "2025-01-02"));
        let snapshot = store.tasks().to_vec();
        let revision = store.revision();
        let unknown = TaskId::from("missing");

        assert!(store
            .update(&unknown, &TaskChanges::default().title("x"))
            .is_none());
        assert!(store.toggle_complete(&unknown).is_none());
        assert!(!store.delete(&unknown));

        assert_eq!(store.tasks(), snapshot.as_slice());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_hydrate_replaces_collection() {
        let (mut store, _clock) = create_test_store();
        store.add(NewTask::new("Old", "2025-01-01"));

        let incoming = vec![
            Task::new("One", "2025-02-01", start()),
            Task::new("Two", "2025-02-02", start()),
        ];
        let revision = store.revision();
        store.hydrate(incoming.clone());

        assert_eq!(store.tasks(), incoming.as_slice());
        assert_ne!(store.revision(), revision);
    }

    #[test]
    fn test_active_count() {
        let (mut store, _clock) = create_test_store();
        let a = store.add(NewTask::new("A", "2025-01-01"));
        store.add(NewTask::new("B", "2025-01-02"));
        store.toggle_complete(&a.id);

        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn test_create_toggle_delete_scenario() {
        let (mut store, clock) = create_test_store();
        let tomorrow = (start() + Duration::days(1)).to_rfc3339();

        let task = store.add(NewTask::new("Buy milk", tomorrow));
        assert_eq!(store.len(), 1);
        assert!(!store.tasks()[0].completed);

        clock.advance(Duration::seconds(1));
        let toggled = store.toggle_complete(&task.id).unwrap();
        assert!(toggled.completed);
        assert!(toggled.updated_at > task.updated_at);

        assert!(store.delete(&task.id));
        assert!(store.is_empty());
    }
}
