//! Task session
//!
//! Wires the task store to the persistence synchronizer and the profile
//! descriptor. Mutations apply to the store synchronously and, when they
//! changed something, schedule a save of the full collection into the
//! active namespace. Every mutation takes `&mut self` and the profile
//! switch is awaited under that same borrow, so nothing can mutate the
//! store until the new namespace has been loaded.

use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::StorageLayout;
use crate::profile::{Profile, ProfileStore};
use crate::storage::KeyValueStore;
use crate::sync::TaskSync;
use crate::task::{
    filtered_view, DateRange, NewTask, StatusFilter, Task, TaskChanges, TaskId, TaskStore,
    ViewCache,
};

pub struct TaskSession {
    store: TaskStore,
    sync: TaskSync,
    profiles: ProfileStore,
    profile: Option<Profile>,
    views: ViewCache,
}

impl TaskSession {
    /// Create an empty session on the default namespace without reading
    /// storage. Must be called from within a tokio runtime.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        layout: StorageLayout,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let profiles = ProfileStore::new(Arc::clone(&storage), layout.profile_key.clone());
        Self {
            store: TaskStore::new(clock),
            sync: TaskSync::new(storage, layout),
            profiles,
            profile: None,
            views: ViewCache::new(),
        }
    }

    /// Boot: restore the last-used profile and load its tasks
    pub async fn open(
        storage: Arc<dyn KeyValueStore>,
        layout: StorageLayout,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut session = Self::new(storage, layout, clock);
        let profile = session.profiles.load().await;
        session.activate(profile).await;
        session
    }

    /// [`open`](Self::open) with the wall clock
    pub async fn open_with_system_clock(
        storage: Arc<dyn KeyValueStore>,
        layout: StorageLayout,
    ) -> Self {
        Self::open(storage, layout, Arc::new(SystemClock)).await
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn active_key(&self) -> &str {
        self.sync.active_key()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.store.get(id)
    }

    /// Replace in-memory tasks with whatever `profile_name`'s namespace
    /// holds. Does not touch the stored profile descriptor.
    pub async fn switch_profile(&mut self, profile_name: Option<&str>) {
        let tasks = self.sync.switch(profile_name).await;
        self.store.hydrate(tasks);
    }

    /// Remember `profile` as the last-used profile and switch to it
    pub async fn sign_in(&mut self, profile: Profile) {
        self.profiles.save(&profile).await;
        info!("Signed in as {}", profile.slug());
        self.activate(Some(profile)).await;
    }

    /// Forget the stored profile and return to the default namespace
    pub async fn logout(&mut self) {
        self.profiles.clear().await;
        info!("Logged out");
        self.activate(None).await;
    }

    pub fn add_task(&mut self, new_task: NewTask) -> Task {
        let task = self.store.add(new_task);
        debug!("Added task {}", task.id);
        self.persist();
        task
    }

    pub fn update_task(&mut self, id: &TaskId, changes: &TaskChanges) -> Option<Task> {
        let updated = self.store.update(id, changes)?;
        debug!("Updated task {}", id);
        self.persist();
        Some(updated)
    }

    pub fn toggle_complete(&mut self, id: &TaskId) -> Option<Task> {
        let toggled = self.store.toggle_complete(id)?;
        debug!("Toggled task {} to completed={}", id, toggled.completed);
        self.persist();
        Some(toggled)
    }

    pub fn delete_task(&mut self, id: &TaskId) -> bool {
        let removed = self.store.delete(id);
        if removed {
            debug!("Deleted task {}", id);
            self.persist();
        }
        removed
    }

    /// Combined list view at `now`
    pub fn view<Tz: TimeZone>(
        &self,
        status: StatusFilter,
        range: DateRange,
        now: &DateTime<Tz>,
    ) -> Vec<&Task> {
        filtered_view(self.store.tasks(), status, range, now)
    }

    /// Memoized [`view`](Self::view)
    pub fn cached_view<Tz: TimeZone>(
        &mut self,
        status: StatusFilter,
        range: DateRange,
        now: &DateTime<Tz>,
    ) -> Vec<&Task> {
        self.views.view(&self.store, status, range, now)
    }

    /// Wait until every scheduled save has been written
    pub async fn flush(&self) {
        self.sync.flush().await;
    }

    async fn activate(&mut self, profile: Option<Profile>) {
        let name = profile.as_ref().map(|p| p.name.clone());
        self.profile = profile;
        self.switch_profile(name.as_deref()).await;
    }

    fn persist(&mut self) {
        self.sync.save_active(self.store.tasks());
    }
}
