//! Task model definitions

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque task identifier.
///
/// New tasks get a UUID, but any string read back from storage is
/// accepted as-is, so ids written by other clients survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// A fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A task owned by the active profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO 8601 due timestamp, kept verbatim so a value that fails to
    /// parse still round-trips
    pub due_at: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new open task stamped at `now`
    pub fn new(title: impl Into<String>, due_at: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::generate(),
            title: title.into(),
            description: None,
            due_at: due_at.into(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse the due timestamp.
    ///
    /// Accepts RFC 3339 or a bare `YYYY-MM-DD` date, which is read as UTC
    /// midnight. Anything else yields `None`.
    pub fn due_date(&self) -> Option<DateTime<FixedOffset>> {
        parse_due(&self.due_at)
    }
}

pub(crate) fn parse_due(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
}

/// Payload for adding a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_at: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>, due_at: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_at: due_at.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a task's mutable fields.
///
/// `id` and `created_at` cannot be expressed here. `description` is
/// doubly optional so an update can clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_at: Option<String>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn due_at(mut self, due_at: impl Into<String>) -> Self {
        self.due_at = Some(due_at.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_at.is_none()
            && self.completed.is_none()
    }

    /// Merge into `task`, returning whether any field actually changed
    pub(crate) fn apply_to(&self, task: &mut Task) -> bool {
        let mut changed = false;
        if let Some(title) = &self.title {
            if task.title != *title {
                task.title.clone_from(title);
                changed = true;
            }
        }
        if let Some(description) = &self.description {
            if task.description != *description {
                task.description.clone_from(description);
                changed = true;
            }
        }
        if let Some(due_at) = &self.due_at {
            if task.due_at != *due_at {
                task.due_at.clone_from(due_at);
                changed = true;
            }
        }
        if let Some(completed) = self.completed {
            if task.completed != completed {
                task.completed = completed;
                changed = true;
            }
        }
        changed
    }
}
