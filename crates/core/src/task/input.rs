//! Caller-edge validation
//!
//! The task store accepts whatever it is given. Anything a person typed
//! goes through here first: titles must be non-blank, descriptions are
//! trimmed, and due dates may not fall before today.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

use super::model::{NewTask, TaskChanges};
use crate::{Error, Result};

/// Raw task form input
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due: DateTime<FixedOffset>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, due: DateTime<FixedOffset>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate for creation
    pub fn into_new_task<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Result<NewTask> {
        let title = validate_title(&self.title)?;
        let due_at = validate_due(&self.due, now)?;
        Ok(NewTask {
            title,
            description: trim_to_none(self.description),
            due_at,
        })
    }

    /// Validate for editing; the due date is re-checked against today
    pub fn into_changes<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Result<TaskChanges> {
        let title = validate_title(&self.title)?;
        let due_at = validate_due(&self.due, now)?;
        Ok(TaskChanges::default()
            .title(title)
            .description(trim_to_none(self.description))
            .due_at(due_at))
    }
}

pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Task title cannot be empty".to_string()));
    }
    Ok(title.to_string())
}

/// Check the due date against today in `now`'s time zone and render it
/// in the stored form (UTC, millisecond precision)
pub fn validate_due<Tz: TimeZone>(due: &DateTime<FixedOffset>, now: &DateTime<Tz>) -> Result<String> {
    let due_day = due.with_timezone(&now.timezone()).date_naive();
    if due_day < now.date_naive() {
        return Err(Error::InvalidInput(
            "Due date can't be before today".to_string(),
        ));
    }
    Ok(due
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parse a typed due date.
///
/// Accepts RFC 3339, or `YYYY-MM-DD` meaning midnight of that day in
/// `now`'s time zone.
pub fn parse_due_input<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        Error::InvalidInput(format!(
            "Unrecognized due date '{}', expected YYYY-MM-DD or RFC 3339",
            raw
        ))
    })?;
    now.timezone()
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|local| local.fixed_offset())
        .ok_or_else(|| Error::InvalidInput(format!("Due date '{}' does not exist locally", raw)))
}

fn trim_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
