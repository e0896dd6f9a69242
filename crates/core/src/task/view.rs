//! Derived task views
//!
//! Pure, deterministic projections over a task collection. Every view
//! starts from the due-date ordering, then narrows by status, then by
//! date range. "Now" is always passed in; calendar dates are taken in the
//! time zone of that `now`.
//!
//! A due date that fails to parse never breaks a view: such tasks sort
//! after every valid date (keeping their relative order), match no date
//! range except [`DateRange::Any`], and label as [`DUE_DATE_PLACEHOLDER`].
//! Treating an unparseable date as equal to every other date is not an
//! option here: that comparator is not a total order, and the sort
//! result would depend on where the bad record happened to sit.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Offset, TimeZone};
use tracing::trace;

use super::model::Task;
use super::store::TaskStore;
use crate::{Error, Result};

/// Shown in place of a due date that cannot be parsed
pub const DUE_DATE_PLACEHOLDER: &str = "—";

/// Completion filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Done,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [Self::All, Self::Active, Self::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Done => "done",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Done => task.completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "done" => Ok(Self::Done),
            _ => Err(Error::InvalidInput(format!(
                "Unsupported status filter '{}'",
                value
            ))),
        }
    }
}

/// Due-date filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateRange {
    #[default]
    Any,
    Today,
    /// Monday through Sunday of the current week
    Week,
    Month,
    /// Due strictly before today and not completed
    Overdue,
}

impl DateRange {
    pub const ALL: [DateRange; 5] = [
        Self::Any,
        Self::Today,
        Self::Week,
        Self::Month,
        Self::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Overdue => "overdue",
        }
    }

    fn contains<Tz: TimeZone>(self, task: &Task, calendar: &Calendar<Tz>) -> bool {
        if self == Self::Any {
            return true;
        }
        let Some(due) = calendar.local_date(task) else {
            return false;
        };
        match self {
            Self::Any => true,
            Self::Today => due == calendar.today,
            Self::Week => calendar.week_start <= due && due <= calendar.week_end,
            Self::Month => {
                due.year() == calendar.today.year() && due.month() == calendar.today.month()
            }
            Self::Overdue => !task.completed && due < calendar.today,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "overdue" => Ok(Self::Overdue),
            _ => Err(Error::InvalidInput(format!(
                "Unsupported date range '{}'",
                value
            ))),
        }
    }
}

/// Calendar facts about "now", computed once per view
struct Calendar<Tz: TimeZone> {
    tz: Tz,
    today: NaiveDate,
    week_start: NaiveDate,
    week_end: NaiveDate,
}

impl<Tz: TimeZone> Calendar<Tz> {
    fn at(now: &DateTime<Tz>) -> Self {
        let today = now.date_naive();
        let week_start =
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        Self {
            tz: now.timezone(),
            today,
            week_start,
            week_end: week_start + Duration::days(6),
        }
    }

    fn local_date(&self, task: &Task) -> Option<NaiveDate> {
        task.due_date()
            .map(|due| due.with_timezone(&self.tz).date_naive())
    }
}

fn compare_due(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Positions of `tasks` in ascending due order; stable for ties
fn sorted_positions(tasks: &[Task]) -> Vec<usize> {
    let mut keyed: Vec<(usize, Option<i64>)> = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| (index, task.due_date().map(|d| d.timestamp_millis())))
        .collect();
    keyed.sort_by(|a, b| compare_due(a.1, b.1));
    keyed.into_iter().map(|(index, _)| index).collect()
}

/// Ascending by due timestamp; ties keep their input order
pub fn sorted_by_due_date(tasks: &[Task]) -> Vec<&Task> {
    sorted_positions(tasks)
        .into_iter()
        .map(|index| &tasks[index])
        .collect()
}

pub fn by_status<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    status: StatusFilter,
) -> Vec<&'a Task> {
    tasks
        .into_iter()
        .filter(|task| status.matches(task))
        .collect()
}

pub fn by_date_range<'a, Tz: TimeZone>(
    tasks: impl IntoIterator<Item = &'a Task>,
    range: DateRange,
    now: &DateTime<Tz>,
) -> Vec<&'a Task> {
    let calendar = Calendar::at(now);
    tasks
        .into_iter()
        .filter(|task| range.contains(task, &calendar))
        .collect()
}

/// The combined list view: sorted, then status, then date range
pub fn filtered_view<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    status: StatusFilter,
    range: DateRange,
    now: &DateTime<Tz>,
) -> Vec<&'a Task> {
    by_date_range(by_status(sorted_by_due_date(tasks), status), range, now)
}

/// Whether a single task is overdue at `now`
pub fn is_overdue<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    DateRange::Overdue.contains(task, &Calendar::at(now))
}

/// Long-form due date ("January 3, 2025") in `tz`
pub fn due_label<Tz>(task: &Task, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match task.due_date() {
        Some(due) => due.with_timezone(tz).format("%B %-d, %Y").to_string(),
        None => DUE_DATE_PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ViewKey {
    revision: u64,
    status: StatusFilter,
    range: DateRange,
    today: NaiveDate,
    utc_offset: i32,
}

/// Memoized [`filtered_view`] for a single store.
///
/// The result is reused until the store revision, the filters, or the
/// calendar day of `now` change.
#[derive(Debug, Default)]
pub struct ViewCache {
    key: Option<ViewKey>,
    positions: Vec<usize>,
    computations: u64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view<'a, Tz: TimeZone>(
        &mut self,
        store: &'a TaskStore,
        status: StatusFilter,
        range: DateRange,
        now: &DateTime<Tz>,
    ) -> Vec<&'a Task> {
        let key = ViewKey {
            revision: store.revision(),
            status,
            range,
            today: now.date_naive(),
            utc_offset: now.offset().fix().local_minus_utc(),
        };

        if self.key != Some(key) {
            let tasks = store.tasks();
            let calendar = Calendar::at(now);
            self.positions = sorted_positions(tasks)
                .into_iter()
                .filter(|&index| status.matches(&tasks[index]))
                .filter(|&index| range.contains(&tasks[index], &calendar))
                .collect();
            self.key = Some(key);
            self.computations += 1;
            trace!(
                "Recomputed {}/{} view at revision {}",
                status,
                range,
                key.revision
            );
        }

        self.positions
            .iter()
            .filter_map(|&index| store.tasks().get(index))
            .collect()
    }

    /// Number of times the view was actually recomputed
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
