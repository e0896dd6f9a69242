//! Subcommands

use anyhow::{bail, Context};
use chrono::{DateTime, Local};
use clap::Subcommand;

use taskflow_core::profile::{validate_name, Profile};
use taskflow_core::task::{
    due_label, is_overdue, parse_due_input, DateRange, StatusFilter, Task, TaskDraft, TaskId,
};
use taskflow_core::{Error, TaskSession};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a task
    Add {
        /// Task title
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Due date, YYYY-MM-DD or RFC 3339
        #[arg(long)]
        due: String,
    },
    /// List tasks ordered by due date
    List {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "any")]
        range: DateRange,
    },
    /// Show one task
    Show { id: String },
    /// Edit a task; omitted fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark a task done, or open again
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
    /// Show or change the active profile
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Forget the profile and return to the default task list
    Logout,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Set {
        name: String,
        /// Photo URI shown as the avatar
        #[arg(long)]
        photo: Option<String>,
    },
}

pub async fn run(session: &mut TaskSession, command: Command) -> anyhow::Result<()> {
    let now = Local::now();

    match command {
        Command::Add {
            title,
            description,
            due,
        } => {
            let mut draft = TaskDraft::new(title, parse_due_input(&due, &now)?);
            draft.description = description;
            let task = session.add_task(draft.into_new_task(&now)?);
            println!("Added {}", render_line(&task, &now));
        }
        Command::List { status, range } => {
            print_header(session);
            let view = session.cached_view(status, range, &now);
            if view.is_empty() {
                println!("{}", empty_message(status));
            }
            for task in view {
                println!("{}", render_line(task, &now));
            }
        }
        Command::Show { id } => {
            let id = resolve_id(session.tasks(), &id)?;
            let task = session
                .get(&id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            print_details(task, &now);
        }
        Command::Edit {
            id,
            title,
            description,
            due,
        } => {
            let id = resolve_id(session.tasks(), &id)?;
            let current = session
                .get(&id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            let due = due.unwrap_or_else(|| current.due_at.clone());
            let mut draft = TaskDraft::new(
                title.unwrap_or_else(|| current.title.clone()),
                parse_due_input(&due, &now).context("Task has no usable due date, pass --due")?,
            );
            draft.description = description.or_else(|| current.description.clone());

            let changes = draft.into_changes(&now)?;
            match session.update_task(&id, &changes) {
                Some(task) => println!("Updated {}", render_line(&task, &now)),
                None => println!("Nothing to change"),
            }
        }
        Command::Toggle { id } => {
            let id = resolve_id(session.tasks(), &id)?;
            if let Some(task) = session.toggle_complete(&id) {
                println!("{}", render_line(&task, &now));
            }
        }
        Command::Delete { id } => {
            let id = resolve_id(session.tasks(), &id)?;
            if session.delete_task(&id) {
                println!("Deleted {}", short_id(&id));
            }
        }
        Command::Profile(ProfileCommand::Show) => match session.profile() {
            Some(profile) => {
                println!("{} ({})", profile.name, profile.avatar_letter());
                if let Some(photo) = &profile.photo {
                    println!("photo: {}", photo);
                }
                println!("tasks: {}", session.active_key());
            }
            None => println!("No profile; using {}", session.active_key()),
        },
        Command::Profile(ProfileCommand::Set { name, photo }) => {
            let mut profile = Profile::new(validate_name(&name)?);
            profile.photo = photo.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
            session.sign_in(profile).await;
            print_header(session);
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
    }

    Ok(())
}

/// Accept a full id or an unambiguous prefix of one.
///
/// Ids are opaque strings and compared exactly; only when no id starts
/// with the given prefix is the match retried ignoring case.
fn resolve_id(tasks: &[Task], raw: &str) -> anyhow::Result<TaskId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidInput("Task id cannot be empty".to_string()).into());
    }
    if let Some(task) = tasks.iter().find(|t| t.id.as_str() == raw) {
        return Ok(task.id.clone());
    }

    let mut matches = ids_matching(tasks, |id| id.starts_with(raw));
    if matches.is_empty() {
        let lowered = raw.to_lowercase();
        matches = ids_matching(tasks, |id| id.to_lowercase().starts_with(&lowered));
    }
    match matches.as_slice() {
        [id] => Ok(id.clone()),
        [] => Err(Error::TaskNotFound(raw.to_string()).into()),
        _ => bail!("Task id prefix '{}' is ambiguous", raw),
    }
}

fn ids_matching(tasks: &[Task], pred: impl Fn(&str) -> bool) -> Vec<TaskId> {
    tasks
        .iter()
        .filter(|t| pred(t.id.as_str()))
        .map(|t| t.id.clone())
        .collect()
}

fn short_id(id: &TaskId) -> String {
    id.as_str().chars().take(8).collect()
}

fn print_header(session: &TaskSession) {
    let name = session.profile().map(Profile::greeting_name).unwrap_or("there");
    println!(
        "Hi, {}! {} active task(s)",
        name,
        session.store().active_count()
    );
}

fn empty_message(status: StatusFilter) -> &'static str {
    match status {
        StatusFilter::All => "No tasks yet. Get started by adding your first task!",
        StatusFilter::Active => "No active tasks. All caught up!",
        StatusFilter::Done => "No completed tasks. Complete some tasks to see them here.",
    }
}

fn render_line(task: &Task, now: &DateTime<Local>) -> String {
    let mark = if task.completed { "x" } else { " " };
    let overdue = if is_overdue(task, now) { "  (overdue)" } else { "" };
    format!(
        "[{}] {}  {:<20} {}{}",
        mark,
        short_id(&task.id),
        due_label(task, &Local),
        task.title,
        overdue
    )
}

fn print_details(task: &Task, now: &DateTime<Local>) {
    println!("id:          {}", task.id);
    println!("title:       {}", task.title);
    println!(
        "description: {}",
        task.description.as_deref().unwrap_or("—")
    );
    let overdue = if is_overdue(task, now) { " (overdue)" } else { "" };
    println!("due:         {}{}", due_label(task, &Local), overdue);
    println!("completed:   {}", if task.completed { "yes" } else { "no" });
    println!("created:     {}", task.created_at.with_timezone(&Local).format("%F %R"));
    println!("updated:     {}", task.updated_at.with_timezone(&Local).format("%F %R"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tasks() -> Vec<Task> {
        let now = Utc::now();
        vec![
            Task::new("a", "2025-01-01", now),
            Task::new("b", "2025-01-02", now),
        ]
    }

    #[test]
    fn test_resolve_full_id_and_prefix() {
        let tasks = tasks();
        let id = tasks[0].id.clone();

        assert_eq!(resolve_id(&tasks, id.as_str()).unwrap(), id);
        assert_eq!(resolve_id(&tasks, &id.as_str()[..8]).unwrap(), id);
        assert_eq!(resolve_id(&tasks, &id.as_str().to_uppercase()[..8]).unwrap(), id);
    }

    #[test]
    fn test_resolve_non_uuid_ids() {
        let mut tasks = tasks();
        tasks[0].id = TaskId::from("V1StGXR8_Z5jdHi6B-myT");
        tasks[1].id = TaskId::from("v1stgxr8_other");

        assert_eq!(
            resolve_id(&tasks, "V1StGXR8_Z5jdHi6B-myT").unwrap(),
            tasks[0].id
        );
        assert_eq!(resolve_id(&tasks, "V1St").unwrap(), tasks[0].id);
        assert_eq!(resolve_id(&tasks, "v1st").unwrap(), tasks[1].id);
        assert!(resolve_id(&tasks, "V1STG").is_err());
        assert_eq!(short_id(&tasks[0].id), "V1StGXR8");
    }

    #[test]
    fn test_resolve_unknown_and_ambiguous() {
        let mut tasks = tasks();
        tasks[0].id = TaskId::from("aaaa1111-0000-4000-8000-000000000000");
        tasks[1].id = TaskId::from("aaaa2222-0000-4000-8000-000000000000");

        assert!(resolve_id(&tasks, "ffff").is_err());
        assert!(resolve_id(&tasks, "   ").is_err());
        assert!(resolve_id(&tasks, "aaaa").is_err());
        assert_eq!(resolve_id(&tasks, "aaaa2").unwrap(), tasks[1].id);
    }

    #[test]
    fn test_short_id() {
        let id = TaskId::generate();
        assert_eq!(short_id(&id).len(), 8);
        assert!(id.as_str().starts_with(&short_id(&id)));
        assert_eq!(short_id(&TaskId::from("abc")), "abc");
    }
}
