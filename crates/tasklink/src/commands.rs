use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};
use tasklink_client::{Connector, SyncOutcome, TaskClient};
use tasklink_core::{Subtask, Task, TaskFilter, TaskFilterBuilder, TaskId};
use time::Date;
use time::macros::format_description;

use crate::Command;

pub fn run<C: Connector>(command: Command, client: &TaskClient<C>) -> Result<()> {
    match command {
        Command::Ls => {
            let tasks: Vec<Task> = client
                .get_all()
                .iter()
                .filter(|task| !task.archived)
                .cloned()
                .collect();
            print_tasks(&tasks, "No tasks found");
        }
        Command::Show { id } => {
            let task = cached_task(client, id)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Add {
            description,
            date,
            tags,
            subtasks,
        } => {
            let draft = build_draft(description, date.as_deref(), tags, subtasks)?;
            let created = client.add(&draft)?;
            println!("created task: #{}", created.id);
        }
        Command::Rm { id } => {
            let mut task = cached_task(client, id)?;
            if client.remove(&mut task)? {
                println!("archived task: #{id}");
            } else {
                println!("server refused to archive task: #{id}");
            }
        }
        Command::Done { id } => {
            let mut task = cached_task(client, id)?;
            task.done = true;
            client.update(&task)?;
            match client.synchronize()? {
                SyncOutcome::Changed => println!("completed task: #{id}"),
                SyncOutcome::Unchanged => println!("update sent but not yet visible: #{id}"),
            }
        }
        Command::Sync => match client.synchronize()? {
            SyncOutcome::Changed => println!("snapshot changed ({} tasks)", client.get_all().len()),
            SyncOutcome::Unchanged => println!("snapshot unchanged"),
        },
        Command::Filter {
            open,
            done,
            all,
            due_soon,
            tags,
            text,
            special,
        } => {
            let filter = build_filter(open, done, all, due_soon, tags.as_deref(), text.as_deref())
                .special(special)
                .build();
            let tasks = client.filter(&filter)?;
            print_tasks(&tasks, empty_message(&filter));
        }
    }

    Ok(())
}

fn cached_task<C: Connector>(client: &TaskClient<C>, id: TaskId) -> Result<Task> {
    client
        .get_task(id)
        .ok_or_else(|| anyhow!("Unknown task id: #{id}"))
}

fn build_draft(
    description: String,
    date: Option<&str>,
    tags: Vec<String>,
    subtasks: Vec<String>,
) -> Result<Task> {
    let mut draft = Task::draft(description);
    if let Some(raw) = date {
        draft = draft.with_date(parse_date(raw)?);
    }
    for tag in tags {
        draft.add_tag(tag);
    }
    draft.subtasks = subtasks.into_iter().map(Subtask::new).collect();
    Ok(draft)
}

fn build_filter(
    open: bool,
    done: bool,
    all: bool,
    due_soon: bool,
    tags: Option<&str>,
    text: Option<&str>,
) -> TaskFilterBuilder {
    let mut builder = TaskFilterBuilder::new()
        .with_completion_switches(open, done, all)
        .due_soon(due_soon);
    if let Some(tags) = tags {
        builder = builder.with_tags(tags);
    }
    if let Some(text) = text {
        builder = builder.with_text(text);
    }
    builder
}

fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {raw}"))
}

fn empty_message(filter: &TaskFilter) -> &'static str {
    if filter.is_empty() {
        "No tasks found"
    } else {
        "No tasks matched the provided filters"
    }
}

fn print_tasks(tasks: &[Task], empty: &str) {
    if tasks.is_empty() {
        println!("{empty}");
        return;
    }
    for task in tasks {
        println!("{}", render_task_line(task));
    }
}

fn render_task_line(task: &Task) -> String {
    let mark = if task.done { 'x' } else { ' ' };
    let date = task.date.map_or_else(|| "----------".to_owned(), |date| date.to_string());
    let mut line = format!("#{} [{mark}] {date} {}", task.id, task.description);
    if !task.tags.is_empty() {
        let _ = write!(line, " [{}]", task.tags.join(", "));
    }
    if !task.subtasks.is_empty() {
        let finished = task.subtasks.iter().filter(|subtask| subtask.done).count();
        let _ = write!(line, " ({finished}/{})", task.subtasks.len());
    }
    line
}
