//! Single-task commands: add, show, edit, status, done/undone, move, rm, attach.

use std::path::{Path, PathBuf};

use crate::board::validate_due_date;
use crate::error::{Error, Result};
use crate::output::{emit_success, short_id, Screen};
use crate::reorder::DropSurface;
use crate::service::MoveOutcome;
use crate::task::{Category, Status, Task, TaskDraft, TaskEdit};

use super::{resolve_task_id, Context};

/// Options for `taskboard add`
pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub status: Status,
    pub category: Category,
    pub due: Option<String>,
    pub file: Option<PathBuf>,
    pub name: Option<String>,
}

/// Options for `taskboard edit`
pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub due: Option<String>,
}

#[derive(serde::Serialize)]
struct TaskReport<'a> {
    task: &'a Task,
}

#[derive(serde::Serialize)]
struct MoveReport<'a> {
    task: &'a Task,
    moved: bool,
    renumbered: Vec<RenumberedTask>,
    failed: Vec<FailedTask>,
}

#[derive(serde::Serialize)]
struct RenumberedTask {
    id: String,
    order: i64,
}

#[derive(serde::Serialize)]
pub(super) struct FailedTask {
    pub id: String,
    pub error: String,
}

#[derive(serde::Serialize)]
struct DeleteReport {
    deleted: String,
}

pub async fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let due = validate_due_date(options.due.as_deref().unwrap_or_default())?;
    let upload = match options.file {
        Some(file) => Some(read_upload(&file, options.name).await?),
        None => None,
    };
    let mut service = ctx.service().await?;

    // The service stamps the signed-in owner.
    let draft = TaskDraft::new(String::new(), options.title)
        .with_description(options.description)
        .with_status(options.status)
        .with_category(options.category)
        .with_due_date(due);
    let task = match upload {
        Some((file_name, bytes)) => {
            service
                .create_with_attachment(draft, &file_name, bytes)
                .await?
        }
        None => service.create(draft).await?,
    };

    let mut screen = Screen::new(format!("taskboard add: {}", task.title));
    screen.task_fields(&task);
    screen.hint(format!("taskboard show {}", short_id(&task.id)));

    emit_success(ctx.output, "add", &TaskReport { task: &task }, Some(&screen))
}

pub async fn run_show(ctx: &Context, raw_id: &str) -> Result<()> {
    let service = ctx.service().await?;
    let snapshot = service.snapshot();
    let id = resolve_task_id(&snapshot, raw_id)?;
    let task = snapshot
        .get(&id)
        .ok_or_else(|| Error::NotFound(id.clone()))?;

    let mut screen = Screen::new(format!("taskboard show: {}", task.title));
    screen.task_fields(task);
    if !task.description.is_empty() {
        screen.field("description", task.description.clone());
    }
    for entry in &task.activity {
        screen.line(format!(
            "{} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.details
        ));
    }

    emit_success(ctx.output, "show", &TaskReport { task }, Some(&screen))
}

pub async fn run_edit(ctx: &Context, options: EditOptions) -> Result<()> {
    let mut service = ctx.service().await?;
    let id = resolve_task_id(&service.snapshot(), &options.id)?;
    let due_date = options
        .due
        .as_deref()
        .map(validate_due_date)
        .transpose()?;
    let edit = TaskEdit {
        title: options.title,
        description: options.description,
        category: options.category,
        status: options.status,
        due_date,
        file_url: None,
    };
    if edit.is_empty() {
        return Err(Error::Validation(
            "nothing to change; pass --title, --description, --category, --status or --due"
                .to_string(),
        ));
    }

    let task = service.edit(&id, &edit).await?;
    let mut screen = Screen::new(format!("taskboard edit: {}", task.title));
    screen.task_fields(&task);
    if let Some(entry) = task.last_activity() {
        screen.line(entry.details.clone());
    }

    emit_success(ctx.output, "edit", &TaskReport { task: &task }, Some(&screen))
}

pub async fn run_status(ctx: &Context, raw_id: &str, status: Status) -> Result<()> {
    let mut service = ctx.service().await?;
    let id = resolve_task_id(&service.snapshot(), raw_id)?;
    let task = service.set_status(&id, status).await?;
    emit_task(ctx, "status", &task)
}

pub async fn run_toggle(ctx: &Context, raw_id: &str, checked: bool) -> Result<()> {
    let mut service = ctx.service().await?;
    let id = resolve_task_id(&service.snapshot(), raw_id)?;
    let task = service.toggle_completed(&id, checked).await?;
    emit_task(ctx, if checked { "done" } else { "undone" }, &task)
}

pub async fn run_move(ctx: &Context, raw_id: &str, to: Status, board: bool) -> Result<()> {
    let mut service = ctx.service().await?;
    let snapshot = service.snapshot();
    let id = resolve_task_id(&snapshot, raw_id)?;
    let surface = if board {
        DropSurface::Board
    } else {
        DropSurface::List
    };

    let outcome = service.drop_task(&id, to, surface).await?;
    let Some(MoveOutcome {
        moved,
        status_changed,
        renumbered,
        failures,
    }) = outcome
    else {
        let task = snapshot
            .get(&id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        let report = MoveReport {
            task,
            moved: false,
            renumbered: Vec::new(),
            failed: Vec::new(),
        };
        let screen = Screen::new(format!("taskboard move: {} already in place", task.title));
        return emit_success(ctx.output, "move", &report, Some(&screen));
    };

    let header = if status_changed {
        format!("taskboard move: {} -> {}", moved.title, moved.status)
    } else {
        format!("taskboard move: {} to end of {}", moved.title, moved.status)
    };
    let mut screen = Screen::new(header);
    screen.task_fields(&moved);
    screen.field("renumbered", renumbered.len().to_string());
    for failure in &failures {
        screen.notice(format!(
            "{}: order not updated ({})",
            short_id(&failure.task_id),
            failure.error
        ));
    }

    let report = MoveReport {
        task: &moved,
        moved: true,
        renumbered: renumbered
            .into_iter()
            .map(|(id, order)| RenumberedTask { id, order })
            .collect(),
        failed: failures
            .into_iter()
            .map(|failure| FailedTask {
                id: failure.task_id,
                error: failure.error.to_string(),
            })
            .collect(),
    };
    emit_success(ctx.output, "move", &report, Some(&screen))
}

pub async fn run_rm(ctx: &Context, raw_id: &str) -> Result<()> {
    let mut service = ctx.service().await?;
    let id = resolve_task_id(&service.snapshot(), raw_id)?;
    service.delete(&id).await?;

    let screen = Screen::new(format!("taskboard rm: {}", short_id(&id)));
    emit_success(ctx.output, "rm", &DeleteReport { deleted: id }, Some(&screen))
}

pub async fn run_attach(
    ctx: &Context,
    raw_id: &str,
    file: PathBuf,
    name: Option<String>,
) -> Result<()> {
    let (file_name, bytes) = read_upload(&file, name).await?;

    let mut service = ctx.service().await?;
    let id = resolve_task_id(&service.snapshot(), raw_id)?;
    let task = service.attach(&id, &file_name, bytes).await?;

    let mut screen = Screen::new(format!("taskboard attach: {}", task.title));
    if let Some(url) = &task.file_url {
        screen.field("file", url.clone());
    }
    emit_success(ctx.output, "attach", &TaskReport { task: &task }, Some(&screen))
}

/// Bytes of `file` and the name to store them under.
async fn read_upload(file: &Path, name: Option<String>) -> Result<(String, Vec<u8>)> {
    let file_name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::Validation(format!("cannot tell a file name from {}", file.display()))
            })?,
    };
    let bytes = tokio::fs::read(file).await?;
    Ok((file_name, bytes))
}

fn emit_task(ctx: &Context, command: &str, task: &Task) -> Result<()> {
    let mut screen = Screen::new(format!("taskboard {command}: {}", task.title));
    screen.task_fields(task);
    emit_success(ctx.output, command, &TaskReport { task }, Some(&screen))
}
