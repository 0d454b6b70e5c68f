//! taskboard rm-bulk / bulk-status

use crate::error::{Error, Result};
use crate::output::{emit_success, short_id, Screen};
use crate::task::{Status, Task};

use super::task::FailedTask;
use super::{resolve_task_id, Context};

#[derive(serde::Serialize)]
struct BulkDeleteReport {
    deleted: Vec<String>,
    skipped: Vec<String>,
}

#[derive(serde::Serialize)]
struct BulkStatusReport {
    status: Status,
    updated: Vec<Task>,
    failed: Vec<FailedTask>,
}

pub async fn run_rm(ctx: &Context, raw_ids: &[String]) -> Result<()> {
    let mut service = ctx.service().await?;
    let snapshot = service.snapshot();

    // Unknown ids go through as typed; the batch skips what is already gone.
    let mut ids = Vec::with_capacity(raw_ids.len());
    for raw in raw_ids {
        match resolve_task_id(&snapshot, raw) {
            Ok(id) => ids.push(id),
            Err(Error::NotFound(_)) => ids.push(raw.trim().to_string()),
            Err(err) => return Err(err),
        }
    }

    let outcome = service.delete_bulk(&ids).await?;

    let mut screen = Screen::new(format!(
        "taskboard rm-bulk: deleted {} task(s)",
        outcome.deleted.len()
    ));
    for id in &outcome.skipped {
        screen.notice(format!("{}: not found, skipped", short_id(id)));
    }

    let report = BulkDeleteReport {
        deleted: outcome.deleted,
        skipped: outcome.skipped,
    };
    emit_success(ctx.output, "rm-bulk", &report, Some(&screen))
}

pub async fn run_status(ctx: &Context, status: Status, raw_ids: &[String]) -> Result<()> {
    let mut service = ctx.service().await?;
    let snapshot = service.snapshot();

    let mut failed = Vec::new();
    for raw in raw_ids {
        let selected = resolve_task_id(&snapshot, raw).and_then(|id| service.select(&id, true));
        if let Err(err) = selected {
            failed.push(FailedTask {
                id: raw.clone(),
                error: err.to_string(),
            });
        }
    }

    let outcome = service.bulk_change_status(status).await?;
    failed.extend(outcome.failed.into_iter().map(|failure| FailedTask {
        id: failure.task_id,
        error: failure.error.to_string(),
    }));

    let mut screen = Screen::new(format!(
        "taskboard bulk-status: {} task(s) -> {status}",
        outcome.updated.len()
    ));
    for task in &outcome.updated {
        screen.line(format!("{} {}", short_id(&task.id), task.title));
    }
    for failure in &failed {
        screen.notice(format!("{}: {}", short_id(&failure.id), failure.error));
    }

    let report = BulkStatusReport {
        status,
        updated: outcome.updated,
        failed,
    };
    emit_success(ctx.output, "bulk-status", &report, Some(&screen))
}
