//! Status transitions and order bookkeeping.
//!
//! `order` is dense-by-intent inside a status partition. Entering a
//! partition appends at `max + 1`; a list-view drop also renumbers the
//! section the task left so its remaining tasks read 0, 1, 2, ...

use crate::error::{Error, Result};
use crate::task::{ActivityAction, ActivityEntry, MoveTrigger, Status, Task};

/// Which surface a drop came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSurface {
    /// Sectioned list; drops renumber the origin section.
    List,
    /// Kanban columns; drops only append to the target column.
    Board,
}

/// Writes needed to carry out one drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// The dropped task in its final state. Persisted first.
    pub moved: Task,
    /// Whether `moved` changed partition (and gained an activity entry).
    pub status_changed: bool,
    /// `(task id, new order)` for origin-section tasks whose order changes.
    pub renumber: Vec<(String, i64)>,
}

/// `max(order in status) + 1`, or 0 for an empty partition.
pub fn next_order<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    status: Status,
    exclude: Option<&str>,
) -> i64 {
    tasks
        .into_iter()
        .filter(|task| task.status == status)
        .filter(|task| Some(task.id.as_str()) != exclude)
        .map(|task| task.order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Tasks of `status` other than `exclude`, in their current order.
fn remaining<'a>(tasks: &'a [Task], status: Status, exclude: &str) -> Vec<&'a Task> {
    let mut section: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.status == status && task.id != exclude)
        .collect();
    section.sort_by_key(|task| task.order);
    section
}

/// New sequence indexes for the tasks left in `status` once `exclude` is
/// gone. Only tasks whose order actually changes are returned.
pub fn renumber(tasks: &[Task], status: Status, exclude: &str) -> Vec<(String, i64)> {
    remaining(tasks, status, exclude)
        .into_iter()
        .enumerate()
        .filter_map(|(index, task)| {
            let index = index as i64;
            (task.order != index).then(|| (task.id.clone(), index))
        })
        .collect()
}

/// `task` moved into `status` at `order`, with the transition logged.
pub fn transition(task: &Task, status: Status, order: i64, trigger: MoveTrigger) -> Task {
    let mut moved = task.clone();
    moved.set_status(status);
    moved.order = order;
    moved.record(ActivityEntry::new(
        ActivityAction::StatusChange,
        trigger.describe(status),
    ));
    moved.touch();
    moved
}

/// Plan a drag-and-drop of `task_id` onto the `target` section.
///
/// Returns `None` when the drop changes nothing (a board drop onto the
/// task's own column).
pub fn plan_drop(
    tasks: &[Task],
    task_id: &str,
    target: Status,
    surface: DropSurface,
) -> Result<Option<MovePlan>> {
    let task = tasks
        .iter()
        .find(|task| task.id == task_id)
        .ok_or_else(|| Error::NotFound(task_id.to_string()))?;
    let origin = task.status;

    if origin == target {
        if surface == DropSurface::Board {
            return Ok(None);
        }
        // Same list section: the others close ranks, the dropped task goes last.
        let renumber = renumber(tasks, origin, task_id);
        let mut moved = task.clone();
        moved.order = remaining(tasks, origin, task_id).len() as i64;
        if moved.order == task.order && renumber.is_empty() {
            return Ok(None);
        }
        moved.touch();
        return Ok(Some(MovePlan {
            moved,
            status_changed: false,
            renumber,
        }));
    }

    let order = next_order(tasks, target, Some(task_id));
    let moved = transition(task, target, order, MoveTrigger::DragAndDrop);
    let renumber = match surface {
        DropSurface::List => renumber(tasks, origin, task_id),
        DropSurface::Board => Vec::new(),
    };
    Ok(Some(MovePlan {
        moved,
        status_changed: true,
        renumber,
    }))
}
