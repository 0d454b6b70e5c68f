//! Task mutations translated into document store operations.
//!
//! Every method returns the persisted record (or the ids it touched) so the
//! caller can update its cache from the result alone. Failures are logged
//! and returned; nothing is retried.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::reorder;
use crate::store::{DocumentStore, Query, TaskPatch, WriteBatch};
use crate::task::{ActivityAction, ActivityEntry, MoveTrigger, Status, Task, TaskDraft, TaskEdit};

/// Repository over a [`DocumentStore`].
pub struct TaskRepository<S> {
    store: S,
}

impl<S: DocumentStore> TaskRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All tasks owned by `user_id`. An empty id yields an empty list.
    pub async fn fetch_all(&self, user_id: &str) -> Result<Vec<Task>> {
        if user_id.trim().is_empty() {
            warn!("fetch_all called without a user id");
            return Ok(Vec::new());
        }
        let mut tasks = self
            .store
            .query(&Query::for_user(user_id))
            .await
            .inspect_err(|err| error!(user_id, %err, "fetching tasks failed"))?;
        for task in &mut tasks {
            task.normalize();
        }
        debug!(user_id, count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    /// Order a task entering `status` should receive.
    pub async fn next_order(&self, user_id: &str, status: Status, exclude: Option<&str>) -> Result<i64> {
        let partition = self
            .store
            .query(&Query::for_user(user_id).with_status(status))
            .await?;
        Ok(reorder::next_order(&partition, status, exclude))
    }

    /// Persist a new task at the end of its status partition.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task> {
        draft.validate()?;
        let order = self
            .next_order(&draft.user_id, draft.status, None)
            .await
            .inspect_err(|err| error!(%err, "computing order for new task failed"))?;

        let mut task = draft.into_task(order);
        let id = self
            .store
            .add(task.clone())
            .await
            .inspect_err(|err| error!(title = %task.title, %err, "creating task failed"))?;
        task.id = id;
        info!(task_id = %task.id, status = %task.status, order, "task created");
        Ok(task)
    }

    /// Apply an edit-form change to `current` and write the full record.
    ///
    /// A status change moves the task to the end of its new partition.
    pub async fn update(&self, current: &Task, edit: &TaskEdit) -> Result<Task> {
        if let Some(title) = &edit.title {
            if title.trim().is_empty() {
                return Err(Error::Validation("task title cannot be empty".to_string()));
            }
        }

        let mut updated = current.clone();
        let details = edit.describe(current);
        if let Some(status) = edit.status_change(current) {
            updated.order = self
                .next_order(&current.user_id, status, Some(&current.id))
                .await
                .inspect_err(|err| error!(task_id = %current.id, %err, "computing order failed"))?;
        }
        edit.apply_to(&mut updated);
        updated.normalize();
        updated.record(ActivityEntry::new(ActivityAction::Updated, details));
        updated.touch();

        self.write(&updated).await?;
        debug!(task_id = %updated.id, "task updated");
        Ok(updated)
    }

    /// Move `current` into `status`, recording what triggered it.
    ///
    /// Returns the task unchanged when it is already in `status`.
    pub async fn change_status(&self, current: &Task, status: Status, trigger: MoveTrigger) -> Result<Task> {
        if current.status == status {
            return Ok(current.clone());
        }
        let order = self
            .next_order(&current.user_id, status, Some(&current.id))
            .await
            .inspect_err(|err| error!(task_id = %current.id, %err, "computing order failed"))?;
        self.move_at(current, status, order, trigger).await
    }

    /// Move `current` into `status` at an order the caller already chose.
    ///
    /// Used by bulk moves, which assign consecutive orders up front.
    pub async fn move_at(
        &self,
        current: &Task,
        status: Status,
        order: i64,
        trigger: MoveTrigger,
    ) -> Result<Task> {
        let moved = reorder::transition(current, status, order, trigger);
        self.write(&moved).await?;
        debug!(task_id = %moved.id, status = %status, order, "task status changed");
        Ok(moved)
    }

    /// Write a full record as-is. Last write wins.
    pub async fn save(&self, task: &Task) -> Result<Task> {
        let mut task = task.clone();
        task.normalize();
        self.write(&task).await?;
        Ok(task)
    }

    /// Set only the order field of one task.
    pub async fn reorder(&self, task_id: &str, order: i64) -> Result<()> {
        let patch = TaskPatch {
            order: Some(order),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.store
            .update(task_id, &patch)
            .await
            .inspect_err(|err| error!(task_id, order, %err, "reordering task failed"))
    }

    /// Delete one task. Fails with `NotFound` when it is already gone.
    pub async fn delete(&self, task_id: &str) -> Result<String> {
        if task_id.trim().is_empty() {
            return Err(Error::Validation("task id is required".to_string()));
        }
        let existing = self
            .store
            .get(task_id)
            .await
            .inspect_err(|err| error!(task_id, %err, "looking up task for delete failed"))?;
        if existing.is_none() {
            warn!(task_id, "delete requested for missing task");
            return Err(Error::NotFound(task_id.to_string()));
        }
        self.store
            .delete(task_id)
            .await
            .inspect_err(|err| error!(task_id, %err, "deleting task failed"))?;
        info!(task_id, "task deleted");
        Ok(task_id.to_string())
    }

    /// Delete every existing id in one atomic batch; missing ids are skipped.
    ///
    /// Returns the ids that were actually deleted.
    pub async fn delete_bulk(&self, task_ids: &[String]) -> Result<Vec<String>> {
        let existing = self.existing_ids(task_ids).await?;
        if existing.is_empty() {
            debug!("bulk delete had nothing to delete");
            return Ok(existing);
        }

        let mut batch = WriteBatch::new();
        for id in &existing {
            batch.delete(id.clone());
        }
        self.store
            .commit(batch)
            .await
            .inspect_err(|err| error!(count = existing.len(), %err, "bulk delete failed"))?;
        info!(count = existing.len(), "bulk delete committed");
        Ok(existing)
    }

    /// Apply the same patch to every existing id in one atomic batch.
    pub async fn update_bulk(&self, task_ids: &[String], patch: &TaskPatch) -> Result<Vec<String>> {
        let existing = self.existing_ids(task_ids).await?;
        if existing.is_empty() {
            return Ok(existing);
        }

        let mut patch = patch.clone();
        patch.updated_at = Some(Utc::now());
        let mut batch = WriteBatch::new();
        for id in &existing {
            batch.update(id.clone(), patch.clone());
        }
        self.store
            .commit(batch)
            .await
            .inspect_err(|err| error!(count = existing.len(), %err, "bulk update failed"))?;
        info!(count = existing.len(), "bulk update committed");
        Ok(existing)
    }

    async fn existing_ids(&self, task_ids: &[String]) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut existing = Vec::new();
        for id in task_ids {
            if id.trim().is_empty() || !seen.insert(id.as_str()) {
                continue;
            }
            let found = self
                .store
                .get(id)
                .await
                .inspect_err(|err| error!(task_id = %id, %err, "looking up task failed"))?;
            if found.is_some() {
                existing.push(id.clone());
            } else {
                warn!(task_id = %id, "task not found, skipping");
            }
        }
        Ok(existing)
    }

    async fn write(&self, task: &Task) -> Result<()> {
        self.store
            .set(task)
            .await
            .inspect_err(|err| error!(task_id = %task.id, %err, "writing task failed"))
    }
}
