//! Client façade over the repository, cache and session.
//!
//! Every mutation goes repository first; only a successful write reaches the
//! cache. A failed write is recorded as the cache's last error and returned.
//!
//! - **Login** loads the user's tasks into the cache; **logout** clears the
//!   cache and the selection.
//! - **Status moves** append at `max + 1` of the target partition, whatever
//!   triggered them (edit form, dropdown, checkbox, drag-and-drop, bulk).
//! - **List drops** renumber the section the task left. Those writes are
//!   independent and are not rolled back when one of them fails.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::attachments::ObjectStore;
use crate::auth::{AuthProvider, Identity, Session};
use crate::cache::{CacheAction, CacheSnapshot, Selection, TaskCache};
use crate::error::{Error, Result};
use crate::reorder::{self, DropSurface};
use crate::repository::TaskRepository;
use crate::store::DocumentStore;
use crate::task::{MoveTrigger, Status, Task, TaskDraft, TaskEdit};

/// One failed write inside a fan-out operation.
#[derive(Debug)]
pub struct BulkFailure {
    pub task_id: String,
    pub error: Error,
}

/// Result of a bulk status change.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub updated: Vec<Task>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a bulk delete.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: Vec<String>,
    /// Requested ids that were already gone.
    pub skipped: Vec<String>,
}

/// Result of a drag-and-drop.
#[derive(Debug)]
pub struct MoveOutcome {
    pub moved: Task,
    pub status_changed: bool,
    /// Origin-section tasks whose new order was written.
    pub renumbered: Vec<(String, i64)>,
    /// Renumbering writes that failed. The moved task is already persisted.
    pub failures: Vec<BulkFailure>,
}

pub struct TaskService<S> {
    repo: TaskRepository<S>,
    cache: TaskCache,
    selection: Selection,
    session: Session,
    objects: Option<Arc<dyn ObjectStore>>,
}

impl<S: DocumentStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: TaskRepository::new(store),
            cache: TaskCache::new(),
            selection: Selection::new(),
            session: Session::new(),
            objects: None,
        }
    }

    pub fn with_object_store(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn repository(&self) -> &TaskRepository<S> {
        &self.repo
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.cache.snapshot()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Sign in through `provider` and load that user's tasks.
    pub async fn sign_in_with(&mut self, provider: &dyn AuthProvider) -> Result<Arc<CacheSnapshot>> {
        self.session.sign_in(provider).await?;
        self.refresh().await
    }

    /// Adopt an already resolved identity and load its tasks.
    pub async fn sign_in(&mut self, identity: Identity) -> Result<Arc<CacheSnapshot>> {
        if identity.uid.trim().is_empty() {
            return Err(Error::Validation("user id cannot be empty".to_string()));
        }
        self.session.set(identity);
        self.refresh().await
    }

    pub fn sign_out(&mut self) {
        self.session.clear();
        self.cache.dispatch(CacheAction::Cleared);
        self.selection.clear();
    }

    /// Reload the signed-in user's tasks from the store.
    pub async fn refresh(&mut self) -> Result<Arc<CacheSnapshot>> {
        let uid = self.session.uid()?.to_string();
        self.cache.dispatch(CacheAction::Pending);
        match self.repo.fetch_all(&uid).await {
            Ok(tasks) => {
                let snapshot = self.cache.dispatch(CacheAction::Loaded { owner: uid, tasks });
                self.selection.retain_existing(&snapshot);
                Ok(snapshot)
            }
            Err(err) => self.fail(err),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Single-task mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Create a task owned by the signed-in user.
    pub async fn create(&mut self, mut draft: TaskDraft) -> Result<Task> {
        draft.user_id = self.session.uid()?.to_string();
        match self.repo.create(draft).await {
            Ok(task) => {
                self.cache.dispatch(CacheAction::Added(task.clone()));
                Ok(task)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Upload `bytes` first, then create the task with its file URL set.
    ///
    /// A failed upload creates nothing.
    pub async fn create_with_attachment(
        &mut self,
        mut draft: TaskDraft,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Task> {
        let objects = self.object_store()?;
        draft.user_id = self.session.uid()?.to_string();
        draft.validate()?;
        let url = match objects.upload(&draft.user_id, file_name, bytes).await {
            Ok(url) => url,
            Err(err) => return self.fail(err),
        };
        self.create(draft.with_file_url(url)).await
    }

    pub async fn edit(&mut self, task_id: &str, edit: &TaskEdit) -> Result<Task> {
        let current = self.cached(task_id)?;
        let result = self.repo.update(&current, edit).await;
        self.settle(result)
    }

    /// Status dropdown.
    pub async fn set_status(&mut self, task_id: &str, status: Status) -> Result<Task> {
        self.move_to(task_id, status, MoveTrigger::ManualEdit).await
    }

    /// Checkbox: checked means Completed, unchecked means Todo.
    pub async fn toggle_completed(&mut self, task_id: &str, checked: bool) -> Result<Task> {
        let status = if checked { Status::Completed } else { Status::Todo };
        self.move_to(task_id, status, MoveTrigger::Checkbox).await
    }

    async fn move_to(&mut self, task_id: &str, status: Status, trigger: MoveTrigger) -> Result<Task> {
        let current = self.cached(task_id)?;
        let result = self.repo.change_status(&current, status, trigger).await;
        self.settle(result)
    }

    pub async fn delete(&mut self, task_id: &str) -> Result<()> {
        match self.repo.delete(task_id).await {
            Ok(id) => {
                self.selection.set(id.clone(), false);
                self.cache.dispatch(CacheAction::Removed(id));
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Upload `bytes` and record the resulting URL on the task.
    pub async fn attach(&mut self, task_id: &str, file_name: &str, bytes: Vec<u8>) -> Result<Task> {
        let objects = self.object_store()?;
        let current = self.cached(task_id)?;
        let url = match objects.upload(&current.user_id, file_name, bytes).await {
            Ok(url) => url,
            Err(err) => return self.fail(err),
        };
        let edit = TaskEdit {
            file_url: Some(url),
            ..Default::default()
        };
        let result = self.repo.update(&current, &edit).await;
        self.settle(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Drag and drop
    // ─────────────────────────────────────────────────────────────────────

    /// Drop `task_id` onto the `target` section of `surface`.
    ///
    /// Returns `None` when the drop changes nothing.
    pub async fn drop_task(
        &mut self,
        task_id: &str,
        target: Status,
        surface: DropSurface,
    ) -> Result<Option<MoveOutcome>> {
        let snapshot = self.cache.snapshot();
        let Some(plan) = reorder::plan_drop(&snapshot.tasks, task_id, target, surface)? else {
            debug!(task_id, %target, "drop changes nothing");
            return Ok(None);
        };

        let moved = match self.repo.save(&plan.moved).await {
            Ok(task) => task,
            Err(err) => return self.fail(err),
        };
        self.cache.dispatch(CacheAction::Updated(moved.clone()));

        let repo = &self.repo;
        let results = join_all(plan.renumber.iter().map(|(id, order)| async move {
            (id.clone(), *order, repo.reorder(id, *order).await)
        }))
        .await;

        let mut renumbered = Vec::new();
        let mut failures = Vec::new();
        for (id, order, result) in results {
            match result {
                Ok(()) => {
                    if let Some(mut task) = snapshot.get(&id).cloned() {
                        task.order = order;
                        self.cache.dispatch(CacheAction::Updated(task));
                    }
                    renumbered.push((id, order));
                }
                Err(error) => failures.push(BulkFailure { task_id: id, error }),
            }
        }
        if !failures.is_empty() {
            warn!(task_id, failed = failures.len(), "renumbering left gaps");
            self.cache.dispatch(CacheAction::Failed(format!(
                "failed to renumber {} task(s)",
                failures.len()
            )));
        }

        Ok(Some(MoveOutcome {
            moved,
            status_changed: plan.status_changed,
            renumbered,
            failures,
        }))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selection and bulk actions
    // ─────────────────────────────────────────────────────────────────────

    /// Tick or untick one task. Unknown ids are rejected.
    pub fn select(&mut self, task_id: &str, selected: bool) -> Result<()> {
        if !self.cache.snapshot().contains(task_id) {
            return Err(Error::NotFound(task_id.to_string()));
        }
        self.selection.set(task_id, selected);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Delete every requested id in one batch. Ids already gone are skipped.
    pub async fn delete_bulk(&mut self, task_ids: &[String]) -> Result<DeleteOutcome> {
        let deleted = match self.repo.delete_bulk(task_ids).await {
            Ok(deleted) => deleted,
            Err(err) => return self.fail(err),
        };
        let skipped = task_ids
            .iter()
            .filter(|id| !deleted.contains(*id))
            .cloned()
            .collect();
        for id in task_ids {
            self.selection.set(id.clone(), false);
        }
        self.cache.dispatch(CacheAction::RemovedMany(task_ids.to_vec()));
        Ok(DeleteOutcome { deleted, skipped })
    }

    pub async fn delete_selected(&mut self) -> Result<DeleteOutcome> {
        let ids = self.selection.ids_in(&self.cache.snapshot());
        self.delete_bulk(&ids).await
    }

    /// Move every selected task into `status`, one independent write each.
    ///
    /// Tasks that were updated leave the selection; failed ones stay.
    pub async fn bulk_change_status(&mut self, status: Status) -> Result<BulkOutcome> {
        let snapshot = self.cache.snapshot();
        let ids = self.selection.ids_in(&snapshot);
        self.change_status_many(&ids, status).await
    }

    /// Bulk status change over explicit ids.
    ///
    /// The target partition is read once; moved tasks take consecutive
    /// orders after its end, in request order.
    pub async fn change_status_many(&mut self, task_ids: &[String], status: Status) -> Result<BulkOutcome> {
        let uid = self.session.uid()?.to_string();
        let snapshot = self.cache.snapshot();
        let mut outcome = BulkOutcome::default();

        let mut targets = Vec::new();
        for id in task_ids {
            match snapshot.get(id) {
                Some(task) if task.status == status => outcome.updated.push(task.clone()),
                Some(task) => targets.push(task),
                None => outcome.failed.push(BulkFailure {
                    task_id: id.clone(),
                    error: Error::NotFound(id.clone()),
                }),
            }
        }
        for task in &outcome.updated {
            self.selection.set(task.id.clone(), false);
        }

        let base = if targets.is_empty() {
            0
        } else {
            match self.repo.next_order(&uid, status, None).await {
                Ok(base) => base,
                Err(err) => return self.fail(err),
            }
        };

        let repo = &self.repo;
        let results = join_all(targets.into_iter().zip(base..).map(|(task, order)| async move {
            (
                task.id.clone(),
                repo.move_at(task, status, order, MoveTrigger::Bulk).await,
            )
        }))
        .await;

        for (id, result) in results {
            match result {
                Ok(task) => {
                    self.selection.set(id, false);
                    self.cache.dispatch(CacheAction::Updated(task.clone()));
                    outcome.updated.push(task);
                }
                Err(error) => outcome.failed.push(BulkFailure { task_id: id, error }),
            }
        }

        if !outcome.failed.is_empty() {
            self.cache.dispatch(CacheAction::Failed(format!(
                "failed to update {} of {} task(s)",
                outcome.failed.len(),
                task_ids.len()
            )));
        }
        Ok(outcome)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn object_store(&self) -> Result<Arc<dyn ObjectStore>> {
        self.objects
            .clone()
            .ok_or_else(|| Error::Store("no object store configured".to_string()))
    }

    fn cached(&self, task_id: &str) -> Result<Task> {
        self.cache
            .snapshot()
            .get(task_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(task_id.to_string()))
    }

    fn settle(&mut self, result: Result<Task>) -> Result<Task> {
        match result {
            Ok(task) => {
                self.cache.dispatch(CacheAction::Updated(task.clone()));
                Ok(task)
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail<T>(&mut self, err: Error) -> Result<T> {
        self.cache.dispatch(CacheAction::Failed(err.to_string()));
        Err(err)
    }
}
