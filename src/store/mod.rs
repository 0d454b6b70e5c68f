//! Document store collaborator.
//!
//! The store is the source of truth for task records. It assigns ids on
//! insert, answers equality queries on `userId` and `status`, and commits
//! multi-document batches atomically. Single-document writes are last-write-wins.
//!
//! Implementations:
//! - [`MemoryStore`]: in-process map, used by tests and embedders
//! - [`FileStore`]: JSON collection file under an advisory lock

mod file;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::task::{Category, Status, Task};

pub use file::{FileStore, STORE_SCHEMA_VERSION};
pub use memory::MemoryStore;

/// Equality filter over task documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub user_id: Option<String>,
    pub status: Option<Status>,
}

impl Query {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            status: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(user_id) = &self.user_id {
            if task.user_id != *user_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        true
    }
}

/// Partial field update. `completed` is never patched directly; it follows
/// `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub status: Option<Status>,
    pub category: Option<Category>,
    pub due_date: Option<String>,
    pub order: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Default::default()
        }
    }

    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.set_status(status);
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date.clone();
        }
        if let Some(order) = self.order {
            task.order = order;
        }
        if let Some(updated_at) = self.updated_at {
            task.updated_at = Some(updated_at);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Delete(String),
    Update(String, TaskPatch),
}

impl BatchOp {
    pub fn id(&self) -> &str {
        match self {
            BatchOp::Delete(id) | BatchOp::Update(id, _) => id,
        }
    }
}

/// Multi-document write committed as one unit.
///
/// Deleting an absent document is a no-op; updating one fails the whole
/// batch.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete(&mut self, id: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Delete(id.into()));
        self
    }

    pub fn update(&mut self, id: impl Into<String>, patch: TaskPatch) -> &mut Self {
        self.ops.push(BatchOp::Update(id.into(), patch));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Apply a batch to an in-memory collection, all or nothing.
pub(crate) fn apply_batch(
    docs: &mut std::collections::BTreeMap<String, Task>,
    ops: &[BatchOp],
) -> Result<()> {
    for op in ops {
        if let BatchOp::Update(id, _) = op {
            if !docs.contains_key(id) {
                return Err(crate::error::Error::NotFound(id.clone()));
            }
        }
    }
    for op in ops {
        match op {
            BatchOp::Delete(id) => {
                docs.remove(id);
            }
            BatchOp::Update(id, patch) => {
                if let Some(task) = docs.get_mut(id) {
                    patch.apply(task);
                }
            }
        }
    }
    Ok(())
}

/// Store operations the repository relies on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id.
    async fn get(&self, id: &str) -> Result<Option<Task>>;

    /// All documents matching `query`, in insertion order.
    async fn query(&self, query: &Query) -> Result<Vec<Task>>;

    /// Insert a new document; the store assigns and returns the id.
    async fn add(&self, task: Task) -> Result<String>;

    /// Overwrite an existing document. Fails with `NotFound` if absent.
    async fn set(&self, task: &Task) -> Result<()>;

    /// Patch fields of an existing document. Fails with `NotFound` if absent.
    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<()>;

    /// Remove a document. Absent ids are not an error at this layer.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Commit a batch atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    #[test]
    fn query_matches_owner_and_status() {
        let task = TaskDraft::new("u1", "a").into_task(0);
        assert!(Query::for_user("u1").matches(&task));
        assert!(!Query::for_user("u2").matches(&task));
        assert!(Query::for_user("u1").with_status(Status::Todo).matches(&task));
        assert!(!Query::for_user("u1")
            .with_status(Status::Completed)
            .matches(&task));
    }

    #[test]
    fn status_patch_updates_completed() {
        let mut task = TaskDraft::new("u1", "a").into_task(0);
        TaskPatch::status(Status::Completed).apply(&mut task);
        assert!(task.completed);
        TaskPatch::status(Status::Todo).apply(&mut task);
        assert!(!task.completed);
    }

    #[test]
    fn batch_with_missing_update_target_changes_nothing() {
        let mut docs = std::collections::BTreeMap::new();
        let mut task = TaskDraft::new("u1", "a").into_task(0);
        task.id = "a".to_string();
        docs.insert("a".to_string(), task);

        let mut batch = WriteBatch::new();
        batch.delete("a").update("ghost", TaskPatch::order(1));
        let err = apply_batch(&mut docs, batch.ops()).unwrap_err();
        assert!(err.is_not_found());
        assert!(docs.contains_key("a"));
    }
}
