//! Client-side task cache.
//!
//! The cache is an owned value handed to whoever needs it. Each
//! [`CacheAction`] produces a fresh [`CacheSnapshot`] behind an `Arc`, so
//! readers holding an older snapshot never see it change underneath them.

use std::collections::HashSet;
use std::sync::Arc;

use crate::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Immutable view of the cache at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub owner: Option<String>,
    pub tasks: Vec<Task>,
    pub status: LoadStatus,
    pub error: Option<String>,
}

impl CacheSnapshot {
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

/// Everything that may change the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
    /// A store request is in flight.
    Pending,
    /// Full fetch finished for `owner`.
    Loaded { owner: String, tasks: Vec<Task> },
    Added(Task),
    /// Replace the record with the same id; unknown ids are ignored.
    Updated(Task),
    Removed(String),
    RemovedMany(Vec<String>),
    /// A request failed; tasks are kept as they were.
    Failed(String),
    /// Sign-out: drop everything.
    Cleared,
}

/// Pure transition function behind [`TaskCache::dispatch`].
pub fn reduce(state: &CacheSnapshot, action: CacheAction) -> CacheSnapshot {
    let mut next = state.clone();
    match action {
        CacheAction::Pending => {
            next.status = LoadStatus::Loading;
            next.error = None;
            return next;
        }
        CacheAction::Loaded { owner, tasks } => {
            next.owner = Some(owner);
            next.tasks = tasks;
        }
        CacheAction::Added(task) => next.tasks.push(task),
        CacheAction::Updated(task) => {
            if let Some(slot) = next.tasks.iter_mut().find(|t| t.id == task.id) {
                *slot = task;
            }
        }
        CacheAction::Removed(id) => next.tasks.retain(|task| task.id != id),
        CacheAction::RemovedMany(ids) => {
            let ids: HashSet<String> = ids.into_iter().collect();
            next.tasks.retain(|task| !ids.contains(&task.id));
        }
        CacheAction::Failed(message) => {
            next.status = LoadStatus::Failed;
            next.error = Some(message);
            return next;
        }
        CacheAction::Cleared => return CacheSnapshot::default(),
    }
    next.status = LoadStatus::Succeeded;
    next.error = None;
    next
}

#[derive(Debug, Default)]
pub struct TaskCache {
    current: Arc<CacheSnapshot>,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn dispatch(&mut self, action: CacheAction) -> Arc<CacheSnapshot> {
        self.current = Arc::new(reduce(&self.current, action));
        self.snapshot()
    }
}

/// Ticked checkboxes in the list view. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: impl Into<String>, selected: bool) {
        let id = id.into();
        if selected {
            self.ids.insert(id);
        } else {
            self.ids.remove(&id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected ids in snapshot order, skipping ids no longer cached.
    pub fn ids_in(&self, snapshot: &CacheSnapshot) -> Vec<String> {
        snapshot
            .tasks
            .iter()
            .filter(|task| self.ids.contains(&task.id))
            .map(|task| task.id.clone())
            .collect()
    }

    /// Drop ids that are no longer in the snapshot.
    pub fn retain_existing(&mut self, snapshot: &CacheSnapshot) {
        self.ids.retain(|id| snapshot.contains(id));
    }
}
