use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;
use ulid::Generator;

use super::{apply_batch, DocumentStore, Query, TaskPatch, WriteBatch};
use crate::error::{Error, Result};
use crate::task::Task;

/// In-process document store.
///
/// Ids are monotonic ULIDs, so iteration order is insertion order. Tests can
/// make specific writes fail to exercise partial-failure paths.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

struct Inner {
    docs: BTreeMap<String, Task>,
    ids: Generator,
    failing_ids: HashSet<String>,
    fail_next: usize,
    commits: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                docs: BTreeMap::new(),
                ids: Generator::new(),
                failing_ids: HashSet::new(),
                fail_next: 0,
                commits: 0,
            }),
        }
    }

    /// Seed documents verbatim, keeping their ids.
    pub async fn seed(&self, tasks: impl IntoIterator<Item = Task>) {
        let mut inner = self.inner.lock().await;
        for task in tasks {
            inner.docs.insert(task.id.clone(), task);
        }
    }

    /// Every write touching `id` fails with a store error from now on.
    pub async fn fail_writes_to(&self, id: impl Into<String>) {
        self.inner.lock().await.failing_ids.insert(id.into());
    }

    /// The next `count` operations of any kind fail with a store error.
    pub async fn fail_next(&self, count: usize) {
        self.inner.lock().await.fail_next = count;
    }

    /// Number of batches committed so far.
    pub async fn commits(&self) -> usize {
        self.inner.lock().await.commits
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.docs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.docs.is_empty()
    }
}

impl Inner {
    fn check_available(&mut self) -> Result<()> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(Error::Store("injected failure".to_string()));
        }
        Ok(())
    }

    fn check_writable(&mut self, id: &str) -> Result<()> {
        self.check_available()?;
        if self.failing_ids.contains(id) {
            return Err(Error::Store(format!("write rejected for {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Task>> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        Ok(inner.docs.get(id).cloned())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Task>> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        Ok(inner
            .docs
            .values()
            .filter(|task| query.matches(task))
            .cloned()
            .collect())
    }

    async fn add(&self, mut task: Task) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        let id = inner
            .ids
            .generate()
            .map_err(|err| Error::Store(format!("id generation failed: {err}")))?
            .to_string()
            .to_lowercase();
        task.id = id.clone();
        inner.docs.insert(id.clone(), task);
        Ok(id)
    }

    async fn set(&self, task: &Task) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writable(&task.id)?;
        match inner.docs.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(())
            }
            None => Err(Error::NotFound(task.id.clone())),
        }
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writable(id)?;
        match inner.docs.get_mut(id) {
            Some(existing) => {
                patch.apply(existing);
                Ok(())
            }
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writable(id)?;
        inner.docs.remove(id);
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        for op in batch.ops() {
            if inner.failing_ids.contains(op.id()) {
                return Err(Error::Store(format!("batch rejected for {}", op.id())));
            }
        }
        apply_batch(&mut inner.docs, batch.ops())?;
        inner.commits += 1;
        Ok(())
    }
}
