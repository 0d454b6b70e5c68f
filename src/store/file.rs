use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ulid::Generator;

use super::{apply_batch, DocumentStore, Query, TaskPatch, WriteBatch};
use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::Task;

pub const STORE_SCHEMA_VERSION: &str = "taskboard.store.v1";

/// On-disk layout of a collection file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Collection {
    schema_version: String,
    #[serde(default)]
    tasks: BTreeMap<String, Task>,
}

impl Default for Collection {
    fn default() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION.to_string(),
            tasks: BTreeMap::new(),
        }
    }
}

/// Document store backed by a single JSON file.
///
/// Each operation reads the whole collection under `<file>.lock`, and
/// writers replace it atomically before releasing the lock. Blocking file
/// I/O runs on tokio's blocking pool.
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_timeout_ms: u64,
    ids: Arc<Mutex<Generator>>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("lock_timeout_ms", &self.lock_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            ids: Arc::new(Mutex::new(Generator::new())),
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn next_id(&self) -> Result<String> {
        let mut ids = self
            .ids
            .lock()
            .map_err(|_| Error::Store("id generator poisoned".to_string()))?;
        let id = ids
            .generate()
            .map_err(|err| Error::Store(format!("id generation failed: {err}")))?;
        Ok(id.to_string().to_lowercase())
    }

    async fn read<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Collection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let timeout = self.lock_timeout_ms;
        run_blocking(move || {
            let _lock = FileLock::acquire(lock::lock_path_for(&path), timeout)?;
            let collection = read_collection(&path)?;
            f(&collection)
        })
        .await
    }

    async fn write<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Collection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let timeout = self.lock_timeout_ms;
        run_blocking(move || {
            let _lock = FileLock::acquire(lock::lock_path_for(&path), timeout)?;
            let mut collection = read_collection(&path)?;
            let result = f(&mut collection)?;
            let json = serde_json::to_string_pretty(&collection)?;
            lock::write_atomic(&path, json.as_bytes())?;
            Ok(result)
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| Error::Store(format!("store worker failed: {err}")))?
}

fn read_collection(path: &Path) -> Result<Collection> {
    if !path.exists() {
        return Ok(Collection::default());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Collection::default());
    }
    let collection: Collection = serde_json::from_str(&content)?;
    if collection.schema_version != STORE_SCHEMA_VERSION {
        return Err(Error::Store(format!(
            "unsupported store schema '{}' in {}",
            collection.schema_version,
            path.display()
        )));
    }
    Ok(collection)
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, id: &str) -> Result<Option<Task>> {
        let id = id.to_string();
        self.read(move |collection| Ok(collection.tasks.get(&id).cloned()))
            .await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Task>> {
        let query = query.clone();
        self.read(move |collection| {
            Ok(collection
                .tasks
                .values()
                .filter(|task| query.matches(task))
                .cloned()
                .collect())
        })
        .await
    }

    async fn add(&self, mut task: Task) -> Result<String> {
        let id = self.next_id()?;
        task.id = id.clone();
        self.write(move |collection| {
            collection.tasks.insert(id.clone(), task);
            Ok(id)
        })
        .await
    }

    async fn set(&self, task: &Task) -> Result<()> {
        let task = task.clone();
        self.write(move |collection| match collection.tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task;
                Ok(())
            }
            None => Err(Error::NotFound(task.id)),
        })
        .await
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        let id = id.to_string();
        let patch = patch.clone();
        self.write(move |collection| match collection.tasks.get_mut(&id) {
            Some(existing) => {
                patch.apply(existing);
                Ok(())
            }
            None => Err(Error::NotFound(id)),
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.write(move |collection| {
            collection.tasks.remove(&id);
            Ok(())
        })
        .await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let ops = batch.into_ops();
        self.write(move |collection| apply_batch(&mut collection.tasks, &ops))
            .await
    }
}
