//! Binary object store for task attachments.
//!
//! Objects live under `taskImages/<uid>/<file name>`; uploading the same
//! name twice overwrites the earlier object.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::lock;

const ATTACHMENT_PREFIX: &str = "taskImages";

/// Object path for an upload.
pub fn object_path(user_id: &str, file_name: &str) -> Result<String> {
    validate_segment(user_id, "user id")?;
    validate_segment(file_name, "file name")?;
    Ok(format!("{ATTACHMENT_PREFIX}/{user_id}/{file_name}"))
}

fn validate_segment(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{what} cannot be empty")));
    }
    if value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(Error::Validation(format!(
            "{what} must be a bare name, got '{value}'"
        )));
    }
    Ok(())
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` and return a durable retrieval URL.
    async fn upload(&self, user_id: &str, file_name: &str, bytes: Vec<u8>) -> Result<String>;

    /// URL for an existing object path.
    async fn url_for(&self, path: &str) -> Result<String>;
}

/// Object store rooted at a local directory, handing out `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url(path: &Path) -> Result<String> {
        let absolute = std::path::absolute(path)?;
        Ok(format!("file://{}", absolute.display()))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, user_id: &str, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let target = self.root.join(object_path(user_id, file_name)?);
        let size = bytes.len();
        let written = target.clone();
        tokio::task::spawn_blocking(move || lock::write_atomic(&written, &bytes))
            .await
            .map_err(|err| Error::Store(format!("upload worker failed: {err}")))?
            .inspect_err(|err| error!(path = %target.display(), %err, "uploading attachment failed"))?;
        debug!(path = %target.display(), size, "attachment uploaded");
        Self::url(&target)
    }

    async fn url_for(&self, path: &str) -> Result<String> {
        if Path::new(path).is_absolute()
            || path.starts_with(['/', '\\'])
            || path.split(['/', '\\']).any(|segment| segment == "..")
        {
            return Err(Error::Validation(format!("invalid object path '{path}'")));
        }
        let target = self.root.join(path);
        if !target.is_file() {
            return Err(Error::NotFound(path.to_string()));
        }
        Self::url(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_is_namespaced_by_user() {
        assert_eq!(
            object_path("u1", "receipt.png").unwrap(),
            "taskImages/u1/receipt.png"
        );
    }

    #[test]
    fn object_path_rejects_separators() {
        assert!(object_path("u1", "../etc/passwd").is_err());
        assert!(object_path("u1", "").is_err());
        assert!(object_path("a/b", "x.png").is_err());
    }

    #[tokio::test]
    async fn upload_then_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let url = store.upload("u1", "a.txt", b"hello".to_vec()).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("taskImages/u1/a.txt"));

        let stored = dir.path().join("taskImages").join("u1").join("a.txt");
        assert_eq!(std::fs::read(&stored).unwrap(), b"hello");

        let resolved = store.url_for("taskImages/u1/a.txt").await.unwrap();
        assert_eq!(resolved, url);
        let missing = store.url_for("taskImages/u1/none.txt").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn url_for_stays_inside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::NamedTempFile::new().unwrap();
        let store = LocalObjectStore::new(dir.path().join("attachments"));

        let absolute = outside.path().to_string_lossy().into_owned();
        let err = store.url_for(&absolute).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(matches!(
            store.url_for("taskImages/../../secret").await,
            Err(Error::Validation(_))
        ));
    }
}
