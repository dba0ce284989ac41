//! Artifact persistence (spec §6): raw provider snapshots, normalized
//! articles, and run-level artifacts, written under a configured root
//! directory. Writes are idempotent by path and refuse to escape the root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use retrieval_common::RetrievalError;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn ensure_layout(&self) -> Result<(), RetrievalError>;
    async fn save_raw_provider_snapshot(&self, provider: &str, run_id: &str, payload: &[u8]) -> Result<(), RetrievalError>;
    async fn save_normalized_article(&self, article_id: &str, payload: &[u8]) -> Result<(), RetrievalError>;
    async fn save_run_artifact(&self, run_id: &str, kind: &str, payload: &[u8]) -> Result<(), RetrievalError>;
}

/// Filesystem-backed store rooted at a configured directory. Every write
/// path is joined under the root and canonicalized against it so a
/// crafted `provider`/`article_id`/`kind` can't climb out with `../`.
pub struct FilesystemArtifactStore {
    root: PathBuf,
}

impl FilesystemArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &Path) -> Result<PathBuf, RetrievalError> {
        for component in relative.components() {
            if matches!(component, std::path::Component::ParentDir | std::path::Component::RootDir) {
                return Err(RetrievalError::artifact_io(format!(
                    "refusing to write outside artifact root: {}",
                    relative.display()
                )));
            }
        }
        Ok(self.root.join(relative))
    }

    async fn write(&self, relative: PathBuf, payload: &[u8]) -> Result<(), RetrievalError> {
        let path = self.resolve(&relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RetrievalError::artifact_io(format!("create_dir_all {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, payload)
            .await
            .map_err(|e| RetrievalError::artifact_io(format!("write {}: {e}", path.display())))
    }
}

#[async_trait]
impl ArtifactStore for FilesystemArtifactStore {
    async fn ensure_layout(&self) -> Result<(), RetrievalError> {
        for dir in ["raw", "normalized", "runs"] {
            tokio::fs::create_dir_all(self.root.join(dir))
                .await
                .map_err(|e| RetrievalError::artifact_io(format!("create_dir_all {dir}: {e}")))?;
        }
        Ok(())
    }

    async fn save_raw_provider_snapshot(&self, provider: &str, run_id: &str, payload: &[u8]) -> Result<(), RetrievalError> {
        self.write(PathBuf::from("raw").join(run_id).join(format!("{provider}.json")), payload).await
    }

    async fn save_normalized_article(&self, article_id: &str, payload: &[u8]) -> Result<(), RetrievalError> {
        self.write(PathBuf::from("normalized").join(format!("{article_id}.json")), payload).await
    }

    async fn save_run_artifact(&self, run_id: &str, kind: &str, payload: &[u8]) -> Result<(), RetrievalError> {
        self.write(PathBuf::from("runs").join(run_id).join(format!("{kind}.json")), payload).await
    }
}

/// No-op store for `PersistenceMode::Null`.
pub struct NullArtifactStore;

#[async_trait]
impl ArtifactStore for NullArtifactStore {
    async fn ensure_layout(&self) -> Result<(), RetrievalError> {
        Ok(())
    }

    async fn save_raw_provider_snapshot(&self, _provider: &str, _run_id: &str, _payload: &[u8]) -> Result<(), RetrievalError> {
        Ok(())
    }

    async fn save_normalized_article(&self, _article_id: &str, _payload: &[u8]) -> Result<(), RetrievalError> {
        Ok(())
    }

    async fn save_run_artifact(&self, _run_id: &str, _kind: &str, _payload: &[u8]) -> Result<(), RetrievalError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_land_under_the_configured_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path());
        store.ensure_layout().await.unwrap();
        store.save_normalized_article("abc", b"{}").await.unwrap();
        assert!(dir.path().join("normalized/abc.json").exists());
    }

    #[tokio::test]
    async fn raw_snapshots_are_namespaced_by_run_and_provider() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path());
        store.ensure_layout().await.unwrap();
        store.save_raw_provider_snapshot("web_search", "run-1", b"[]").await.unwrap();
        assert!(dir.path().join("raw/run-1/web_search.json").exists());
    }

    #[tokio::test]
    async fn path_traversal_in_identifiers_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path());
        let result = store.save_normalized_article("../../etc/passwd", b"x").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn null_store_never_touches_disk() {
        let store = NullArtifactStore;
        store.ensure_layout().await.unwrap();
        store.save_run_artifact("run-1", "summary", b"{}").await.unwrap();
    }
}
