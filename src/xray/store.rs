//! Persistence of the xray document with rollback.
//!
//! # Responsibilities
//! - Read and parse the document, remembering the exact bytes read
//! - Write a new document atomically (temp file + rename)
//! - Trigger the reload and restore the original bytes if anything fails
//!
//! # Design Decisions
//! - `apply_or_rollback` is the only write path
//! - Commit runs on its own task: dropping the caller's future cannot
//!   stop a rollback halfway
//! - Write failure and reload failure are reported the same way

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::observability::metrics;
use crate::xray::document::XrayDocument;
use crate::xray::reload::{ReloadError, Reloader};

/// Errors reading or writing the document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A loaded document together with the bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    document: XrayDocument,
    raw: String,
}

impl Snapshot {
    pub fn document(&self) -> &XrayDocument {
        &self.document
    }

    /// Deep copy to mutate; the snapshot itself stays untouched for rollback.
    pub fn working_copy(&self) -> XrayDocument {
        self.document.clone()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Owner of the on-disk xray document.
#[derive(Clone)]
pub struct ConfigStore {
    path: PathBuf,
    reloader: Arc<dyn Reloader>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, reloader: Arc<dyn Reloader>) -> Self {
        Self {
            path: path.into(),
            reloader,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document.
    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;
        let document = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Snapshot { document, raw })
    }

    /// Persist `updated` and reload. On any failure the bytes of
    /// `previous` are written back and the service is reloaded again.
    ///
    /// Returns `true` only if the new document was written and the reload
    /// succeeded.
    pub async fn apply_or_rollback(&self, updated: &XrayDocument, previous: &Snapshot) -> bool {
        let rendered = match render(updated) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::error!(error = %e, "Refusing to write document");
                return false;
            }
        };

        let path = self.path.clone();
        let reloader = self.reloader.clone();
        let original = previous.raw.clone();

        let task = tokio::spawn(async move { commit(&path, reloader.as_ref(), &rendered, &original).await });

        match task.await {
            Ok(applied) => applied,
            Err(e) => {
                tracing::error!(error = %e, "Commit task did not complete");
                false
            }
        }
    }
}

#[derive(Debug, Error)]
enum CommitError {
    #[error(transparent)]
    Write(#[from] StoreError),
    #[error(transparent)]
    Reload(#[from] ReloadError),
}

async fn commit(path: &Path, reloader: &dyn Reloader, rendered: &str, original: &str) -> bool {
    let attempt = async {
        write_atomic(path, rendered).await?;
        reloader.reload().await?;
        Ok::<(), CommitError>(())
    }
    .await;

    let Err(cause) = attempt else {
        metrics::record_reload("success");
        tracing::info!(path = %path.display(), "Configuration applied");
        return true;
    };

    metrics::record_reload("failure");
    metrics::record_rollback();
    tracing::error!(path = %path.display(), error = %cause, "Applying configuration failed, rolling back");

    if let Err(e) = write_atomic(path, original).await {
        tracing::error!(path = %path.display(), error = %e, "Rollback write failed");
    }
    match reloader.reload().await {
        Ok(()) => tracing::warn!(path = %path.display(), "Previous configuration restored"),
        Err(e) => tracing::error!(error = %e, "Reload after rollback failed"),
    }

    false
}

/// Render with 4-space indentation.
fn render(document: &XrayDocument) -> Result<String, StoreError> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write to a sibling temp file, sync, then rename over `path`.
///
/// The temp file takes the permissions of the file it replaces; the
/// document carries the REALITY private key.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = temp_path(path);
    let to_store_error = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(&tmp).await.map_err(to_store_error)?;
    let written = async {
        if let Ok(existing) = tokio::fs::metadata(path).await {
            file.set_permissions(existing.permissions()).await?;
        }
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await
    }
    .await;
    drop(file);

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(to_store_error(e));
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(to_store_error(e));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config.json".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const DOC: &str = r#"{"inbounds": [{"tag": "in", "settings": {"clients": []}}], "log": {}}"#;

    #[derive(Default)]
    struct TestReloader {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl Reloader for TestReloader {
        async fn reload(&self) -> Result<(), ReloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(ReloadError::Other("injected".into()))
            } else {
                Ok(())
            }
        }
    }

    fn setup(contents: &str) -> (tempfile::TempDir, PathBuf, Arc<TestReloader>, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, contents).unwrap();
        let reloader = Arc::new(TestReloader::default());
        let store = ConfigStore::new(&path, reloader.clone());
        (dir, path, reloader, store)
    }

    #[tokio::test]
    async fn test_load_keeps_raw_bytes() {
        let (_dir, _path, _reloader, store) = setup(DOC);
        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.raw(), DOC);
        assert_eq!(snapshot.document().inbounds.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let store = ConfigStore::new("/nonexistent/config.json", Arc::new(TestReloader::default()));
        assert!(matches!(store.load().await, Err(StoreError::Read { .. })));
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let (_dir, _path, _reloader, store) = setup("{ not json");
        assert!(matches!(store.load().await, Err(StoreError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_apply_writes_and_reloads_once() {
        let (_dir, path, reloader, store) = setup(DOC);
        let snapshot = store.load().await.unwrap();
        let mut updated = snapshot.working_copy();
        updated.inbounds[0].tag = Some("renamed".into());

        assert!(store.apply_or_rollback(&updated, &snapshot).await);
        assert_eq!(reloader.calls.load(Ordering::SeqCst), 1);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n    \"inbounds\""));
        assert!(written.contains("renamed"));
        assert!(!path.with_file_name(".config.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_reload_failure_restores_original_bytes() {
        let (_dir, path, reloader, store) = setup(DOC);
        reloader.fail.store(true, Ordering::SeqCst);
        let snapshot = store.load().await.unwrap();
        let mut updated = snapshot.working_copy();
        updated.inbounds.clear();

        assert!(!store.apply_or_rollback(&updated, &snapshot).await);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOC);
        assert_eq!(reloader.calls.load(Ordering::SeqCst), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_apply_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, path, _reloader, store) = setup(DOC);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        let snapshot = store.load().await.unwrap();
        let mut updated = snapshot.working_copy();
        updated.inbounds[0].tag = Some("renamed".into());

        assert!(store.apply_or_rollback(&updated, &snapshot).await);
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[tokio::test]
    async fn test_write_failure_rolls_back() {
        let (dir, path, reloader, store) = setup(DOC);
        let snapshot = store.load().await.unwrap();
        // A directory in place of the temp file makes the write fail.
        std::fs::create_dir(dir.path().join(".config.json.tmp")).unwrap();

        assert!(!store.apply_or_rollback(&snapshot.working_copy(), &snapshot).await);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOC);
        assert_eq!(reloader.calls.load(Ordering::SeqCst), 1);
    }
}
