//! Local file backend
//!
//! Documents live as plain files under a data directory. Writes go to a
//! temporary sibling file which is synced and then renamed over the target,
//! so a crash never leaves a half-written document behind. Local files carry
//! no version token.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::backend::{DocumentBackend, StoredDocument};
use crate::error::{StoreError, StoreResult};

/// Document backend writing to a local directory
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    root: PathBuf,
}

impl LocalFileBackend {
    /// Create a backend rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a document path below the root, refusing anything that escapes it
    pub fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StoreError::Configuration(format!(
                "Invalid document path '{}'",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentBackend for LocalFileBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn fetch(&self, path: &str) -> StoreResult<Option<StoredDocument>> {
        let file = self.resolve(path)?;
        match fs::read(&file).await {
            Ok(content) => {
                debug!(path, bytes = content.len(), "Read local document");
                Ok(Some(StoredDocument::new(content, None)))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(format!(
                "Failed to read {}: {}",
                file.display(),
                err
            ))),
        }
    }

    #[instrument(skip(self, content, _version, _message), fields(root = %self.root.display(), bytes = content.len()))]
    async fn put(
        &self,
        path: &str,
        content: &[u8],
        _version: Option<&str>,
        _message: &str,
    ) -> StoreResult<Option<String>> {
        let file = self.resolve(path)?;
        write_atomic(&file, content).await?;
        debug!(path, "Wrote local document");
        Ok(None)
    }

    async fn health_check(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            StoreError::Io(format!(
                "Data directory {} is not usable: {}",
                self.root.display(),
                e
            ))
        })?;

        let metadata = fs::metadata(&self.root).await?;
        if metadata.permissions().readonly() {
            return Err(StoreError::Io(format!(
                "Data directory {} is read-only",
                self.root.display()
            )));
        }
        Ok(())
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> StoreResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Configuration(format!("{} has no parent", path.display())))?;
    fs::create_dir_all(parent).await.map_err(|e| {
        StoreError::Io(format!("Failed to create {}: {}", parent.display(), e))
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".{}.tmp-{}", file_name, std::process::id()));

    if let Err(err) = write_and_sync(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::Io(format!(
            "Failed to write temp file for {}: {}",
            path.display(),
            err
        )));
    }

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::Io(format!(
            "Failed to replace {}: {}",
            path.display(),
            err
        )));
    }

    #[cfg(unix)]
    {
        if let Err(err) = sync_dir(parent).await {
            warn!(dir = %parent.display(), error = %err, "Data directory sync failed");
        }
    }

    Ok(())
}

async fn write_and_sync(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_document_is_none() {
        let dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::new(dir.path());
        assert!(backend.fetch("assets.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_fetch() {
        let dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::new(dir.path().join("data"));

        let version = backend.put("assets.json", b"[]", None, "Create").await.unwrap();
        assert!(version.is_none());

        let doc = backend.fetch("assets.json").await.unwrap().unwrap();
        assert_eq!(doc.content, b"[]".to_vec());
        assert!(doc.version.is_none());

        backend.put("assets.json", b"[1]", None, "Update").await.unwrap();
        let doc = backend.fetch("assets.json").await.unwrap().unwrap();
        assert_eq!(doc.content, b"[1]".to_vec());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::new(dir.path());
        backend.put("countries.json", b"[]", None, "Create").await.unwrap();

        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["countries.json".to_string()]);
    }

    #[test]
    fn test_resolve_rejects_escaping_paths() {
        let backend = LocalFileBackend::new("/srv/data");
        assert!(backend.resolve("../etc/passwd").is_err());
        assert!(backend.resolve("/etc/passwd").is_err());
        assert!(backend.resolve("").is_err());
        assert_eq!(
            backend.resolve("nested/assets.json").unwrap(),
            PathBuf::from("/srv/data/nested/assets.json")
        );
    }

    #[tokio::test]
    async fn test_health_check_creates_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("fresh");
        let backend = LocalFileBackend::new(&root);
        backend.health_check().await.unwrap();
        assert!(root.is_dir());
    }
}
