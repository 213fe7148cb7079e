// Local filesystem storage rooted at the upload directory

use async_trait::async_trait;
use std::io::{Error, ErrorKind};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::FileStore;

#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a stored relative path onto the root, refusing anything that
    /// could escape it.
    fn resolve(&self, path: &str) -> std::io::Result<PathBuf> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("invalid storage path: {path:?}"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, key: &str, data: &[u8]) -> std::io::Result<String> {
        if key.contains('/') || key.contains('\\') {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("storage key must not contain separators: {key:?}"),
            ));
        }
        let target = self.resolve(key)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&target, data).await?;
        debug!(path = %target.display(), bytes = data.len(), "Stored upload");
        Ok(key.to_string())
    }

    async fn delete(&self, path: &str) -> std::io::Result<bool> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        let target = self.resolve(path)?;
        fs::read(&target).await
    }
}
