//! # Directory Endpoint Store
//!
//! Backup store laid out on a filesystem (typically a mounted backup volume).
//!
//! ```text
//! <root>/
//! └── <container>/
//!     ├── .tags                     # one `key=value` per line
//!     └── queues/request-queue-url  # object contents
//! ```

use crate::domain::StoreError;
use crate::ports::EndpointStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// File holding a container's tags.
pub const TAGS_FILE: &str = ".tags";

/// [`EndpointStore`] over a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryEndpointStore {
    root: PathBuf,
}

impl DirectoryEndpointStore {
    /// Store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn io_error(path: &Path, err: std::io::Error) -> StoreError {
        StoreError::Io(format!("{}: {}", path.display(), err))
    }

    /// Reject keys that would escape the container.
    fn object_path(&self, container: &str, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        (contained && !key.is_empty()).then(|| self.root.join(container).join(relative))
    }

    fn has_tag(contents: &str, key: &str, value: &str) -> bool {
        contents
            .lines()
            .filter_map(|line| line.split_once('='))
            .any(|(k, v)| k.trim() == key && v.trim() == value)
    }
}

#[async_trait]
impl EndpointStore for DirectoryEndpointStore {
    async fn find_container_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| Self::io_error(&self.root, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_error(&self.root, e))?
        {
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        for name in names {
            let tags_path = self.root.join(&name).join(TAGS_FILE);
            match tokio::fs::read_to_string(&tags_path).await {
                Ok(contents) if Self::has_tag(&contents, key, value) => {
                    debug!(container = %name, key, value, "[pr-02] Found tagged backup container");
                    return Ok(Some(name));
                }
                Ok(_) => {}
                // Untagged containers are skipped.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(Self::io_error(&tags_path, e)),
            }
        }

        Ok(None)
    }

    async fn read_object(&self, container: &str, key: &str) -> Result<String, StoreError> {
        let not_found = || StoreError::ObjectNotFound {
            container: container.to_string(),
            key: key.to_string(),
        };
        let path = self.object_path(container, key).ok_or_else(not_found)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }
}
