//! Local-filesystem media adapter.
//!
//! Listing images are stored under a single upload root and referenced by
//! relative path. The only operation the engine needs is removal during
//! listing deletion; uploads are handled by the separate media service.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use medina_core::contracts::MediaStore;
use medina_core::CoreError;

/// Default upload root, relative to the working directory.
const DEFAULT_UPLOAD_DIR: &str = "uploads";

pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Build the store from the `UPLOAD_DIR` environment variable.
    pub fn from_env() -> Self {
        let root = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.into());
        Self::new(root)
    }

    /// Resolve a stored relative path against the upload root, rejecting
    /// absolute paths and any traversal components.
    fn resolve(&self, path: &str) -> Result<PathBuf, CoreError> {
        let relative = Path::new(path);
        let traversal = relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if traversal {
            return Err(CoreError::Validation(format!(
                "invalid media path '{path}'"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn remove(&self, path: &str) -> Result<(), CoreError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            // Already gone is success for cleanup purposes.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CoreError::Dependency(format!(
                "failed to remove {}: {err}",
                full.display()
            ))),
        }
    }
}
