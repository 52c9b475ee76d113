//! File operations

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::IoError;

/// A file wrapper with path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
}

impl File {
    /// Create a new file reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the file exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Read file contents as string
    pub async fn read_string(&self) -> Result<String, IoError> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|source| IoError::Read {
                path: self.path.clone(),
                source,
            })
    }

    /// Write string to file
    pub async fn write_string(&self, contents: &str) -> Result<(), IoError> {
        let write_err = |source| IoError::Write {
            path: self.path.clone(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let mut file = fs::File::create(&self.path).await.map_err(write_err)?;
        file.write_all(contents.as_bytes()).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        Ok(())
    }
}
