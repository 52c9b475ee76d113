//! Directory operations

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::IoError;
use crate::filesys::file::File;

/// A directory wrapper with path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the directory exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the directory (and parents)
    pub async fn create(&self) -> Result<(), IoError> {
        fs::create_dir_all(&self.path)
            .await
            .map_err(|source| IoError::Create {
                path: self.path.clone(),
                source,
            })
    }

    /// Delete the directory and all contents
    pub async fn delete(&self) -> Result<(), IoError> {
        if self.exists().await {
            fs::remove_dir_all(&self.path)
                .await
                .map_err(|source| IoError::Delete {
                    path: self.path.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// List every entry (files and directories) in the directory, sorted by name
    pub async fn list_entries(&self) -> Result<Vec<PathBuf>, IoError> {
        let read_err = |source| IoError::Read {
            path: self.path.clone(),
            source,
        };

        let mut entries = Vec::new();
        let mut reader = fs::read_dir(&self.path).await.map_err(read_err)?;
        while let Some(entry) = reader.next_entry().await.map_err(read_err)? {
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }

    /// Delete everything inside the directory, keeping the directory itself
    pub async fn clear_contents(&self) -> Result<(), IoError> {
        for entry in self.list_entries().await? {
            let is_dir = fs::symlink_metadata(&entry)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            let result = if is_dir {
                fs::remove_dir_all(&entry).await
            } else {
                fs::remove_file(&entry).await
            };
            result.map_err(|source| IoError::Delete {
                path: entry.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Recursively copy the contents of this directory into `dest`
    pub async fn copy_contents_into(&self, dest: &Dir) -> Result<(), IoError> {
        let mut pending = vec![(self.clone(), dest.clone())];

        while let Some((from, to)) = pending.pop() {
            to.create().await?;
            for entry in from.list_entries().await? {
                let Some(name) = entry.file_name() else {
                    continue;
                };
                let target = to.path.join(name);
                if fs::metadata(&entry).await.map(|m| m.is_dir()).unwrap_or(false) {
                    pending.push((Dir::new(&entry), Dir::new(target)));
                } else {
                    fs::copy(&entry, &target)
                        .await
                        .map_err(|source| IoError::Copy {
                            from: entry.clone(),
                            to: target.clone(),
                            source,
                        })?;
                }
            }
        }

        Ok(())
    }

    /// Move every entry of this directory into `dest` by rename
    ///
    /// Both directories must live on the same filesystem.
    pub async fn move_contents_into(&self, dest: &Dir) -> Result<(), IoError> {
        for entry in self.list_entries().await? {
            let Some(name) = entry.file_name() else {
                continue;
            };
            let target = dest.path.join(name);
            fs::rename(&entry, &target)
                .await
                .map_err(|source| IoError::Rename {
                    from: entry.clone(),
                    to: target.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Get a file within this directory
    pub fn file(&self, name: &str) -> File {
        File::new(self.path.join(name))
    }

    /// Get a subdirectory
    pub fn subdir(&self, name: &str) -> Dir {
        Dir::new(self.path.join(name))
    }
}
