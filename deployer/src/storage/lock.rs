//! Exclusive lock over a deployment tree

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::errors::{DeployError, IoError, PreconditionError};
use crate::storage::layout::DeploymentTree;

/// Held for the duration of one operation; the lock file is removed on drop
#[derive(Debug)]
pub struct DeploymentLock {
    path: PathBuf,
}

impl DeploymentLock {
    /// Take the lock for `tree`, failing if another invocation holds it
    pub fn acquire(tree: &DeploymentTree) -> Result<Self, DeployError> {
        let path = tree.lock_path();
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(PreconditionError::Locked(path).into());
            }
            Err(source) => return Err(IoError::Create { path, source }.into()),
        };

        let stamp = format!("pid={}\nacquired_at={}\n", std::process::id(), Utc::now().to_rfc3339());
        if let Err(source) = file.write_all(stamp.as_bytes()) {
            let _ = std::fs::remove_file(&path);
            return Err(IoError::Write { path, source }.into());
        }

        debug!("Acquired deployment lock {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeploymentLock {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Released deployment lock {}", self.path.display()),
            Err(e) => warn!("Failed to remove lock file {}: {}", self.path.display(), e),
        }
    }
}
