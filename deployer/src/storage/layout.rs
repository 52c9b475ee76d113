//! On-disk deployment tree

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::spec::ComponentKind;
use crate::errors::IoError;
use crate::filesys::dir::Dir;

/// Basename suffix identifying a managed deployment root
pub const MANAGED_SUFFIX: &str = "nms";

pub const COMPOSE_DIR: &str = "docker-compose";
pub const CONFIGS_DIR: &str = "configs";
pub const DATA_DIR: &str = "data";
pub const SCRIPTS_DIR: &str = "scripts";

/// Subtrees rewritten on every reconfigure; `data/` is never among them
pub const MUTABLE_SUBTREES: [&str; 3] = [COMPOSE_DIR, CONFIGS_DIR, SCRIPTS_DIR];

/// The fixed layout rooted at the install directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTree {
    /// Install root
    pub root: PathBuf,
}

impl DeploymentTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn root_dir(&self) -> Dir {
        Dir::new(&self.root)
    }

    /// Compose files and their `.env`
    pub fn compose_dir(&self) -> Dir {
        Dir::new(self.root.join(COMPOSE_DIR))
    }

    /// Rendered component configs, including `prometheus.yml`
    pub fn configs_dir(&self) -> Dir {
        Dir::new(self.root.join(CONFIGS_DIR))
    }

    pub fn data_dir(&self) -> Dir {
        Dir::new(self.root.join(DATA_DIR))
    }

    pub fn scripts_dir(&self) -> Dir {
        Dir::new(self.root.join(SCRIPTS_DIR))
    }

    /// Persistent data directories of components that keep state
    pub fn component_data_dirs(&self) -> Vec<Dir> {
        ComponentKind::ALL
            .iter()
            .filter_map(|kind| kind.info().data_subdir)
            .map(|sub| self.data_dir().subdir(sub))
            .collect()
    }

    /// Path of the lock file guarding this tree
    ///
    /// Lives next to the root, outside the tree that uninstall removes.
    pub fn lock_path(&self) -> PathBuf {
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| MANAGED_SUFFIX.to_string());
        self.parent().join(format!(".{name}.lock"))
    }

    /// Directory containing the root
    pub fn parent(&self) -> PathBuf {
        match self.root.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Create the fixed directory set
    ///
    /// A failure part way leaves the directories created so far in place.
    pub async fn create(&self) -> Result<(), IoError> {
        info!("Creating deployment tree at {}", self.root.display());
        self.compose_dir().create().await?;
        self.configs_dir().create().await?;
        self.data_dir().create().await?;
        for dir in self.component_data_dirs() {
            dir.create().await?;
        }
        self.scripts_dir().create().await?;
        Ok(())
    }

    /// Whether a managed deployment appears to live at the root
    ///
    /// This is the naming convention check used before install: the root
    /// must be a directory whose basename ends with the managed suffix.
    pub async fn exists(&self) -> bool {
        let named = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(MANAGED_SUFFIX))
            .unwrap_or(false);
        named && self.root_dir().exists().await
    }

    /// Whether every fixed subdirectory is present
    pub async fn is_valid_deployment(&self) -> bool {
        for dir in [
            self.compose_dir(),
            self.configs_dir(),
            self.data_dir(),
            self.scripts_dir(),
        ] {
            if !dir.exists().await {
                debug!("Deployment tree is missing {}", dir.path().display());
                return false;
            }
        }
        true
    }

    /// Empty the compose, configs and scripts directories in place
    ///
    /// `data/` is never touched. A failure part way is not rolled back.
    pub async fn clear_mutable_subtrees(&self) -> Result<(), IoError> {
        for name in MUTABLE_SUBTREES {
            let dir = self.root_dir().subdir(name);
            debug!("Clearing {}", dir.path().display());
            dir.clear_contents().await?;
        }
        Ok(())
    }

    /// Recursively delete the whole tree
    pub async fn remove(&self) -> Result<(), IoError> {
        info!("Removing deployment tree at {}", self.root.display());
        self.root_dir().delete().await
    }
}
