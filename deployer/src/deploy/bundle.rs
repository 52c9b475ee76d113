//! Template bundle provider
//!
//! A bundle is a directory shaped like the live tree's mutable subtrees:
//!
//! ```text
//! docker-compose/.env
//! docker-compose/<component>.yml
//! configs/<component>.yml      (components with a config only)
//! scripts/*
//! ```
//!
//! Bundles are fetched into scratch storage owned by the returned
//! [`TemplateBundle`]; the scratch copy is deleted when it is dropped.

use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::info;

use crate::config::spec::ComponentKind;
use crate::errors::{DeployError, IoError};
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::storage::layout::{COMPOSE_DIR, CONFIGS_DIR, SCRIPTS_DIR};

/// Name of the compose environment template
pub const ENV_TEMPLATE: &str = ".env";

/// Supplies the template bundle for one operation
#[async_trait]
pub trait BundleProvider: Send + Sync {
    async fn fetch(&self) -> Result<TemplateBundle, DeployError>;
}

/// A fetched bundle living in scratch storage
#[derive(Debug)]
pub struct TemplateBundle {
    root: Dir,
    _scratch: Option<TempDir>,
}

impl TemplateBundle {
    /// Use a directory in place, without scratch ownership
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Dir::new(root),
            _scratch: None,
        }
    }

    fn in_scratch(scratch: TempDir) -> Self {
        Self {
            root: Dir::new(scratch.path()),
            _scratch: Some(scratch),
        }
    }

    pub fn root(&self) -> &Dir {
        &self.root
    }

    pub fn compose_template(&self, kind: ComponentKind) -> File {
        self.root
            .subdir(COMPOSE_DIR)
            .file(&format!("{}.yml", kind.info().file_stem))
    }

    /// Config template, for kinds that have one
    pub fn config_template(&self, kind: ComponentKind) -> Option<File> {
        let info = kind.info();
        info.has_config.then(|| {
            self.root
                .subdir(CONFIGS_DIR)
                .file(&format!("{}.yml", info.file_stem))
        })
    }

    pub fn env_template(&self) -> File {
        self.root.subdir(COMPOSE_DIR).file(ENV_TEMPLATE)
    }

    pub fn scripts_dir(&self) -> Dir {
        self.root.subdir(SCRIPTS_DIR)
    }
}

/// Bundle read from a local directory
#[derive(Debug, Clone)]
pub struct LocalBundle {
    source: PathBuf,
}

impl LocalBundle {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl BundleProvider for LocalBundle {
    async fn fetch(&self) -> Result<TemplateBundle, DeployError> {
        let scratch = tempfile::Builder::new()
            .prefix("nms-bundle-")
            .tempdir()
            .map_err(|source| IoError::Create {
                path: std::env::temp_dir(),
                source,
            })?;

        info!("Fetching template bundle from {}", self.source.display());
        let bundle = TemplateBundle::in_scratch(scratch);
        Dir::new(&self.source)
            .copy_contents_into(bundle.root())
            .await?;
        Ok(bundle)
    }
}
