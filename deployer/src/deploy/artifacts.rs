//! Artifact staging and promotion
//!
//! Every artifact of a deployment is rendered into a staging directory first.
//! The live tree is only touched once all renders have succeeded, at which
//! point staged files are renamed into place.

use std::path::PathBuf;

use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::spec::{ComponentKind, DeploymentSpec};
use crate::deploy::bundle::{TemplateBundle, ENV_TEMPLATE};
use crate::errors::{DeployError, IoError};
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::render::targets::append_all_targets;
use crate::render::{substitutions_for, RenderedDocument, Substitutions, Template};
use crate::storage::layout::{DeploymentTree, COMPOSE_DIR, CONFIGS_DIR, MUTABLE_SUBTREES, SCRIPTS_DIR};

/// One rendered artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Path relative to the tree root
    pub path: PathBuf,

    /// SHA-256 of the rendered bytes
    pub digest: String,
}

/// Rendered artifacts of one operation, in render order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    pub artifacts: Vec<Artifact>,
}

impl ArtifactReport {
    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.path == PathBuf::from(path))
    }
}

/// Renders staged into a scratch directory inside the tree root
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
    report: ArtifactReport,
}

impl Staging {
    /// Create an empty staging area under `tree`'s root
    ///
    /// Kept on the same filesystem as the live tree so promotion is a rename.
    pub async fn create(tree: &DeploymentTree) -> Result<Self, DeployError> {
        let dir = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(tree.root())
            .map_err(|source| IoError::Create {
                path: tree.root().to_path_buf(),
                source,
            })?;

        let staging = Self {
            dir,
            report: ArtifactReport::default(),
        };
        for name in MUTABLE_SUBTREES {
            staging.subdir(name).create().await?;
        }
        Ok(staging)
    }

    fn subdir(&self, name: &str) -> Dir {
        Dir::new(self.dir.path().join(name))
    }

    pub fn report(&self) -> &ArtifactReport {
        &self.report
    }

    /// Render every artifact for `spec` from `bundle`
    pub async fn render_all(
        &mut self,
        spec: &DeploymentSpec,
        bundle: &TemplateBundle,
        tree: &DeploymentTree,
    ) -> Result<(), DeployError> {
        let subs = substitutions_for(spec, tree.root());

        let env = Template::load(&bundle.env_template()).await?;
        self.write(COMPOSE_DIR, ENV_TEMPLATE, env.render(&subs)).await?;

        for component in spec.enabled() {
            self.render_component(component.kind, spec, bundle, &subs).await?;
        }

        bundle
            .scripts_dir()
            .copy_contents_into(&self.subdir(SCRIPTS_DIR))
            .await?;

        info!("Staged {} rendered artifact(s)", self.report.artifacts.len());
        Ok(())
    }

    async fn render_component(
        &mut self,
        kind: ComponentKind,
        spec: &DeploymentSpec,
        bundle: &TemplateBundle,
        subs: &Substitutions,
    ) -> Result<(), DeployError> {
        let file_name = format!("{}.yml", kind.info().file_stem);
        debug!("Rendering {}", kind);

        let compose = Template::load(&bundle.compose_template(kind)).await?;
        self.write(COMPOSE_DIR, &file_name, compose.render_structural(kind, subs)?)
            .await?;

        if let Some(template_file) = bundle.config_template(kind) {
            let config = Template::load(&template_file).await?.render(subs);
            let config = match kind {
                ComponentKind::Prometheus => {
                    RenderedDocument::new(append_all_targets(config.into_string(), spec))
                }
                _ => config,
            };
            self.write(CONFIGS_DIR, &file_name, config).await?;
        }

        Ok(())
    }

    async fn write(
        &mut self,
        subtree: &str,
        name: &str,
        doc: RenderedDocument,
    ) -> Result<(), DeployError> {
        let file: File = self.subdir(subtree).file(name);
        doc.write_to(&file).await?;
        self.report.artifacts.push(Artifact {
            path: PathBuf::from(subtree).join(name),
            digest: doc.digest(),
        });
        Ok(())
    }

    /// Move staged files into the live tree
    ///
    /// The staging directory itself is removed when `self` is dropped.
    pub async fn promote(self, tree: &DeploymentTree) -> Result<ArtifactReport, DeployError> {
        for name in MUTABLE_SUBTREES {
            self.subdir(name)
                .move_contents_into(&tree.root_dir().subdir(name))
                .await?;
        }
        info!("Promoted staged artifacts into {}", tree.root().display());
        Ok(self.report)
    }
}
