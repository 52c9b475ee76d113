//! Stack orchestrator
//!
//! Sequences config resolution, rendering, the deployment tree and the
//! container runtime for the three stack operations. Preconditions are checked
//! before anything is mutated and checked again once the deployment lock is
//! held. Any later failure is fatal and leaves whatever partial state exists,
//! except that renders are staged so a render failure never reaches the live
//! tree.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::resolver::resolve_file;
use crate::config::spec::DeploymentSpec;
use crate::deploy::artifacts::{ArtifactReport, Staging};
use crate::deploy::bundle::BundleProvider;
use crate::deploy::confirm::Confirm;
use crate::deploy::fsm::{StackEvent, StackFsm, StackState};
use crate::errors::{DeployError, PreconditionError};
use crate::filesys::dir::Dir;
use crate::runtime::lifecycle::Lifecycle;
use crate::runtime::probe::RuntimeProbe;
use crate::storage::layout::DeploymentTree;
use crate::storage::lock::DeploymentLock;

/// A stack operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Install,
    Reconfigure,
    Uninstall,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Install => "install",
            Operation::Reconfigure => "reconfigure",
            Operation::Uninstall => "uninstall",
        };
        write!(f, "{name}")
    }
}

/// Result of a successful operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub operation: Operation,
    pub root: PathBuf,
    pub final_state: StackState,
    pub artifacts: ArtifactReport,
}

/// Drives install, reconfigure and uninstall against one deployment tree
pub struct StackOrchestrator<'a> {
    tree: DeploymentTree,
    probe: &'a dyn RuntimeProbe,
    lifecycle: &'a dyn Lifecycle,
    confirm: &'a dyn Confirm,
}

impl<'a> StackOrchestrator<'a> {
    pub fn new(
        tree: DeploymentTree,
        probe: &'a dyn RuntimeProbe,
        lifecycle: &'a dyn Lifecycle,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            tree,
            probe,
            lifecycle,
            confirm,
        }
    }

    pub fn tree(&self) -> &DeploymentTree {
        &self.tree
    }

    /// Fresh install: `Absent -> Installed`
    pub async fn install(
        &self,
        config_path: &Path,
        bundles: &dyn BundleProvider,
    ) -> Result<OperationOutcome, DeployError> {
        let mut fsm = StackFsm::new(StackState::Absent);
        self.check_absent().await?;

        let spec = resolve_file(config_path).await?;
        self.confirm_operation(Operation::Install, &spec)?;

        Dir::new(self.tree.parent()).create().await?;
        let _lock = DeploymentLock::acquire(&self.tree)?;
        self.check_absent().await?;

        let bundle = bundles.fetch().await?;
        self.tree.create().await?;

        let mut staging = Staging::create(&self.tree).await?;
        staging.render_all(&spec, &bundle, &self.tree).await?;
        let artifacts = staging.promote(&self.tree).await?;

        self.lifecycle.start_all(&self.tree).await?;
        let final_state = transition(&mut fsm, StackEvent::Install)?;

        info!("Stack installed at {}", self.tree.root.display());
        Ok(self.outcome(Operation::Install, final_state, artifacts))
    }

    /// Re-render a running stack from a new config: `Installed -> Installed`
    ///
    /// `data/` is never touched.
    pub async fn reconfigure(
        &self,
        config_path: &Path,
        bundles: &dyn BundleProvider,
    ) -> Result<OperationOutcome, DeployError> {
        let mut fsm = StackFsm::new(StackState::Installed);
        self.check_installed().await?;

        let spec = resolve_file(config_path).await?;
        self.confirm_operation(Operation::Reconfigure, &spec)?;

        let _lock = DeploymentLock::acquire(&self.tree)?;
        self.check_installed().await?;
        transition(&mut fsm, StackEvent::Reconfigure)?;

        let bundle = bundles.fetch().await?;
        let mut staging = Staging::create(&self.tree).await?;
        staging.render_all(&spec, &bundle, &self.tree).await?;

        self.tree.clear_mutable_subtrees().await?;
        let artifacts = staging.promote(&self.tree).await?;

        self.lifecycle.start_all(&self.tree).await?;
        let final_state = transition(&mut fsm, StackEvent::ReconfigureDone)?;

        info!("Stack reconfigured at {}", self.tree.root.display());
        Ok(self.outcome(Operation::Reconfigure, final_state, artifacts))
    }

    /// Stop every container and remove the tree: `Installed -> Uninstalled`
    pub async fn uninstall(&self) -> Result<OperationOutcome, DeployError> {
        let mut fsm = StackFsm::new(StackState::Installed);
        self.check_installed().await?;

        let prompt = format!(
            "Stop all containers and permanently delete {}?",
            self.tree.root.display()
        );
        if !self.confirm.confirm(&prompt) {
            return Err(DeployError::Cancelled);
        }

        let _lock = DeploymentLock::acquire(&self.tree)?;
        self.check_installed().await?;

        self.lifecycle.stop_all(&self.tree).await?;
        self.tree.remove().await?;
        let final_state = transition(&mut fsm, StackEvent::Uninstall)?;

        info!("Stack uninstalled from {}", self.tree.root.display());
        Ok(self.outcome(Operation::Uninstall, final_state, ArtifactReport::default()))
    }

    async fn check_absent(&self) -> Result<(), DeployError> {
        if self.tree.exists().await {
            return Err(PreconditionError::DeploymentExists(self.tree.root.clone()).into());
        }
        if self.probe.any_managed_container_running().await? {
            return Err(PreconditionError::ContainersRunning.into());
        }
        Ok(())
    }

    async fn check_installed(&self) -> Result<(), DeployError> {
        if !self.tree.is_valid_deployment().await {
            return Err(PreconditionError::InvalidDeployment(self.tree.root.clone()).into());
        }
        if !self.probe.any_managed_container_running().await? {
            return Err(PreconditionError::NoContainersRunning.into());
        }
        Ok(())
    }

    fn confirm_operation(&self, operation: Operation, spec: &DeploymentSpec) -> Result<(), DeployError> {
        let components: Vec<String> = spec.enabled().map(|c| c.kind.to_string()).collect();
        debug!(
            "{} for host {} with components [{}] and {} service target(s)",
            operation,
            spec.host_label,
            components.join(", "),
            spec.services.len()
        );

        let prompt = format!(
            "Proceed with {} of [{}] at {}?",
            operation,
            components.join(", "),
            self.tree.root.display()
        );
        if self.confirm.confirm(&prompt) {
            Ok(())
        } else {
            Err(DeployError::Cancelled)
        }
    }

    fn outcome(
        &self,
        operation: Operation,
        final_state: StackState,
        artifacts: ArtifactReport,
    ) -> OperationOutcome {
        OperationOutcome {
            operation,
            root: self.tree.root.clone(),
            final_state,
            artifacts,
        }
    }
}

fn transition(fsm: &mut StackFsm, event: StackEvent) -> Result<StackState, DeployError> {
    fsm.process(event).map_err(DeployError::Transition)
}
