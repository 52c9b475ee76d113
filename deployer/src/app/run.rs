//! Entry point wiring the orchestrator to its real collaborators

use std::path::PathBuf;

use tracing::info;

use crate::app::options::OrchestratorOptions;
use crate::deploy::bundle::LocalBundle;
use crate::deploy::confirm::Confirm;
use crate::deploy::orchestrator::{OperationOutcome, StackOrchestrator};
use crate::errors::DeployError;
use crate::runtime::lifecycle::ScriptLifecycle;
use crate::runtime::probe::DockerProbe;
use crate::storage::layout::DeploymentTree;

/// What the operator asked for
#[derive(Debug, Clone)]
pub enum Request {
    Install { config: PathBuf, bundle: PathBuf },
    Reconfigure { config: PathBuf, bundle: PathBuf },
    Uninstall,
}

/// Run one stack operation against the deployment rooted at `root`
pub async fn run(
    root: PathBuf,
    request: Request,
    options: &OrchestratorOptions,
    confirm: &dyn Confirm,
) -> Result<OperationOutcome, DeployError> {
    let probe = DockerProbe::new(options.probe.clone());
    let lifecycle = ScriptLifecycle::new(options.lifecycle.clone());
    let orchestrator = StackOrchestrator::new(DeploymentTree::new(root), &probe, &lifecycle, confirm);

    info!("Running {:?} at {}", request, orchestrator.tree().root().display());
    match request {
        Request::Install { config, bundle } => {
            orchestrator.install(&config, &LocalBundle::new(bundle)).await
        }
        Request::Reconfigure { config, bundle } => {
            orchestrator.reconfigure(&config, &LocalBundle::new(bundle)).await
        }
        Request::Uninstall => orchestrator.uninstall().await,
    }
}
