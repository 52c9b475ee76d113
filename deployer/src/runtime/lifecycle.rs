//! Lifecycle script invocation

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::app::options::LifecycleOptions;
use crate::errors::ExternalToolError;
use crate::storage::layout::DeploymentTree;

/// Starts and stops every container of a deployment
#[async_trait]
pub trait Lifecycle: Send + Sync {
    async fn start_all(&self, tree: &DeploymentTree) -> Result<(), ExternalToolError>;

    async fn stop_all(&self, tree: &DeploymentTree) -> Result<(), ExternalToolError>;
}

/// Runs the script copied into the tree's `scripts/` directory
#[derive(Debug, Clone, Default)]
pub struct ScriptLifecycle {
    options: LifecycleOptions,
}

impl ScriptLifecycle {
    pub fn new(options: LifecycleOptions) -> Self {
        Self { options }
    }

    async fn invoke(&self, tree: &DeploymentTree, flag: &str) -> Result<(), ExternalToolError> {
        let script = tree.scripts_dir().file(&self.options.script_name);
        let tool = format!("{} {}", self.options.script_name, flag);
        info!("Running lifecycle script: {}", tool);

        let mut command = Command::new(&self.options.shell);
        command
            .arg(script.path())
            .arg(flag)
            .current_dir(tree.root());

        let output = crate::runtime::process::run_bounded(command, &tool, self.options.timeout).await?;
        debug!(
            "{} finished: {}",
            tool,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}

#[async_trait]
impl Lifecycle for ScriptLifecycle {
    async fn start_all(&self, tree: &DeploymentTree) -> Result<(), ExternalToolError> {
        self.invoke(tree, &self.options.start_flag).await
    }

    async fn stop_all(&self, tree: &DeploymentTree) -> Result<(), ExternalToolError> {
        self.invoke(tree, &self.options.stop_flag).await
    }
}
