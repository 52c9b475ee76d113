//! Container runtime probe

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::app::options::ProbeOptions;
use crate::config::spec::ComponentKind;
use crate::errors::ExternalToolError;
use crate::runtime::process::run_bounded;

/// Answers whether any managed container is currently running
#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    async fn any_managed_container_running(&self) -> Result<bool, ExternalToolError>;
}

/// Probe backed by the docker CLI
#[derive(Debug, Clone, Default)]
pub struct DockerProbe {
    options: ProbeOptions,
}

impl DockerProbe {
    pub fn new(options: ProbeOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl RuntimeProbe for DockerProbe {
    async fn any_managed_container_running(&self) -> Result<bool, ExternalToolError> {
        let mut command = Command::new(&self.options.runtime_binary);
        command.args(["ps", "--format", "{{.Names}}"]);

        let tool = format!("{} ps", self.options.runtime_binary);
        let output = run_bounded(command, &tool, self.options.timeout).await?;
        let listing = String::from_utf8_lossy(&output.stdout);

        let running = any_managed(&listing);
        debug!("Managed containers running: {}", running);
        Ok(running)
    }
}

/// Whether a `ps` name listing contains a managed container, by exact name
pub fn any_managed(listing: &str) -> bool {
    let managed = ComponentKind::container_names();
    listing
        .lines()
        .map(str::trim)
        .any(|name| managed.iter().any(|m| *m == name))
}
