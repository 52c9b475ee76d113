//! Error types for the deployment manager

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error returned by every stack operation
#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    External(#[from] ExternalToolError),

    #[error("Operation cancelled by the operator")]
    Cancelled,

    #[error("Invalid stack transition: {0}")]
    Transition(String),
}

impl DeployError {
    /// Whether the error was raised before anything was mutated
    pub fn is_side_effect_free(&self) -> bool {
        matches!(
            self,
            DeployError::Precondition(_) | DeployError::Config(_) | DeployError::Cancelled
        )
    }
}

/// Errors raised while resolving the JSON configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed configuration JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    #[error("Invalid configuration field {path}: {reason}")]
    InvalidField { path: String, reason: String },

    #[error("Component '{0}' is listed more than once in stack_config")]
    DuplicateComponent(String),
}

/// Errors raised while rendering templates into artifacts
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template {template} is missing required placeholder {placeholder}")]
    MissingPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("Unable to write rendered artifact: {0}")]
    WriteFailure(#[source] IoError),
}

/// Filesystem errors, each tagged with the path involved
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Unable to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to move {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Checked before any mutation; the operation aborts cleanly
#[derive(Error, Debug)]
pub enum PreconditionError {
    #[error("Managed containers are already running; uninstall the existing stack first")]
    ContainersRunning,

    #[error("No managed container is running; nothing to reconfigure or uninstall")]
    NoContainersRunning,

    #[error("A deployment already exists at {0}")]
    DeploymentExists(PathBuf),

    #[error("{0} is not a valid deployment tree")]
    InvalidDeployment(PathBuf),

    #[error("Another operation holds the deployment lock {0}")]
    Locked(PathBuf),
}

/// Failures of the container runtime or the lifecycle script
#[derive(Error, Debug)]
pub enum ExternalToolError {
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool} exited with status {code:?}: {stderr}")]
    Exit {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} did not finish within {after:?}")]
    Timeout { tool: String, after: Duration },
}
