//! Orchestrator configuration options

use std::time::Duration;

/// Options for one orchestrator run
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    /// Lifecycle script invocation
    pub lifecycle: LifecycleOptions,

    /// Container runtime probing
    pub probe: ProbeOptions,
}

/// Lifecycle script options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Script name inside the tree's `scripts/` directory
    pub script_name: String,

    /// Interpreter the script is run with
    pub shell: String,

    /// Flag that starts (or restarts) every container
    pub start_flag: String,

    /// Flag that stops every container
    pub stop_flag: String,

    /// Upper bound on one script invocation
    pub timeout: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            script_name: "nms-lifecycle.sh".to_string(),
            shell: "sh".to_string(),
            start_flag: "--start-all".to_string(),
            stop_flag: "--stop-all".to_string(),
            timeout: Duration::from_secs(600), // 10 minutes, image pulls included
        }
    }
}

/// Container runtime probe options
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Runtime CLI binary
    pub runtime_binary: String,

    /// Upper bound on one probe
    pub timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            runtime_binary: "docker".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}
