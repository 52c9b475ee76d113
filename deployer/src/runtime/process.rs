//! Bounded subprocess execution

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::errors::ExternalToolError;

/// Run `command` to completion within `timeout`
///
/// The child is killed if the deadline passes. A non-zero exit status is
/// reported as [`ExternalToolError::Exit`] carrying the captured stderr.
pub async fn run_bounded(
    mut command: Command,
    tool: &str,
    timeout: Duration,
) -> Result<Output, ExternalToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {} (timeout {:?})", tool, timeout);
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(ExternalToolError::Spawn {
                tool: tool.to_string(),
                source,
            })
        }
        Err(_) => {
            return Err(ExternalToolError::Timeout {
                tool: tool.to_string(),
                after: timeout,
            })
        }
    };

    if !output.status.success() {
        return Err(ExternalToolError::Exit {
            tool: tool.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
