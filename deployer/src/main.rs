//! nmsdeploy - Entry Point
//!
//! Installs, reconfigures and removes the NMS observability stack on the
//! local host.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use nmsdeploy::app::options::OrchestratorOptions;
use nmsdeploy::app::run::{run, Request};
use nmsdeploy::deploy::confirm::{AssumeYes, Confirm, StdinPrompt};
use nmsdeploy::deploy::{Operation, OperationOutcome};
use nmsdeploy::logs::{init_logging, LogLevel, LogOptions};
use nmsdeploy::utils::LONG_VERSION;

#[derive(Parser, Debug)]
#[command(name = "nmsdeploy", version, long_version = LONG_VERSION)]
#[command(about = "Deploy the NMS observability stack")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Deployment root
    #[arg(long, global = true, env = "NMS_INSTALL_DIR", default_value = "/opt/nms")]
    dir: PathBuf,

    /// Do not ask for confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    #[arg(long, global = true, env = "NMS_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Container runtime CLI used to probe running containers
    #[arg(long, global = true, env = "NMS_RUNTIME", default_value = "docker")]
    runtime: String,

    /// Seconds the lifecycle script may run
    #[arg(long, global = true, value_name = "SECS", default_value_t = 600)]
    script_timeout: u64,

    /// Seconds a runtime probe may run
    #[arg(long, global = true, value_name = "SECS", default_value_t = 30)]
    probe_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the deployment tree and start the stack
    Install(SourceArgs),

    /// Re-render every artifact from a new config and restart the stack
    Reconfigure(SourceArgs),

    /// Stop the stack and delete the deployment tree
    Uninstall,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// JSON stack configuration
    #[arg(short, long, env = "NMS_CONFIG")]
    config: PathBuf,

    /// Template bundle directory
    #[arg(short, long, env = "NMS_BUNDLE_DIR")]
    bundle: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_options = LogOptions {
        log_level: cli.log_level,
        json_format: cli.json_logs,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }
    debug!("nmsdeploy {}", LONG_VERSION);

    match execute(cli).await {
        Ok(outcome) => {
            println!("{} {}", "[SUCCESS]".green().bold(), summary(&outcome));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> anyhow::Result<OperationOutcome> {
    let root = std::path::absolute(&cli.dir)
        .with_context(|| format!("Unable to resolve install directory {}", cli.dir.display()))?;

    let mut options = OrchestratorOptions::default();
    options.lifecycle.timeout = Duration::from_secs(cli.script_timeout);
    options.probe.timeout = Duration::from_secs(cli.probe_timeout);
    options.probe.runtime_binary = cli.runtime;

    let request = match cli.command {
        Command::Install(args) => Request::Install {
            config: args.config,
            bundle: args.bundle,
        },
        Command::Reconfigure(args) => Request::Reconfigure {
            config: args.config,
            bundle: args.bundle,
        },
        Command::Uninstall => Request::Uninstall,
    };

    let confirm: &dyn Confirm = if cli.yes { &AssumeYes } else { &StdinPrompt };
    let outcome = run(root, request, &options, confirm).await?;
    Ok(outcome)
}

fn summary(outcome: &OperationOutcome) -> String {
    let root = outcome.root.display();
    match outcome.operation {
        Operation::Install => format!(
            "NMS stack installed at {root} ({} artifact(s))",
            outcome.artifacts.artifacts.len()
        ),
        Operation::Reconfigure => format!(
            "NMS stack reconfigured at {root} ({} artifact(s))",
            outcome.artifacts.artifacts.len()
        ),
        Operation::Uninstall => format!("NMS stack removed from {root}"),
    }
}
