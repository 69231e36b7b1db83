//! The BigIP device command surface.
//!
//! The device-control tool takes a flag-style argument vector:
//!
//! ```text
//! bigip [-v]... state [-e <host>...] [-d <host>...]
//! bigip [-v]... sync  [-e <env>...]
//! bigip [-v]... show  <host>...
//! ```
//!
//! [`DeviceArgs`] is that grammar. [`execute_vector`] parses a vector and
//! calls the matching [`DeviceExecutor`] entry point.

use crate::error::ExecutionFault;
use async_trait::async_trait;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;

/// Parsed device argument vector.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "bigip", no_binary_name = true, disable_help_subcommand = true)]
pub struct DeviceArgs {
    /// Verbosity, repeatable.
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: DeviceCommand,
}

/// Device entry points.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Enable and/or disable nodes.
    State {
        #[arg(short = 'e', value_name = "host", num_args = 1..)]
        enabled_hosts: Vec<String>,

        #[arg(short = 'd', value_name = "host", num_args = 1..)]
        disabled_hosts: Vec<String>,
    },
    /// Synchronize configuration for environments.
    Sync {
        #[arg(short = 'e', value_name = "envs", num_args = 1..)]
        environments: Vec<String>,
    },
    /// Show node status.
    Show {
        #[arg(value_name = "host", required = true, num_args = 1..)]
        hosts: Vec<String>,
    },
}

impl DeviceArgs {
    /// Parse an argument vector (no program name).
    pub fn parse_vector(argv: &[String]) -> Result<Self, ExecutionFault> {
        Self::try_parse_from(argv).map_err(|e| {
            let rendered = e.to_string();
            let summary = rendered.lines().next().unwrap_or_default().trim();
            ExecutionFault::BadArguments(format!("{} [{}]", summary, argv.join(" ")))
        })
    }
}

/// Output captured from a device call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceOutput {
    pub stdout: String,
}

/// The device-control library: one method per entry point.
#[async_trait]
pub trait DeviceExecutor: Send + Sync {
    /// Synchronize configuration for the given environments.
    async fn sync(&self, environments: &[String]) -> Result<DeviceOutput, ExecutionFault>;

    /// Enable and disable nodes.
    async fn state(
        &self,
        enabled_hosts: &[String],
        disabled_hosts: &[String],
    ) -> Result<DeviceOutput, ExecutionFault>;

    /// Report node status.
    async fn show(&self, hosts: &[String]) -> Result<DeviceOutput, ExecutionFault>;
}

/// Parse `argv` and invoke the entry point it names.
pub async fn execute_vector(
    executor: &dyn DeviceExecutor,
    argv: &[String],
) -> Result<DeviceOutput, ExecutionFault> {
    let args = DeviceArgs::parse_vector(argv)?;
    debug!(argv = ?argv, verbose = args.verbose, "Invoking device entry point");

    match &args.command {
        DeviceCommand::State {
            enabled_hosts,
            disabled_hosts,
        } => executor.state(enabled_hosts, disabled_hosts).await,
        DeviceCommand::Sync { environments } => executor.sync(environments).await,
        DeviceCommand::Show { hosts } => executor.show(hosts).await,
    }
}
