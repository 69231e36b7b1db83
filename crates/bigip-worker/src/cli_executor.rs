//! Device executor backed by the `bigip` command-line tool.

use crate::device::{DeviceExecutor, DeviceOutput};
use crate::error::ExecutionFault;
use crate::translator::{DISABLE_FLAG, ENABLE_FLAG, STATE, SYNC};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Subcommand of the device surface that reports node status.
const SHOW: &str = "show";

/// Runs the device-control program once per entry point call.
#[derive(Debug, Clone)]
pub struct CliExecutor {
    program: String,
    timeout: Duration,
}

impl CliExecutor {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, args: &[String]) -> Result<DeviceOutput, ExecutionFault> {
        let command_repr = format!("{} {}", self.program, args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd.env("NO_COLOR", "1");

        debug!(command = %command_repr, "Running device command");

        let output = match timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                warn!(command = %command_repr, "Device command timed out");
                return Err(ExecutionFault::Timeout {
                    command: command_repr,
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExecutionFault::NotInstalled {
                    program: self.program.clone(),
                });
            }
            Ok(Err(err)) => return Err(ExecutionFault::Spawn(err)),
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            return Ok(DeviceOutput { stdout });
        }

        let exit_code = output.status.code();
        Err(ExecutionFault::CommandFailed {
            command: command_repr,
            message: non_empty(
                &stderr,
                &stdout,
                &format!("exited with code {:?}", exit_code),
            ),
            exit_code,
        })
    }
}

#[async_trait]
impl DeviceExecutor for CliExecutor {
    async fn sync(&self, environments: &[String]) -> Result<DeviceOutput, ExecutionFault> {
        let mut args = vec![SYNC.to_string(), ENABLE_FLAG.to_string()];
        args.extend(environments.iter().cloned());
        self.run(&args).await
    }

    async fn state(
        &self,
        enabled_hosts: &[String],
        disabled_hosts: &[String],
    ) -> Result<DeviceOutput, ExecutionFault> {
        let mut args = vec![STATE.to_string()];
        if !enabled_hosts.is_empty() {
            args.push(ENABLE_FLAG.to_string());
            args.extend(enabled_hosts.iter().cloned());
        }
        if !disabled_hosts.is_empty() {
            args.push(DISABLE_FLAG.to_string());
            args.extend(disabled_hosts.iter().cloned());
        }
        self.run(&args).await
    }

    async fn show(&self, hosts: &[String]) -> Result<DeviceOutput, ExecutionFault> {
        let mut args = vec![SHOW.to_string()];
        args.extend(hosts.iter().cloned());
        self.run(&args).await
    }
}

fn non_empty(primary: &str, secondary: &str, fallback: &str) -> String {
    if !primary.trim().is_empty() {
        primary.to_string()
    } else if !secondary.trim().is_empty() {
        secondary.to_string()
    } else {
        fallback.to_string()
    }
}
