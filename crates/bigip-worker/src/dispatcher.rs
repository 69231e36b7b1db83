//! Routes validated commands to device entry points.

use crate::command::ValidatedCommand;
use crate::device::{execute_vector, DeviceExecutor, DeviceOutput};
use crate::error::ExecutionFault;
use crate::translator::translate;
use std::sync::Arc;
use tracing::debug;

/// What was sent to the device and what it said back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub argv: Vec<String>,
    pub output: DeviceOutput,
}

/// Dispatches commands to a [`DeviceExecutor`].
#[derive(Clone)]
pub struct Dispatcher {
    executor: Arc<dyn DeviceExecutor>,
}

impl Dispatcher {
    pub fn new(executor: Arc<dyn DeviceExecutor>) -> Self {
        Self { executor }
    }

    /// Execute a command. Executor faults are returned unchanged.
    ///
    /// The vector goes through the device command surface, which routes
    /// `sync` and `state` (enable or disable) to the executor.
    pub async fn dispatch(
        &self,
        command: &ValidatedCommand,
    ) -> Result<ExecutionReport, ExecutionFault> {
        let argv = translate(command);
        debug!(operation = %command.operation(), argv = ?argv, "Dispatching device command");

        let output = execute_vector(self.executor.as_ref(), &argv).await?;
        Ok(ExecutionReport { argv, output })
    }
}
