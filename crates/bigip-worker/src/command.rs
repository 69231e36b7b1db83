//! Typed load balancer commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The load balancer actions this worker performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Synchronize device configuration across environments.
    ConfigSync,
    /// Enable hosts in their pools.
    InRotation,
    /// Disable hosts in their pools.
    OutOfRotation,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::ConfigSync,
        Operation::InRotation,
        Operation::OutOfRotation,
    ];

    /// The subcommand name used in request parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ConfigSync => "ConfigSync",
            Operation::InRotation => "InRotation",
            Operation::OutOfRotation => "OutOfRotation",
        }
    }

    /// Look up an operation by its exact subcommand name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that passed validation.
///
/// Argument order is the caller's and is kept as-is all the way to the
/// device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedCommand {
    ConfigSync { envs: Vec<String> },
    InRotation { hosts: Vec<String> },
    OutOfRotation { hosts: Vec<String> },
}

impl ValidatedCommand {
    pub fn operation(&self) -> Operation {
        match self {
            ValidatedCommand::ConfigSync { .. } => Operation::ConfigSync,
            ValidatedCommand::InRotation { .. } => Operation::InRotation,
            ValidatedCommand::OutOfRotation { .. } => Operation::OutOfRotation,
        }
    }

    /// Environments for a sync, hosts for a rotation change.
    pub fn arguments(&self) -> &[String] {
        match self {
            ValidatedCommand::ConfigSync { envs } => envs,
            ValidatedCommand::InRotation { hosts } | ValidatedCommand::OutOfRotation { hosts } => {
                hosts
            }
        }
    }
}

/// Renders as `bigip:<Operation> a,b,c`, the form used in logs and
/// notifications.
impl fmt::Display for ValidatedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bigip:{} {}",
            self.operation(),
            self.arguments().join(",")
        )
    }
}
