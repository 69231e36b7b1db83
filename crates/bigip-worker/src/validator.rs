//! Input validation for incoming command messages.
//!
//! The sender guarantees nothing about the message body, so every key is
//! checked for presence and shape before a [`ValidatedCommand`] is built.

use crate::command::{Operation, ValidatedCommand};
use crate::error::InvalidCommand;
use serde_json::{Map, Value};

/// Parameter key naming the requested operation.
pub const SUBCOMMAND_KEY: &str = "subcommand";
/// Parameter key holding environments for `ConfigSync`.
pub const ENVS_KEY: &str = "envs";
/// Parameter key holding hosts for the rotation operations.
pub const HOSTS_KEY: &str = "hosts";

/// Pull the `parameters` object out of a message body.
pub fn extract_parameters(body: &Value) -> Result<&Map<String, Value>, InvalidCommand> {
    body.get("parameters")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            InvalidCommand::new(
                "Parameters dictionary not passed to BigipWorker. Nothing to do!",
            )
        })
}

/// Validate a parameter bundle and build the typed command.
pub fn validate(params: &Map<String, Value>) -> Result<ValidatedCommand, InvalidCommand> {
    let operation = params
        .get(SUBCOMMAND_KEY)
        .and_then(Value::as_str)
        .and_then(Operation::from_name)
        .ok_or_else(|| {
            InvalidCommand::new(format!(
                "Invalid subcommand: {}",
                describe(params.get(SUBCOMMAND_KEY))
            ))
        })?;

    match operation {
        Operation::ConfigSync => {
            let envs = params.get(ENVS_KEY).ok_or_else(|| {
                InvalidCommand::new(
                    "bigip:ConfigSync requires an array of environments to sync, \
                     but no \"envs\" parameter was provided",
                )
            })?;
            let envs = string_list(operation, ENVS_KEY, envs)?;
            Ok(ValidatedCommand::ConfigSync { envs })
        }
        Operation::InRotation | Operation::OutOfRotation => {
            let hosts = params.get(HOSTS_KEY).ok_or_else(|| {
                InvalidCommand::new(format!(
                    "bigip:{} requires a \"hosts\" parameter but none was provided.",
                    operation
                ))
            })?;
            let hosts = string_list(operation, HOSTS_KEY, hosts)?;
            if operation == Operation::InRotation {
                Ok(ValidatedCommand::InRotation { hosts })
            } else {
                Ok(ValidatedCommand::OutOfRotation { hosts })
            }
        }
    }
}

/// Validate a whole message body: `parameters` first, then its contents.
pub fn validate_body(body: &Value) -> Result<ValidatedCommand, InvalidCommand> {
    validate(extract_parameters(body)?)
}

fn string_list(operation: Operation, key: &str, value: &Value) -> Result<Vec<String>, InvalidCommand> {
    let items = value.as_array().ok_or_else(|| {
        InvalidCommand::new(format!(
            "bigip:{} expects \"{}\" to be an array of strings, got {}",
            operation,
            key,
            describe(Some(value))
        ))
    })?;

    if items.is_empty() {
        return Err(InvalidCommand::new(format!(
            "bigip:{} requires at least one entry in \"{}\"",
            operation, key
        )));
    }

    items
        .iter()
        .map(|item| {
            let entry = item.as_str().ok_or_else(|| {
                InvalidCommand::new(format!(
                    "bigip:{} expects \"{}\" to contain only strings, got {}",
                    operation, key, item
                ))
            })?;
            // The device surface would read these as flags.
            if entry.starts_with('-') {
                return Err(InvalidCommand::new(format!(
                    "bigip:{} rejects \"{}\" in \"{}\": entries must not start with '-'",
                    operation, entry, key
                )));
            }
            Ok(entry.to_string())
        })
        .collect()
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "<missing>".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
