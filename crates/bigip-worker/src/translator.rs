//! Builds device argument vectors from validated commands.

use crate::command::ValidatedCommand;

/// Subcommand of the device surface that changes node state.
pub const STATE: &str = "state";
/// Subcommand of the device surface that syncs configuration.
pub const SYNC: &str = "sync";
/// Flag that enables hosts (for `state`) or selects environments (for `sync`).
pub const ENABLE_FLAG: &str = "-e";
/// Flag that disables hosts.
pub const DISABLE_FLAG: &str = "-d";

/// Translate a command into the argument vector for the device surface.
///
/// - `ConfigSync`    -> `sync -e <env>...`
/// - `InRotation`    -> `state -e <host>...`
/// - `OutOfRotation` -> `state -d <host>...`
pub fn translate(command: &ValidatedCommand) -> Vec<String> {
    let (subcommand, flag, values) = match command {
        ValidatedCommand::ConfigSync { envs } => (SYNC, ENABLE_FLAG, envs),
        ValidatedCommand::InRotation { hosts } => (STATE, ENABLE_FLAG, hosts),
        ValidatedCommand::OutOfRotation { hosts } => (STATE, DISABLE_FLAG, hosts),
    };

    let mut argv = Vec::with_capacity(2 + values.len());
    argv.push(subcommand.to_string());
    argv.push(flag.to_string());
    argv.extend(values.iter().cloned());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_sync_vector() {
        let cmd = ValidatedCommand::ConfigSync {
            envs: strings(&["qa"]),
        };
        assert_eq!(translate(&cmd), strings(&["sync", "-e", "qa"]));
    }

    #[test]
    fn in_rotation_vector() {
        let cmd = ValidatedCommand::InRotation {
            hosts: strings(&["host1"]),
        };
        assert_eq!(translate(&cmd), strings(&["state", "-e", "host1"]));
    }

    #[test]
    fn out_of_rotation_vector() {
        let cmd = ValidatedCommand::OutOfRotation {
            hosts: strings(&["host1"]),
        };
        assert_eq!(translate(&cmd), strings(&["state", "-d", "host1"]));
    }

    #[test]
    fn order_and_duplicates_are_preserved() {
        let cmd = ValidatedCommand::InRotation {
            hosts: strings(&["web2", "web1", "web2"]),
        };
        assert_eq!(
            translate(&cmd),
            strings(&["state", "-e", "web2", "web1", "web2"])
        );
    }
}
