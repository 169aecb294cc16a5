//! Command registry: every top-level subcommand and its handler.

pub mod audit;
pub mod auth;
pub mod context;
pub mod filesystemlayout;
pub mod image;
pub mod machine;
pub mod man;
pub mod network;
pub mod partition;
pub mod project;
pub mod size;
pub mod switch;
pub mod system;
pub mod tenant;
pub mod update;
pub mod util;

use clap::{ArgMatches, Command};
use tracing::debug;

use crate::completion;
use crate::config::Config;
use crate::error::CliError;

/// Top-level subcommands in help order.
pub fn subcommands() -> Vec<Command> {
    vec![
        machine::command(),
        machine::firewall_command(),
        image::command(),
        size::command(),
        filesystemlayout::command(),
        partition::command(),
        switch::command(),
        network::command(),
        project::command(),
        tenant::command(),
        audit::command(),
        system::firmware_command(),
        system::health_command(),
        system::version_command(),
        system::vpn_command(),
        auth::login_command(),
        auth::logout_command(),
        auth::whoami_command(),
        context::command(),
        update::command(),
        completion::command(),
        man::command(),
    ]
}

/// Commands that run without loading the config file.
pub fn is_offline(name: &str) -> bool {
    matches!(name, "completion" | "man")
}

/// Run the offline commands.
pub fn dispatch_offline(name: &str, m: &ArgMatches) -> Result<(), CliError> {
    match name {
        "completion" => completion::run(m),
        "man" => man::run(m),
        other => Err(CliError::validation("command", format!("unknown command '{other}'"))),
    }
}

/// Run the subcommand `name` with its matches.
pub async fn dispatch(cfg: &Config, name: &str, m: &ArgMatches) -> Result<(), CliError> {
    debug!(command = name, "dispatching command");
    match name {
        "machine" => machine::run(cfg, m).await,
        "firewall" => machine::run_firewall(cfg, m).await,
        "image" => image::run(cfg, m).await,
        "size" => size::run(cfg, m).await,
        "filesystemlayout" => filesystemlayout::run(cfg, m).await,
        "partition" => partition::run(cfg, m).await,
        "switch" => switch::run(cfg, m).await,
        "network" => network::run(cfg, m).await,
        "project" => project::run(cfg, m).await,
        "tenant" => tenant::run(cfg, m).await,
        "audit" => audit::run(cfg, m).await,
        "firmware" => system::run_firmware(cfg, m).await,
        "health" => system::run_health(cfg).await,
        "version" => system::run_version(cfg).await,
        "vpn" => system::run_vpn(cfg, m).await,
        "login" => auth::run_login(cfg, m),
        "logout" => auth::run_logout(cfg),
        "whoami" => auth::run_whoami(cfg),
        "context" => context::run(cfg, m),
        "update" => update::run(cfg, m).await,
        other => dispatch_offline(other, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subcommand_name_is_unique() {
        let mut names: Vec<String> = subcommands()
            .iter()
            .map(|c| c.get_name().to_owned())
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
