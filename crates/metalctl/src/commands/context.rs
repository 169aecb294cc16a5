//! `metalctl context`: manage the named API endpoints of the config file.

use std::io::IsTerminal;

use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::engine::{ArgValueCandidates, CompletionCandidate};
use dialoguer::Select;
use serde::Serialize;

use metalctl_config::{ConfigFile, Context};

use crate::commands::util::one;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{confirm_or_force, required};
use crate::output::{Style, TableRow};

/// One configured context as listed.
#[derive(Debug, Clone, Serialize)]
pub struct ContextEntry {
    pub name: String,
    pub current: bool,
    #[serde(flatten)]
    pub context: Context,
}

impl TableRow for ContextEntry {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["", "NAME", "API URL", "API V2 URL"];
        if wide {
            header.extend(["ISSUER", "CLIENT ID", "AUTH"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let (marker, name) = if self.current {
            ("*".to_owned(), style.bold(&self.name))
        } else {
            (String::new(), self.name.clone())
        };
        let mut row = vec![
            marker,
            name,
            self.context.url.clone(),
            self.context.api_v2_url.clone().unwrap_or_default(),
        ];
        if wide {
            let auth = if self.context.api_token.is_some() {
                "token"
            } else if self.context.has_oidc() {
                "oidc"
            } else if self.context.hmac.is_some() {
                "hmac"
            } else {
                ""
            };
            row.extend([
                self.context.oidc_issuer_url.clone().unwrap_or_default(),
                self.context.client_id.clone().unwrap_or_default(),
                auth.to_owned(),
            ]);
        }
        row
    }
}

pub fn entries(file: &ConfigFile) -> Vec<ContextEntry> {
    file.contexts
        .iter()
        .map(|(name, context)| ContextEntry {
            name: name.clone(),
            current: *name == file.current,
            context: context.clone(),
        })
        .collect()
}

fn context_names() -> Vec<CompletionCandidate> {
    Config::from_env()
        .map(|cfg| {
            cfg.loaded()
                .file
                .contexts
                .iter()
                .map(|(name, ctx)| CompletionCandidate::new(name).help(Some(ctx.url.clone().into())))
                .collect()
        })
        .unwrap_or_default()
}

fn name_arg() -> Arg {
    Arg::new("name")
        .value_name("NAME")
        .add(ArgValueCandidates::new(context_names))
}

pub fn command() -> Command {
    Command::new("context")
        .visible_alias("ctx")
        .about("Manage API contexts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .visible_alias("ls")
                .about("List the configured contexts"),
        )
        .subcommand(
            Command::new("set")
                .visible_alias("switch")
                .about("Switch the current context, '-' for the previous one")
                .arg(name_arg().help("Context to activate, chosen interactively when omitted")),
        )
        .subcommand(Command::new("short").about("Print the name of the current context"))
        .subcommand(
            Command::new("remove")
                .visible_alias("rm")
                .about("Remove a context")
                .arg(name_arg().required(true).help("Context to remove")),
        )
        .subcommand(
            Command::new("add")
                .about("Add a context")
                .arg(Arg::new("name").required(true).help("Name of the new context"))
                .arg(Arg::new("url").long("url").required(true).help("metal-api URL"))
                .arg(Arg::new("v2-url").long("v2-url").help("v2 API URL"))
                .arg(Arg::new("issuer-url").long("issuer-url").help("OIDC issuer URL"))
                .arg(Arg::new("client-id").long("client-id").help("OIDC client id"))
                .arg(
                    Arg::new("client-secret")
                        .long("client-secret")
                        .help("OIDC client secret"),
                )
                .arg(Arg::new("hmac-key").long("hmac-key").help("HMAC key"))
                .arg(
                    Arg::new("hmac-auth-type")
                        .long("hmac-auth-type")
                        .help("HMAC auth type, e.g. Metal-Admin"),
                )
                .arg(Arg::new("token").long("token").help("Static API token"))
                .arg(Arg::new("v2-token").long("v2-token").help("Static v2 API token"))
                .arg(
                    Arg::new("activate")
                        .long("activate")
                        .action(ArgAction::SetTrue)
                        .help("Make the new context the current one"),
                ),
        )
}

pub fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let mut loaded = cfg.loaded().clone();
    match m.subcommand() {
        Some(("list", _)) => cfg.printer().print(&entries(&loaded.file)),
        Some(("short", _)) => {
            println!("{}", cfg.context_name().unwrap_or_default());
            Ok(())
        }
        Some(("set", sub)) => {
            let name = match one(sub, "name") {
                Some(name) => name,
                None => pick(&loaded.file)?,
            };
            loaded.file.set_current(&name)?;
            let path = loaded.save()?;
            eprintln!(
                "switched to context {} ({})",
                loaded.file.current,
                path.display()
            );
            Ok(())
        }
        Some(("remove", sub)) => {
            let name = required(sub, "name")?;
            confirm_or_force(cfg, &format!("remove context {name}?"))?;
            loaded.file.remove_context(name)?;
            loaded.save()?;
            eprintln!("removed context {name}");
            Ok(())
        }
        Some(("add", sub)) => {
            let name = required(sub, "name")?;
            let context = Context {
                url: required(sub, "url")?.to_owned(),
                api_v2_url: one(sub, "v2-url"),
                oidc_issuer_url: one(sub, "issuer-url"),
                client_id: one(sub, "client-id"),
                client_secret: one(sub, "client-secret"),
                hmac: one(sub, "hmac-key"),
                hmac_auth_type: one(sub, "hmac-auth-type"),
                api_token: one(sub, "token"),
                api_v2_token: one(sub, "v2-token"),
            };
            loaded
                .file
                .add_context(name, context, sub.get_flag("activate"))?;
            let path = loaded.save()?;
            eprintln!("added context {name} to {}", path.display());
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Interactive choice among the configured contexts, current one preselected.
fn pick(file: &ConfigFile) -> Result<String, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::validation("name", "is required when not on a terminal"));
    }
    let names: Vec<&String> = file.contexts.keys().collect();
    if names.is_empty() {
        return Err(metalctl_config::ConfigError::NoContext.into());
    }
    let current = names.iter().position(|n| **n == file.current).unwrap_or(0);
    let choice = Select::new()
        .with_prompt("Context")
        .items(&names)
        .default(current)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(names[choice].clone())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn current_context_is_marked() {
        let mut file = ConfigFile::default();
        for name in ["prod", "dev"] {
            file.add_context(
                name,
                Context {
                    url: format!("https://{name}"),
                    ..Context::default()
                },
                false,
            )
            .unwrap();
        }
        let listed = entries(&file);
        let names: Vec<&str> = listed.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["dev", "prod"]);
        let current: Vec<bool> = listed.iter().map(|e| e.current).collect();
        assert_eq!(current, vec![false, true]);
        assert_eq!(listed[1].row(false, &Style::plain())[0], "*");
    }

    #[test]
    fn add_flags_stay_apart_from_global_credentials() {
        let m = crate::cli::command()
            .try_get_matches_from([
                "metalctl",
                "--api-token",
                "run-token",
                "context",
                "add",
                "prod",
                "--url",
                "https://prod",
                "--token",
                "stored-token",
                "--v2-url",
                "https://v2.prod",
                "--v2-token",
                "stored-v2",
                "--hmac-key",
                "secret",
            ])
            .unwrap();
        assert_eq!(
            crate::cli::parse(&m).unwrap().api_token.as_deref(),
            Some("run-token")
        );
        let (_, ctx) = m.subcommand().unwrap();
        let (_, add) = ctx.subcommand().unwrap();
        assert_eq!(one(add, "token").as_deref(), Some("stored-token"));
        assert_eq!(one(add, "v2-url").as_deref(), Some("https://v2.prod"));
        assert_eq!(one(add, "v2-token").as_deref(), Some("stored-v2"));
        assert_eq!(one(add, "hmac-key").as_deref(), Some("secret"));
    }

    #[test]
    fn add_requires_a_url() {
        assert!(
            command()
                .try_get_matches_from(["context", "add", "prod"])
                .is_err()
        );
    }
}
