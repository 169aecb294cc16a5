//! Root command and global flags.
//!
//! Global options are a clap derive struct; the entity trees below them
//! are assembled with the builder API by the command factory, so the
//! root is exposed as a `clap::Command` rather than a `Parser`.

use std::path::PathBuf;

use clap::{ArgMatches, Args, Command, FromArgMatches, ValueEnum};

use crate::commands;

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalOpts {
    /// Config file path (default: first of /etc/metalctl, ~/.metalctl, ./config.yaml)
    #[arg(long, env = "METALCTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Context to use instead of the current one
    #[arg(long, env = "METALCTL_CONTEXT", global = true)]
    pub context: Option<String>,

    /// metal-api URL (overrides config and context)
    #[arg(long, env = "METALCTL_API_URL", global = true)]
    pub api_url: Option<String>,

    /// API token (overrides context and kubeconfig)
    #[arg(long, env = "METALCTL_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// URL of the v2 API
    #[arg(long, env = "METALCTL_API_V2_URL", global = true)]
    pub api_v2_url: Option<String>,

    /// Token for the v2 API
    #[arg(long, env = "METALCTL_API_V2_TOKEN", global = true, hide_env_values = true)]
    pub api_v2_token: Option<String>,

    /// HMAC key for legacy service authentication
    #[arg(long, env = "METALCTL_HMAC", global = true, hide_env_values = true)]
    pub hmac: Option<String>,

    /// Path of the kubeconfig file holding OIDC tokens
    #[arg(long, env = "METALCTL_KUBECONFIG", global = true)]
    pub kubeconfig: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "METALCTL_OUTPUT_FORMAT", global = true)]
    pub output_format: Option<OutputFormat>,

    /// Template for `-o template`, e.g. '{{ .id }} {{ .name }}'
    #[arg(long, env = "METALCTL_TEMPLATE", global = true)]
    pub template: Option<String>,

    /// Omit table headers
    #[arg(long, env = "METALCTL_NO_HEADERS", global = true)]
    pub no_headers: bool,

    /// Verbose logging and full error chains
    #[arg(long, env = "METALCTL_DEBUG", global = true)]
    pub debug: bool,

    /// Skip confirmation prompts
    #[arg(long, env = "METALCTL_FORCE", global = true)]
    pub force: bool,

    /// Force colored output on or off
    #[arg(
        long,
        env = "METALCTL_FORCE_COLOR",
        global = true,
        num_args = 0..=1,
        default_missing_value = "true",
        require_equals = true
    )]
    pub force_color: Option<bool>,
}

impl GlobalOpts {
    /// Options as seen without any flags: environment only.
    ///
    /// Used where no command line is parsed, e.g. dynamic completion.
    pub fn from_env() -> Self {
        Self::augment_args(Command::new("metalctl"))
            .try_get_matches_from(["metalctl"])
            .ok()
            .and_then(|m| Self::from_arg_matches(&m).ok())
            .unwrap_or_default()
    }
}

// ── Output Format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Table with additional columns
    Wide,
    /// GitHub-flavored Markdown table
    Markdown,
    /// JSON
    Json,
    /// YAML
    Yaml,
    /// One line per element rendered from --template
    Template,
}

impl OutputFormat {
    pub fn parse_config(raw: &str) -> Option<Self> {
        Self::from_str(raw, true).ok()
    }
}

// ── Root ─────────────────────────────────────────────────────────────

pub fn command() -> Command {
    let root = Command::new("metalctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage metal-stack bare-metal infrastructure")
        .long_about(
            "metalctl talks to the metal-api of a metal-stack installation.\n\n\
             Entities are listed, described, created, updated, deleted and\n\
             applied from multi-document YAML with one uniform set of verbs.",
        )
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true);

    GlobalOpts::augment_args(root).subcommands(commands::subcommands())
}

/// Split parsed matches into the global options and the rest.
pub fn parse(matches: &ArgMatches) -> Result<GlobalOpts, clap::Error> {
    GlobalOpts::from_arg_matches(matches)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn force_color_accepts_bare_and_explicit_values() {
        let m = command()
            .try_get_matches_from(["metalctl", "--force-color", "version"])
            .unwrap();
        assert_eq!(parse(&m).unwrap().force_color, Some(true));

        let m = command()
            .try_get_matches_from(["metalctl", "--force-color=false", "version"])
            .unwrap();
        assert_eq!(parse(&m).unwrap().force_color, Some(false));
    }

    #[test]
    fn output_format_from_config_is_case_insensitive() {
        assert_eq!(OutputFormat::parse_config("YAML"), Some(OutputFormat::Yaml));
        assert_eq!(OutputFormat::parse_config("nope"), None);
    }
}
