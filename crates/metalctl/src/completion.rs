//! Shell completion.
//!
//! Static scripts come from `completion <shell>`. Dynamic candidates for
//! ids and sort keys are produced on demand when the shell calls back
//! with `COMPLETE=<shell> metalctl ...`; those providers read the
//! environment and config file only, never the half-typed command line.

use std::future::Future;

use clap::{Arg, ArgMatches, Command};
use clap_complete::Shell;
use clap_complete::engine::CompletionCandidate;
use tracing::debug;

use metalctl_core::EntityAdapter;

use crate::cli;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{EntityCmd, Filter};

/// `completion <shell>`
pub fn command() -> Command {
    Command::new("completion")
        .about("Generate a shell completion script")
        .long_about(
            "Generate a static completion script.\n\n\
             For completion of entity ids, source the dynamic script instead:\n  \
             source <(COMPLETE=bash metalctl)",
        )
        .arg(
            Arg::new("shell")
                .required(true)
                .value_parser(clap::value_parser!(Shell)),
        )
}

pub fn run(m: &ArgMatches) -> Result<(), CliError> {
    let shell = *m
        .get_one::<Shell>("shell")
        .ok_or_else(|| CliError::validation("shell", "is required"))?;
    clap_complete::generate(shell, &mut cli::command(), "metalctl", &mut std::io::stdout());
    Ok(())
}

/// Run a candidate lookup on a private runtime; failures yield nothing.
fn block_on<F, Fut>(lookup: F) -> Vec<CompletionCandidate>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<CompletionCandidate>, CliError>>,
{
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            debug!(%err, "no runtime for completion");
            return Vec::new();
        }
    };
    runtime.block_on(lookup()).unwrap_or_else(|err| {
        debug!(%err, "completion lookup failed");
        Vec::new()
    })
}

fn candidate(value: String, hint: Option<String>) -> CompletionCandidate {
    CompletionCandidate::new(value).help(hint.map(Into::into))
}

/// Ids of every entity of kind `E`, with a short description.
pub fn ids<E: EntityCmd>() -> Vec<CompletionCandidate> {
    block_on(|| async {
        let cfg = Config::from_env()?;
        let adapter = E::adapter(&cfg)?;
        let items = adapter.list(&Filter::<E>::default()).await?;
        Ok(items
            .iter()
            .map(|item| {
                candidate(
                    E::Adapter::id(item),
                    E::Adapter::completion_hint(item),
                )
            })
            .collect())
    })
}

/// Registered sort columns of `E`.
pub fn sort_keys<E: EntityCmd>() -> Vec<CompletionCandidate> {
    E::sorter()
        .available_keys()
        .into_iter()
        .map(|key| CompletionCandidate::new(key.to_owned()))
        .collect()
}

/// A fixed set of values, for enum-like flags.
pub fn fixed(values: &'static [&'static str]) -> impl Fn() -> Vec<CompletionCandidate> + Send + Sync {
    move || values.iter().map(|v| CompletionCandidate::new(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_values_are_offered_in_order() {
        let values: Vec<String> = fixed(&["ephemeral", "static"])()
            .iter()
            .map(|c| c.get_value().to_string_lossy().into_owned())
            .collect();
        assert_eq!(values, vec!["ephemeral", "static"]);
    }
}
