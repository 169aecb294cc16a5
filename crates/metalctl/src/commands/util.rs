//! Shared helpers for command handlers.

use std::collections::BTreeMap;
use std::process::Command;

use tracing::debug;

use crate::error::CliError;

/// Ask a yes/no question on the terminal, defaulting to no.
pub fn confirm(message: &str) -> Result<bool, CliError> {
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Run an external program with inherited stdio and wait for it.
pub fn spawn(program: &str, args: &[String]) -> Result<(), CliError> {
    debug!(program, ?args, "spawning");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| CliError::Exec {
            program: program.to_owned(),
            reason: e.to_string(),
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(CliError::Exec {
            program: program.to_owned(),
            reason: format!("exited with {status}"),
        })
    }
}

/// Parse `key=value` pairs; a bare `key` maps to an empty value.
pub fn parse_labels<'a>(
    raw: impl IntoIterator<Item = &'a String>,
) -> Result<BTreeMap<String, String>, CliError> {
    raw.into_iter()
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair.as_str(), ""));
            if key.is_empty() {
                return Err(CliError::validation("labels", format!("'{pair}' has no key")));
            }
            Ok((key.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Strings of a multi-valued argument, empty when absent or undefined.
pub fn many(m: &clap::ArgMatches, name: &str) -> Vec<String> {
    m.try_get_many::<String>(name)
        .ok()
        .flatten()
        .map(|v| v.cloned().collect())
        .unwrap_or_default()
}

/// A single optional string argument.
pub fn one(m: &clap::ArgMatches, name: &str) -> Option<String> {
    m.try_get_one::<String>(name).ok().flatten().cloned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn labels_parse_with_and_without_values() {
        let raw = vec!["a=1".to_owned(), "b".to_owned(), "c=x=y".to_owned()];
        let labels = parse_labels(&raw).unwrap();
        assert_eq!(labels["a"], "1");
        assert_eq!(labels["b"], "");
        assert_eq!(labels["c"], "x=y");
    }

    #[test]
    fn labels_need_a_key() {
        let raw = vec!["=1".to_owned()];
        assert!(parse_labels(&raw).is_err());
    }
}
