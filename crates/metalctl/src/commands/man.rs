//! Hidden `metalctl man <dir>`: write one man page per command.

use std::path::{Path, PathBuf};

use clap::{Arg, ArgMatches, Command};

use crate::cli;
use crate::error::CliError;

pub fn command() -> Command {
    Command::new("man")
        .about("Generate man pages")
        .hide(true)
        .arg(
            Arg::new("dir")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Output directory"),
        )
}

pub fn run(m: &ArgMatches) -> Result<(), CliError> {
    let dir = m
        .get_one::<PathBuf>("dir")
        .ok_or_else(|| CliError::validation("dir", "is required"))?;
    std::fs::create_dir_all(dir)?;
    let written = generate(&cli::command(), dir)?;
    eprintln!("wrote {written} man pages to {}", dir.display());
    Ok(())
}

/// Render `cmd` and its visible subcommands as `<parent>-<name>.1`.
fn generate(cmd: &Command, dir: &Path) -> Result<usize, CliError> {
    let name = cmd.get_name().to_owned();
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buf)?;
    std::fs::write(dir.join(format!("{name}.1")), buf)?;

    let mut written = 1;
    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let sub = sub.clone().name(format!("{name}-{}", sub.get_name()));
        written += generate(&sub, dir)?;
    }
    Ok(written)
}
