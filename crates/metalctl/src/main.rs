mod cli;
mod commands;
mod completion;
mod config;
mod error;
mod generic;
mod output;

use clap_complete::CompleteEnv;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use crate::config::Config;
use crate::error::CliError;

fn main() {
    // answers `COMPLETE=<shell> metalctl ...` callbacks and exits
    CompleteEnv::with_factory(cli::command).complete();

    let matches = cli::command().get_matches();
    let opts = match cli::parse(&matches) {
        Ok(opts) => opts,
        Err(err) => err.exit(),
    };
    let mut debug = opts.debug;
    let filter = init_tracing(debug);

    if let Err(err) = run(opts, &matches, &filter, &mut debug) {
        if debug {
            eprintln!("{:?}", miette::Report::new(err));
        } else {
            eprintln!("Error: {err}");
        }
        std::process::exit(1);
    }
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Logs go to stderr; the filter can be raised once the config file is read.
fn init_tracing(debug: bool) -> FilterHandle {
    let level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
    handle
}

fn run(
    opts: cli::GlobalOpts,
    matches: &clap::ArgMatches,
    filter: &FilterHandle,
    debug: &mut bool,
) -> Result<(), CliError> {
    let Some((name, sub)) = matches.subcommand() else {
        return Ok(());
    };
    if commands::is_offline(name) {
        return commands::dispatch_offline(name, sub);
    }

    let cfg = Config::new(opts)?;
    if cfg.debug() && !*debug {
        *debug = true;
        if std::env::var_os("RUST_LOG").is_none() {
            if let Err(err) = filter.reload(EnvFilter::new("debug")) {
                tracing::warn!(%err, "cannot raise log level");
            }
        }
    }
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(commands::dispatch(&cfg, name, sub))
}
