//! Generic entity command factory.
//!
//! One [`EntityCmd`] impl per entity yields the standard verbs `list`,
//! `describe`, `create`, `update`, `delete`, `apply` and `edit`. Verbs
//! whose operations the adapter does not support are never registered.
//! Entity modules add their own subcommands on top and fall back to
//! [`run`] for the standard ones.

use std::io::IsTerminal;
use std::marker::PhantomData;

use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;
use tracing::debug;

use metalctl_core::adapter::Operation;
use metalctl_core::edit::launch_editor;
use metalctl_core::{
    ApplyHooks, ApplyOptions, ApplyOutcome, BulkReader, CoreError, EntityAdapter, Sorter, apply,
    ops,
};

use crate::commands::util;
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::output::{Printer, TableRow};

pub type Resp<E> = <<E as EntityCmd>::Adapter as EntityAdapter>::Response;
pub type Filter<E> = <<E as EntityCmd>::Adapter as EntityAdapter>::Filter;
pub type CreateReq<E> = <<E as EntityCmd>::Adapter as EntityAdapter>::CreateRequest;
pub type UpdateReq<E> = <<E as EntityCmd>::Adapter as EntityAdapter>::UpdateRequest;

// ── Declarative config ───────────────────────────────────────────────

/// A standard verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Describe,
    Create,
    Update,
    Delete,
    Apply,
    Edit,
}

impl Verb {
    pub const ALL: &'static [Self] = &[
        Self::List,
        Self::Describe,
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::Apply,
        Self::Edit,
    ];

    /// Adapter operations the verb needs.
    fn requires(self) -> &'static [Operation] {
        match self {
            Self::List => &[Operation::List],
            Self::Describe => &[Operation::Get],
            Self::Create => &[Operation::Create],
            Self::Update => &[Operation::Update],
            Self::Delete => &[Operation::Delete],
            Self::Apply => &[Operation::Create, Operation::Update],
            Self::Edit => &[Operation::Get, Operation::Update],
        }
    }
}

/// Names, help text and verb selection for one entity command tree.
#[derive(Debug, Clone, Default)]
pub struct CmdsConfig {
    /// Singular noun, also the command name.
    pub name: &'static str,
    pub plural: &'static str,
    pub aliases: &'static [&'static str],
    pub about: &'static str,
    pub long_about: Option<&'static str>,
    /// Verbs left out even though the adapter supports them.
    pub exclude: &'static [Verb],
    pub create_aliases: &'static [&'static str],
    pub delete_aliases: &'static [&'static str],
}

// ── Entity hooks ─────────────────────────────────────────────────────

/// Per-entity wiring of an adapter into the standard verbs.
///
/// Only `config`, `adapter` and `sorter` are required; the rest are flag
/// and builder hooks with empty defaults.
#[allow(async_fn_in_trait)]
pub trait EntityCmd: 'static {
    type Adapter: EntityAdapter<Response: TableRow>;

    fn config() -> CmdsConfig;

    fn adapter(cfg: &Config) -> Result<Self::Adapter, CliError>;

    fn sorter() -> Sorter<Resp<Self>>;

    /// Filter flags for `list`.
    fn list_args(cmd: Command) -> Command {
        cmd
    }

    fn filter(_m: &ArgMatches) -> Result<Filter<Self>, CliError> {
        Ok(Filter::<Self>::default())
    }

    /// Render the sorted list; tree or summary views override this.
    fn print_list(printer: &Printer, items: &[Resp<Self>]) -> Result<(), CliError> {
        printer.print(items)
    }

    /// Flags that build a create request without a file.
    fn create_args(cmd: Command) -> Command {
        cmd
    }

    /// `None` when no create flag was given.
    fn create_from_cli(_m: &ArgMatches) -> Result<Option<CreateReq<Self>>, CliError> {
        Ok(None)
    }

    fn update_args(cmd: Command) -> Command {
        cmd
    }

    /// Build an update for `id` from flags. May fetch the current state first.
    async fn update_from_cli(
        _adapter: &Self::Adapter,
        _id: &str,
        _m: &ArgMatches,
    ) -> Result<Option<UpdateReq<Self>>, CliError> {
        Ok(None)
    }

    fn delete_args(cmd: Command) -> Command {
        cmd
    }

    /// Adjust the adapter for `delete`, e.g. forced deletion.
    fn delete_adapter(adapter: Self::Adapter, _m: &ArgMatches) -> Self::Adapter {
        adapter
    }
}

// ── Command construction ─────────────────────────────────────────────

fn enabled<E: EntityCmd>(cfg: &CmdsConfig, verb: Verb) -> bool {
    !cfg.exclude.contains(&verb) && verb.requires().iter().all(|op| E::Adapter::supports(*op))
}

pub fn id_arg<E: EntityCmd>(help: &'static str) -> Arg {
    Arg::new("id")
        .help(help)
        .value_name("ID")
        .add(ArgValueCandidates::new(completion::ids::<E>))
}

fn file_arg(required: bool) -> Arg {
    Arg::new("file")
        .long("file")
        .short('f')
        .value_name("PATH")
        .required(required)
        .help("Multi-document YAML file to read, '-' for stdin")
}

fn bulk_output_arg() -> Arg {
    Arg::new("bulk-output")
        .long("bulk-output")
        .action(ArgAction::SetTrue)
        .help("Print all results as one list at the end instead of one by one")
}

/// The entity's command with every supported standard verb.
pub fn command<E: EntityCmd>() -> Command {
    let cfg = E::config();
    let mut cmd = Command::new(cfg.name)
        .about(cfg.about)
        .visible_aliases(cfg.aliases)
        .subcommand_required(true)
        .arg_required_else_help(true);
    if let Some(long) = cfg.long_about {
        cmd = cmd.long_about(long);
    }

    for verb in Verb::ALL.iter().copied().filter(|v| enabled::<E>(&cfg, *v)) {
        cmd = cmd.subcommand(verb_command::<E>(&cfg, verb));
    }
    cmd
}

fn verb_command<E: EntityCmd>(cfg: &CmdsConfig, verb: Verb) -> Command {
    let (name, plural) = (cfg.name, cfg.plural);
    match verb {
        Verb::List => E::list_args(
            Command::new("list")
                .visible_alias("ls")
                .about(format!("List {plural}"))
                .arg(
                    Arg::new("sort-by")
                        .long("sort-by")
                        .value_name("COLUMN[:asc|:desc]")
                        .action(ArgAction::Append)
                        .value_delimiter(',')
                        .help("Sort columns, later keys break ties")
                        .add(ArgValueCandidates::new(completion::sort_keys::<E>)),
                ),
        ),
        Verb::Describe => Command::new("describe")
            .visible_alias("get")
            .about(format!("Describe a {name}"))
            .arg(id_arg::<E>("Id to describe").required(true)),
        Verb::Create => E::create_args(
            Command::new("create")
                .visible_aliases(cfg.create_aliases)
                .about(format!("Create {plural} from flags or a file"))
                .arg(file_arg(false))
                .arg(bulk_output_arg()),
        ),
        Verb::Update => E::update_args(
            Command::new("update")
                .about(format!("Update {plural} from flags or a file"))
                .arg(id_arg::<E>("Id to update"))
                .arg(file_arg(false))
                .arg(bulk_output_arg()),
        ),
        Verb::Delete => E::delete_args(
            Command::new("delete")
                .visible_aliases(["destroy", "rm", "remove"])
                .visible_aliases(cfg.delete_aliases)
                .about(format!("Delete a {name}, or every {name} named in a file"))
                .arg(id_arg::<E>("Id to delete"))
                .arg(file_arg(false))
                .arg(bulk_output_arg()),
        ),
        Verb::Apply => Command::new("apply")
            .about(format!("Create or update {plural} from a file"))
            .arg(file_arg(true))
            .arg(bulk_output_arg())
            .arg(
                Arg::new("fail-fast")
                    .long("fail-fast")
                    .action(ArgAction::SetTrue)
                    .help("Stop at the first document that fails"),
            ),
        Verb::Edit => Command::new("edit")
            .about(format!("Edit a {name} in $EDITOR"))
            .arg(id_arg::<E>("Id to edit").required(true)),
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────

/// Run one of the standard verbs.
pub async fn run<E: EntityCmd>(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let Some((verb, sub)) = m.subcommand() else {
        return Err(CliError::validation("command", "missing subcommand"));
    };
    debug!(entity = E::config().name, verb, "running generic command");
    match verb {
        "list" => list::<E>(cfg, sub).await,
        "describe" => describe::<E>(cfg, sub).await,
        "create" => create::<E>(cfg, sub).await,
        "update" => update::<E>(cfg, sub).await,
        "delete" => delete::<E>(cfg, sub).await,
        "apply" => apply_file::<E>(cfg, sub).await,
        "edit" => edit::<E>(cfg, sub).await,
        other => Err(CliError::validation(
            "command",
            format!("unknown subcommand '{other}'"),
        )),
    }
}

pub fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str, CliError> {
    m.try_get_one::<String>(name)
        .ok()
        .flatten()
        .map(String::as_str)
        .ok_or_else(|| CliError::validation(name, "is required"))
}

/// Fetch, filter and sort; shared by `list` and entity summaries.
pub async fn fetch_sorted<E: EntityCmd>(
    cfg: &Config,
    m: &ArgMatches,
) -> Result<Vec<Resp<E>>, CliError> {
    let adapter = E::adapter(cfg)?;
    let mut items = adapter.list(&E::filter(m)?).await?;
    let keys = util::many(m, "sort-by");
    E::sorter().sort_by_args(&mut items, &keys)?;
    Ok(items)
}

async fn list<E: EntityCmd>(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let items = fetch_sorted::<E>(cfg, m).await?;
    E::print_list(&cfg.printer(), &items)
}

async fn describe<E: EntityCmd>(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let adapter = E::adapter(cfg)?;
    let item = adapter.get(required(m, "id")?).await?;
    cfg.describe_printer().print_one(&item)
}

/// Print results of a file-driven or single operation.
fn print_results<E: EntityCmd>(
    cfg: &Config,
    m: &ArgMatches,
    items: &[Resp<E>],
) -> Result<(), CliError> {
    if m.get_flag("bulk-output") {
        return cfg.printer().print(items);
    }
    let printer = cfg.describe_printer();
    items.iter().try_for_each(|item| printer.print_one(item))
}

async fn create<E: EntityCmd>(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let adapter = E::adapter(cfg)?;
    let created = if let Some(file) = m.get_one::<String>("file") {
        ops::create_all(&adapter, &BulkReader::from_arg(file)).await?
    } else {
        let Some(req) = E::create_from_cli(m)? else {
            return Err(CliError::validation(
                "file",
                "pass --file or the create flags",
            ));
        };
        vec![adapter.create(&req).await?]
    };
    print_results::<E>(cfg, m, &created)
}

async fn update<E: EntityCmd>(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let adapter = E::adapter(cfg)?;
    let updated = if let Some(file) = m.get_one::<String>("file") {
        ops::update_all(&adapter, &BulkReader::from_arg(file)).await?
    } else {
        let id = required(m, "id")?;
        let Some(req) = E::update_from_cli(&adapter, id, m).await? else {
            return Err(CliError::validation(
                "file",
                "pass --file or at least one update flag",
            ));
        };
        vec![adapter.update(&req).await?]
    };
    print_results::<E>(cfg, m, &updated)
}

async fn delete<E: EntityCmd>(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let name = E::config().name;
    let adapter = E::delete_adapter(E::adapter(cfg)?, m);
    let deleted = if let Some(file) = m.get_one::<String>("file") {
        let reader = BulkReader::from_arg(file);
        let ids = reader.ids(<E::Adapter as EntityAdapter>::ID_FIELDS)?;
        confirm_or_force(cfg, &format!("delete {} {name}(s): {}?", ids.len(), ids.join(", ")))?;
        ops::delete_all(&adapter, &reader).await?
    } else {
        let id = required(m, "id")?;
        confirm_or_force(cfg, &format!("delete {name} {id}?"))?;
        vec![adapter.delete(id).await?]
    };
    print_results::<E>(cfg, m, &deleted)
}

/// Ask before a destructive action unless `--force` is set.
pub fn confirm_or_force(cfg: &Config, prompt: &str) -> Result<(), CliError> {
    if cfg.force() {
        return Ok(());
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresForce {
            action: prompt.trim_end_matches('?').to_owned(),
        });
    }
    if util::confirm(prompt)? {
        Ok(())
    } else {
        Err(CliError::Aborted)
    }
}

async fn apply_file<E: EntityCmd>(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let adapter = E::adapter(cfg)?;
    let reader = BulkReader::from_arg(required(m, "file")?);
    let options = ApplyOptions {
        fail_fast: m.get_flag("fail-fast"),
    };
    let bulk = m.get_flag("bulk-output");
    let printer = cfg.describe_printer();
    let mut progress = ApplyProgress::<E::Adapter> {
        cfg,
        printer: (!bulk).then_some(&printer),
        error: None,
        adapter: PhantomData,
    };

    let report = apply(&adapter, &reader, options, &mut progress).await?;
    if let Some(err) = progress.error {
        return Err(err);
    }
    if bulk {
        let responses: Vec<_> = report.responses().cloned().collect();
        cfg.printer().print(&responses)?;
    }

    let failed = report.failed();
    if failed > 0 {
        return Err(CliError::ApplyFailed {
            failed,
            total: report.outcomes.len(),
        });
    }
    Ok(())
}

/// Confirms updates of existing entities, reports every document's
/// outcome on stderr and, unless bulk output was requested, prints each
/// resulting entity as it arrives.
struct ApplyProgress<'a, A> {
    cfg: &'a Config,
    printer: Option<&'a Printer>,
    error: Option<CliError>,
    adapter: PhantomData<fn() -> A>,
}

impl<A> ApplyHooks<A::Response> for ApplyProgress<'_, A>
where
    A: EntityAdapter<Response: TableRow>,
{
    fn before_update(&mut self, _index: usize, id: &str) -> Result<bool, CoreError> {
        match confirm_or_force(self.cfg, &format!("update existing {} {id}?", A::KIND)) {
            Ok(()) => Ok(true),
            Err(CliError::Aborted) => Ok(false),
            Err(err) => Err(CoreError::InvalidArgument(err.to_string())),
        }
    }

    fn on_outcome(&mut self, index: usize, id: &str, outcome: &ApplyOutcome<A::Response>) {
        match outcome {
            ApplyOutcome::Created(resp) | ApplyOutcome::Updated(resp) => {
                eprintln!("document {index}: {} {} {}", outcome.label(), A::KIND, A::id(resp));
                let printed = self.printer.map_or(Ok(()), |p| p.print_one(resp));
                if let Err(err) = printed {
                    self.error.get_or_insert(err);
                }
            }
            ApplyOutcome::Skipped { id } => {
                eprintln!("document {index}: skipped {} {id}", A::KIND);
            }
            ApplyOutcome::Failed(err) => {
                eprintln!("document {index}: failed {} {id}: {}", A::KIND, err.root());
            }
        }
    }
}

async fn edit<E: EntityCmd>(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let adapter = E::adapter(cfg)?;
    let updated = metalctl_core::edit(&adapter, required(m, "id")?, launch_editor).await?;
    cfg.describe_printer().print_one(&updated)
}
