//! `metalctl size`, with image constraints and reservations below it

use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;

use metal_api::models::{
    SizeConstraint, SizeImageConstraintResponse, SizeImageConstraintTryRequest,
    SizeReservationCreateRequest, SizeReservationFindRequest, SizeReservationResponse,
    SizeReservationUsageResponse, SizeResponse,
};
use metalctl_core::Sorter;
use metalctl_core::entities::{
    SizeAdapter, SizeImageConstraintAdapter, SizeReservationAdapter, size_image_constraint_sorter,
    size_reservation_sorter, size_sorter,
};

use crate::commands::image::Images;
use crate::commands::machine::Machines;
use crate::commands::partition::Partitions;
use crate::commands::project::Projects;
use crate::commands::util::{many, one, parse_labels};
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd, id_arg, required};
use crate::output::{Style, TableRow, humanize};

pub struct Sizes;

impl EntityCmd for Sizes {
    type Adapter = SizeAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "size",
            plural: "sizes",
            about: "Manage machine sizes",
            long_about: Some(
                "A size classifies machines by their hardware: cores, memory, storage and gpus.",
            ),
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<SizeAdapter, CliError> {
        Ok(SizeAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<SizeResponse> {
        size_sorter()
    }
}

/// `min - max` of the constraints of one kind; bytes for memory and storage.
fn range(constraints: &[SizeConstraint], kind: &str) -> String {
    constraints
        .iter()
        .filter(|c| c.kind == kind)
        .map(|c| {
            let fmt = |n: u64| match kind {
                "memory" | "storage" => humanize::bytes(n),
                _ => n.to_string(),
            };
            let bounds = if c.min == c.max {
                fmt(c.min)
            } else {
                format!("{} - {}", fmt(c.min), fmt(c.max))
            };
            match &c.identifier {
                Some(ident) => format!("{ident}: {bounds}"),
                None => bounds,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl TableRow for SizeResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "NAME", "DESCRIPTION", "CPU RANGE", "MEMORY RANGE", "STORAGE RANGE"];
        if wide {
            header.extend(["GPU RANGE", "LABELS"]);
        }
        header
    }

    fn row(&self, wide: bool, _style: &Style) -> Vec<String> {
        let mut row = vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
            range(&self.constraints, "cores"),
            range(&self.constraints, "memory"),
            range(&self.constraints, "storage"),
        ];
        if wide {
            row.extend([
                range(&self.constraints, "gpu"),
                self.labels
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            ]);
        }
        row
    }
}

// ── Image constraints ────────────────────────────────────────────────

pub struct SizeImageConstraints;

impl EntityCmd for SizeImageConstraints {
    type Adapter = SizeImageConstraintAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "imageconstraint",
            plural: "size image constraints",
            aliases: &["ic"],
            about: "Manage which images may run on a size",
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<SizeImageConstraintAdapter, CliError> {
        Ok(SizeImageConstraintAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<SizeImageConstraintResponse> {
        size_image_constraint_sorter()
    }
}

impl TableRow for SizeImageConstraintResponse {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["ID", "NAME", "DESCRIPTION", "IMAGE", "CONSTRAINT"]
    }

    fn row(&self, _wide: bool, _style: &Style) -> Vec<String> {
        let (images, constraints): (Vec<_>, Vec<_>) = self
            .constraints
            .images
            .iter()
            .map(|(image, constraint)| (image.as_str(), constraint.as_str()))
            .unzip();
        vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
            images.join("\n"),
            constraints.join("\n"),
        ]
    }
}

// ── Reservations ─────────────────────────────────────────────────────

pub struct SizeReservations;

impl EntityCmd for SizeReservations {
    type Adapter = SizeReservationAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "reservation",
            plural: "size reservations",
            aliases: &["rs"],
            about: "Manage machines reserved for a project",
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<SizeReservationAdapter, CliError> {
        Ok(SizeReservationAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<SizeReservationResponse> {
        size_reservation_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        reservation_find_args(cmd)
    }

    fn filter(m: &ArgMatches) -> Result<SizeReservationFindRequest, CliError> {
        Ok(reservation_find(m))
    }

    fn create_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("id").long("id").help("Reservation id, generated when empty"))
            .arg(Arg::new("name").long("name").help("Name"))
            .arg(Arg::new("description").long("description").help("Description"))
            .arg(
                Arg::new("size")
                    .long("size")
                    .add(ArgValueCandidates::new(completion::ids::<Sizes>))
                    .help("Reserved size"),
            )
            .arg(
                Arg::new("project")
                    .long("project")
                    .add(ArgValueCandidates::new(completion::ids::<Projects>))
                    .help("Project the machines are reserved for"),
            )
            .arg(
                Arg::new("partitions")
                    .long("partitions")
                    .action(ArgAction::Append)
                    .value_delimiter(',')
                    .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                    .help("Partitions of the reservation"),
            )
            .arg(
                Arg::new("amount")
                    .long("amount")
                    .value_parser(clap::value_parser!(u32))
                    .help("Number of machines"),
            )
            .arg(
                Arg::new("label")
                    .long("label")
                    .value_name("KEY=VALUE")
                    .action(ArgAction::Append)
                    .help("Label, repeatable"),
            )
    }

    fn create_from_cli(m: &ArgMatches) -> Result<Option<SizeReservationCreateRequest>, CliError> {
        let Some(sizeid) = one(m, "size") else {
            return Ok(None);
        };
        let projectid = one(m, "project")
            .ok_or_else(|| CliError::validation("project", "is required with --size"))?;
        let partitionids = many(m, "partitions");
        if partitionids.is_empty() {
            return Err(CliError::validation("partitions", "at least one is required"));
        }
        Ok(Some(SizeReservationCreateRequest {
            id: one(m, "id").unwrap_or_default(),
            name: one(m, "name"),
            description: one(m, "description"),
            sizeid,
            partitionids,
            projectid,
            amount: m.get_one::<u32>("amount").copied().unwrap_or(1),
            labels: parse_labels(&many(m, "label"))?,
        }))
    }
}

fn reservation_find_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("id").long("id").help("Reservation id"))
        .arg(
            Arg::new("size")
                .long("size")
                .add(ArgValueCandidates::new(completion::ids::<Sizes>))
                .help("Size id"),
        )
        .arg(
            Arg::new("project")
                .long("project")
                .add(ArgValueCandidates::new(completion::ids::<Projects>))
                .help("Project id"),
        )
        .arg(
            Arg::new("partition")
                .long("partition")
                .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                .help("Partition id"),
        )
}

fn reservation_find(m: &ArgMatches) -> SizeReservationFindRequest {
    SizeReservationFindRequest {
        id: one(m, "id"),
        sizeid: one(m, "size"),
        projectid: one(m, "project"),
        partitionid: one(m, "partition"),
    }
}

impl TableRow for SizeReservationResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "SIZE", "PROJECT", "PARTITIONS", "DESCRIPTION", "AMOUNT"];
        if wide {
            header.extend(["NAME", "LABELS"]);
        }
        header
    }

    fn row(&self, wide: bool, _style: &Style) -> Vec<String> {
        let mut row = vec![
            self.id.clone(),
            self.sizeid.clone(),
            self.projectid.clone(),
            self.partitionids.join(", "),
            self.description.clone().unwrap_or_default(),
            self.amount.to_string(),
        ];
        if wide {
            row.extend([
                self.name.clone().unwrap_or_default(),
                self.labels
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            ]);
        }
        row
    }
}

impl TableRow for SizeReservationUsageResponse {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["ID", "SIZE", "PROJECT", "PARTITION", "USED/AMOUNT"]
    }

    fn row(&self, _wide: bool, style: &Style) -> Vec<String> {
        let usage = format!("{}/{}", self.used_amount, self.amount);
        vec![
            self.id.clone(),
            self.sizeid.clone(),
            self.projectid.clone(),
            self.partitionid.clone(),
            if self.used_amount >= self.amount {
                style.yellow(&usage)
            } else {
                usage
            },
        ]
    }
}

// ── Command tree ─────────────────────────────────────────────────────

fn size_and_image_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("size")
            .long("size")
            .required(true)
            .add(ArgValueCandidates::new(completion::ids::<Sizes>))
            .help("Size id"),
    )
    .arg(
        Arg::new("image")
            .long("image")
            .required(true)
            .add(ArgValueCandidates::new(completion::ids::<Images>))
            .help("Image id"),
    )
}

pub fn command() -> Command {
    let imageconstraint = generic::command::<SizeImageConstraints>().subcommand(size_and_image_args(
        Command::new("try").about("Check whether an image may be installed on a size"),
    ));
    let reservation = generic::command::<SizeReservations>().subcommand(reservation_find_args(
        Command::new("usage").about("Show how much of each reservation is in use"),
    ));

    generic::command::<Sizes>()
        .subcommand(
            Command::new("suggest")
                .about("Suggest a size definition from the hardware of a machine")
                .arg(id_arg::<Machines>("Machine id").required(true))
                .arg(Arg::new("name").long("name").help("Id and name of the suggested size")),
        )
        .subcommand(imageconstraint)
        .subcommand(reservation)
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    match m.subcommand() {
        Some(("suggest", sub)) => suggest(cfg, sub).await,
        Some(("imageconstraint", sub)) => match sub.subcommand() {
            Some(("try", args)) => try_image(cfg, args).await,
            _ => generic::run::<SizeImageConstraints>(cfg, sub).await,
        },
        Some(("reservation", sub)) => match sub.subcommand() {
            Some(("usage", args)) => reservation_usage(cfg, args).await,
            _ => generic::run::<SizeReservations>(cfg, sub).await,
        },
        _ => generic::run::<Sizes>(cfg, m).await,
    }
}

async fn suggest(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let mut size = cfg.client()?.suggest_size(required(m, "id")?).await?;
    if let Some(name) = one(m, "name") {
        size.id.clone_from(&name);
        size.name = Some(name);
    }
    cfg.describe_printer().print_one(&size)
}

async fn try_image(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let req = SizeImageConstraintTryRequest {
        size: required(m, "size")?.to_owned(),
        image: required(m, "image")?.to_owned(),
    };
    cfg.client()?.try_size_image_constraint(&req).await?;
    println!("image {} is allowed on size {}", req.image, req.size);
    Ok(())
}

async fn reservation_usage(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let mut usage = cfg
        .client()?
        .size_reservation_usage(&reservation_find(m))
        .await?;
    usage.sort_by(|a, b| (&a.sizeid, &a.projectid, &a.id).cmp(&(&b.sizeid, &b.projectid, &b.id)));
    cfg.printer().print(&usage)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn constraint(kind: &str, min: u64, max: u64) -> SizeConstraint {
        SizeConstraint {
            kind: kind.into(),
            min,
            max,
            identifier: None,
        }
    }

    #[test]
    fn ranges_humanize_bytes() {
        let constraints = vec![
            constraint("cores", 8, 8),
            constraint("memory", 32_000_000_000, 64_000_000_000),
        ];
        assert_eq!(range(&constraints, "cores"), "8");
        assert_eq!(range(&constraints, "memory"), "32 GB - 64 GB");
        assert_eq!(range(&constraints, "storage"), "");
    }

    #[test]
    fn nested_trees_are_registered() {
        let cmd = command();
        let names: Vec<&str> = cmd.get_subcommands().map(Command::get_name).collect();
        for expected in ["list", "suggest", "imageconstraint", "reservation"] {
            assert!(names.contains(&expected), "{expected} missing");
        }
        let ic = cmd.find_subcommand("imageconstraint").unwrap();
        assert!(ic.find_subcommand("try").is_some());
        let rs = cmd.find_subcommand("reservation").unwrap();
        assert!(rs.find_subcommand("usage").is_some());
    }

    #[test]
    fn reservation_needs_partitions() {
        let cmd = SizeReservations::create_args(Command::new("create"));
        let m = cmd
            .try_get_matches_from(["create", "--size", "c1", "--project", "p"])
            .unwrap();
        assert!(SizeReservations::create_from_cli(&m).is_err());
    }
}
