//! `metalctl machine` and `metalctl firewall`

use std::path::PathBuf;

use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;
use serde::Serialize;
use strum::VariantNames;
use tracing::{debug, warn};

use metal_api::PowerAction;
use metal_api::models::{
    FirewallCreateRequest, FirewallResponse, MachineAllocateRequest, MachineAllocationNetwork,
    MachineFindRequest, MachineIssue, MachineIssuesRequest, MachineReinstallRequest,
    MachineResponse, MachineStateRequest, MachineUpdateRequest, ProvisioningEvent,
};
use metalctl_core::entities::{
    FirewallAdapter, MachineAdapter, firewall_sorter, machine_sorter, os_and_version,
};
use metalctl_core::{EntityAdapter, Sorter};

use crate::commands::image::Images;
use crate::commands::network::Networks;
use crate::commands::partition::Partitions;
use crate::commands::project::Projects;
use crate::commands::size::Sizes;
use crate::commands::util::{many, one, spawn};
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd, id_arg, required};
use crate::output::{Style, TableRow, glyphs, humanize};

/// Port of the metal-console ssh endpoint on the API host.
const CONSOLE_PORT: &str = "5222";

pub struct Machines;

impl EntityCmd for Machines {
    type Adapter = MachineAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "machine",
            plural: "machines",
            aliases: &["m", "ms"],
            about: "Manage bare-metal machines",
            long_about: Some(
                "Machines are allocated to a project instead of created and freed \
                 instead of deleted.",
            ),
            create_aliases: &["allocate"],
            delete_aliases: &["free"],
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<MachineAdapter, CliError> {
        Ok(MachineAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<MachineResponse> {
        machine_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        find_args(cmd)
    }

    fn filter(m: &ArgMatches) -> Result<MachineFindRequest, CliError> {
        Ok(find_request(m))
    }

    fn create_args(cmd: Command) -> Command {
        allocate_args(cmd)
    }

    fn create_from_cli(m: &ArgMatches) -> Result<Option<MachineAllocateRequest>, CliError> {
        allocate_request(m)
    }

    fn update_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("description").long("description").help("New description"))
            .arg(
                Arg::new("add-tag")
                    .long("add-tag")
                    .action(ArgAction::Append)
                    .help("Tag to add"),
            )
            .arg(
                Arg::new("remove-tag")
                    .long("remove-tag")
                    .action(ArgAction::Append)
                    .help("Tag to remove"),
            )
    }

    async fn update_from_cli(
        adapter: &MachineAdapter,
        id: &str,
        m: &ArgMatches,
    ) -> Result<Option<MachineUpdateRequest>, CliError> {
        let (add, remove) = (many(m, "add-tag"), many(m, "remove-tag"));
        let description = one(m, "description");
        if add.is_empty() && remove.is_empty() && description.is_none() {
            return Ok(None);
        }
        let machine = adapter.get(id).await?;
        let mut tags = machine.tags;
        tags.retain(|t| !remove.contains(t));
        for tag in add {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Ok(Some(MachineUpdateRequest {
            id: id.to_owned(),
            description,
            tags: Some(tags),
        }))
    }
}

pub struct Firewalls;

impl EntityCmd for Firewalls {
    type Adapter = FirewallAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "firewall",
            plural: "firewalls",
            aliases: &["fw"],
            about: "Manage firewalls",
            long_about: Some("A firewall is a machine allocated with the firewall role."),
            create_aliases: &["allocate"],
            delete_aliases: &["free"],
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<FirewallAdapter, CliError> {
        Ok(FirewallAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<FirewallResponse> {
        firewall_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        find_args(cmd)
    }

    fn filter(m: &ArgMatches) -> Result<MachineFindRequest, CliError> {
        Ok(find_request(m))
    }

    fn create_args(cmd: Command) -> Command {
        allocate_args(cmd)
    }

    fn create_from_cli(m: &ArgMatches) -> Result<Option<FirewallCreateRequest>, CliError> {
        Ok(allocate_request(m)?.map(|machine| FirewallCreateRequest {
            machine,
            firewall_rules: None,
        }))
    }
}

// ── Flags ────────────────────────────────────────────────────────────

fn find_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("id").long("id").help("Machine id"))
        .arg(
            Arg::new("partition")
                .long("partition")
                .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                .help("Partition id"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .add(ArgValueCandidates::new(completion::ids::<Sizes>))
                .help("Size id"),
        )
        .arg(Arg::new("name").long("name").help("Allocation name"))
        .arg(
            Arg::new("project")
                .long("project")
                .add(ArgValueCandidates::new(completion::ids::<Projects>))
                .help("Allocation project"),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .add(ArgValueCandidates::new(completion::ids::<Images>))
                .help("Allocation image"),
        )
        .arg(Arg::new("hostname").long("hostname").help("Allocation hostname"))
        .arg(Arg::new("rack").long("rack").help("Rack id"))
        .arg(
            Arg::new("mac")
                .long("mac")
                .action(ArgAction::Append)
                .help("MAC address of a nic, repeatable"),
        )
        .arg(
            Arg::new("tags")
                .long("tags")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Tags the machine must carry"),
        )
}

fn find_request(m: &ArgMatches) -> MachineFindRequest {
    MachineFindRequest {
        id: one(m, "id"),
        name: one(m, "name"),
        partition_id: one(m, "partition"),
        sizeid: one(m, "size"),
        rackid: one(m, "rack"),
        allocation_project: one(m, "project"),
        allocation_image_id: one(m, "image"),
        allocation_hostname: one(m, "hostname"),
        allocation_role: None,
        nics_mac_addresses: many(m, "mac"),
        tags: many(m, "tags"),
    }
}

fn allocate_args(cmd: Command) -> Command {
    let append = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .long(name)
            .action(ArgAction::Append)
            .value_delimiter(',')
            .help(help)
    };
    cmd.arg(Arg::new("id").long("id").help("Allocate this machine instead of any free one"))
        .arg(Arg::new("name").long("name").help("Allocation name, defaults to the hostname"))
        .arg(Arg::new("description").long("description").help("Description"))
        .arg(Arg::new("hostname").long("hostname").help("Hostname"))
        .arg(
            Arg::new("project")
                .long("project")
                .add(ArgValueCandidates::new(completion::ids::<Projects>))
                .help("Project to allocate into"),
        )
        .arg(
            Arg::new("partition")
                .long("partition")
                .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                .help("Partition"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .add(ArgValueCandidates::new(completion::ids::<Sizes>))
                .help("Size"),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .add(ArgValueCandidates::new(completion::ids::<Images>))
                .help("Image"),
        )
        .arg(Arg::new("filesystemlayout").long("filesystemlayout").help("Filesystem layout"))
        .arg(
            append("networks", "Networks as ID[:auto|:noauto], repeatable")
                .add(ArgValueCandidates::new(completion::ids::<Networks>)),
        )
        .arg(append("ips", "Static IP addresses"))
        .arg(append("sshpublickey", "Public key, or @FILE to read it from a file"))
        .arg(Arg::new("userdata").long("userdata").help("Cloud-init user data, or @FILE"))
        .arg(append("tags", "Tags"))
        .arg(append("placement-tags", "Placement tags"))
}

/// Inline value, or the contents of `FILE` for `@FILE`.
fn inline_or_file(raw: String) -> Result<String, CliError> {
    match raw.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?.trim_end().to_owned()),
        None => Ok(raw),
    }
}

fn parse_network(raw: &str) -> Result<MachineAllocationNetwork, CliError> {
    let (id, mode) = raw.split_once(':').unwrap_or((raw, "auto"));
    let autoacquire = match mode {
        "auto" => true,
        "noauto" => false,
        other => {
            return Err(CliError::validation(
                "networks",
                format!("'{other}' must be auto or noauto"),
            ));
        }
    };
    Ok(MachineAllocationNetwork {
        networkid: id.to_owned(),
        autoacquire,
    })
}

fn allocate_request(m: &ArgMatches) -> Result<Option<MachineAllocateRequest>, CliError> {
    let placement = ["project", "partition", "size", "image"];
    if placement.iter().all(|f| one(m, f).is_none()) {
        return Ok(None);
    }
    let need = |name: &str| {
        one(m, name).ok_or_else(|| CliError::validation(name, "is required for allocation"))
    };
    let hostname = one(m, "hostname");
    Ok(Some(MachineAllocateRequest {
        uuid: one(m, "id"),
        name: one(m, "name")
            .or_else(|| hostname.clone())
            .unwrap_or_default(),
        description: one(m, "description"),
        hostname,
        projectid: need("project")?,
        partitionid: need("partition")?,
        sizeid: need("size")?,
        imageid: need("image")?,
        filesystemlayoutid: one(m, "filesystemlayout"),
        networks: many(m, "networks")
            .iter()
            .map(|n| parse_network(n))
            .collect::<Result<_, _>>()?,
        ips: many(m, "ips"),
        ssh_pub_keys: many(m, "sshpublickey")
            .into_iter()
            .map(inline_or_file)
            .collect::<Result<_, _>>()?,
        user_data: one(m, "userdata").map(inline_or_file).transpose()?,
        tags: many(m, "tags"),
        placement_tags: many(m, "placement-tags"),
    }))
}

// ── Tables ───────────────────────────────────────────────────────────

impl TableRow for MachineResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec![
            "ID", "", "LAST EVENT", "WHEN", "AGE", "HOSTNAME", "PROJECT", "SIZE", "IMAGE",
            "PARTITION", "RACK",
        ];
        if wide {
            header.extend(["STARTED", "TAGS", "LOCK/RESERVE"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let now = Utc::now();
        let alloc = self.allocation.as_ref();
        let events = self.events.as_ref();
        let last_event = events
            .and_then(|e| e.log.first())
            .map(|e| e.event.clone())
            .unwrap_or_default();
        let last_event = if events.is_some_and(|e| e.crash_loop || e.failed_machine_reclaim) {
            style.red(&last_event)
        } else {
            last_event
        };
        let image = alloc
            .and_then(|a| a.image.as_ref())
            .map(|i| {
                if wide {
                    i.id.clone()
                } else {
                    let (os, version) = os_and_version(&i.id);
                    format!("{os} {version}").trim_end().to_owned()
                }
            })
            .unwrap_or_default();

        let mut row = vec![
            self.id.clone(),
            glyphs::machine_status(self, now),
            last_event,
            humanize::age(events.and_then(|e| e.last_event_time.as_ref()), now),
            humanize::age(alloc.and_then(|a| a.created.as_ref()), now),
            alloc
                .and_then(|a| a.hostname.clone())
                .unwrap_or_default(),
            alloc.map(|a| a.project.clone()).unwrap_or_default(),
            self.size.as_ref().map(|s| s.id.clone()).unwrap_or_default(),
            image,
            self.partition
                .as_ref()
                .map(|p| p.id.clone())
                .unwrap_or_default(),
            self.rackid.clone().unwrap_or_default(),
        ];
        if wide {
            row.extend([
                alloc
                    .and_then(|a| a.created)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                self.tags.join(", "),
                self.state.description.clone(),
            ]);
        }
        row
    }
}

impl TableRow for FirewallResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        MachineResponse::header(wide)
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        self.machine.row(wide, style)
    }
}

impl TableRow for ProvisioningEvent {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["TIME", "EVENT", "MESSAGE"]
    }

    fn row(&self, _wide: bool, _style: &Style) -> Vec<String> {
        vec![
            self.time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            self.event.clone(),
            self.message.clone().unwrap_or_default(),
        ]
    }
}

/// BMC view of a machine for `machine ipmi`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct IpmiView(pub MachineResponse);

impl TableRow for IpmiView {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "POWER", "IP", "MAC", "BOARD PART NUMBER", "BMC", "SIZE", "PARTITION", "RACK", "UPDATED"];
        if wide {
            header.extend(["MANUFACTURER", "SERIAL"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let m = &self.0;
        let ipmi = m.ipmi.clone().unwrap_or_default();
        let fru = ipmi.fru.clone().unwrap_or_default();
        let power = match ipmi.powerstate.as_str() {
            "ON" => style.green("ON"),
            "OFF" => style.red("OFF"),
            other => other.to_owned(),
        };
        let mut row = vec![
            m.id.clone(),
            power,
            ipmi.address,
            ipmi.mac,
            fru.board_part_number.unwrap_or_default(),
            ipmi.bmcversion,
            m.size.as_ref().map(|s| s.id.clone()).unwrap_or_default(),
            m.partition.as_ref().map(|p| p.id.clone()).unwrap_or_default(),
            m.rackid.clone().unwrap_or_default(),
            humanize::age(ipmi.last_updated.as_ref(), Utc::now()),
        ];
        if wide {
            row.extend([
                fru.product_manufacturer.unwrap_or_default(),
                fru.product_serial.unwrap_or_default(),
            ]);
        }
        row
    }
}

/// A machine together with the issues evaluated for it.
#[derive(Debug, Serialize)]
pub struct MachineWithIssues {
    pub machine: MachineResponse,
    pub issues: Vec<MachineIssue>,
}

impl TableRow for MachineWithIssues {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["ID", "POWER", "ALLOCATED", "LOCK REASON", "LAST EVENT", "WHEN", "ISSUES"]
    }

    fn row(&self, _wide: bool, style: &Style) -> Vec<String> {
        let m = &self.machine;
        let events = m.events.as_ref();
        let issues = self
            .issues
            .iter()
            .map(|i| {
                let line = format!("- {} ({})", i.description, i.id);
                if i.severity == "critical" {
                    style.red(&line)
                } else {
                    line
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        vec![
            m.id.clone(),
            m.ipmi.as_ref().map(|i| i.powerstate.clone()).unwrap_or_default(),
            if m.allocation.is_some() { "yes" } else { "no" }.to_owned(),
            m.state.description.clone(),
            events
                .and_then(|e| e.log.first())
                .map(|e| e.event.clone())
                .unwrap_or_default(),
            humanize::age(events.and_then(|e| e.last_event_time.as_ref()), Utc::now()),
            issues,
        ]
    }
}

/// Pair issue reports with their machines, dropping machines without issues.
pub fn join_issues(
    machines: Vec<MachineResponse>,
    reports: Vec<metal_api::models::MachineIssueResponse>,
) -> Vec<MachineWithIssues> {
    let mut reports: std::collections::BTreeMap<String, Vec<MachineIssue>> = reports
        .into_iter()
        .filter(|r| !r.issues.is_empty())
        .map(|r| (r.machineid, r.issues))
        .collect();
    machines
        .into_iter()
        .filter_map(|machine| {
            let issues = reports.remove(&machine.id)?;
            Some(MachineWithIssues { machine, issues })
        })
        .collect()
}

// ── Extra subcommands ────────────────────────────────────────────────

fn machine_id() -> Arg {
    id_arg::<Machines>("Machine id").required(true)
}

fn described(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(machine_id())
        .arg(Arg::new("description").long("description").help("Reason"))
}

pub fn command() -> Command {
    let power = PowerAction::VARIANTS.iter().fold(
        Command::new("power")
            .about("Power a machine on or off, reset it or pick the next boot device")
            .subcommand_required(true),
        |cmd, action| {
            cmd.subcommand(
                Command::new(*action)
                    .about(format!("Power action {action}"))
                    .arg(machine_id()),
            )
        },
    );
    let identify = Command::new("identify")
        .about("Switch the chassis identify LED")
        .subcommand_required(true)
        .subcommand(described("on", "Turn the LED on"))
        .subcommand(described("off", "Turn the LED off"));

    generic::command::<Machines>()
        .subcommand(power)
        .subcommand(identify)
        .subcommand(
            Command::new("reinstall")
                .about("Reinstall an allocated machine with a new image")
                .arg(machine_id())
                .arg(
                    Arg::new("image")
                        .long("image")
                        .required(true)
                        .add(ArgValueCandidates::new(completion::ids::<Images>))
                        .help("Image to install"),
                )
                .arg(Arg::new("description").long("description").help("Description")),
        )
        .subcommand(
            Command::new("console")
                .about("Attach to the serial console of a machine")
                .arg(machine_id())
                .arg(
                    Arg::new("ipmi")
                        .long("ipmi")
                        .action(ArgAction::SetTrue)
                        .help("Use ipmitool against the BMC instead of the metal-console"),
                )
                .arg(
                    Arg::new("sshidentity")
                        .long("sshidentity")
                        .short('p')
                        .help("SSH private key, defaults to ~/.ssh/id_rsa"),
                ),
        )
        .subcommand(find_args(
            Command::new("ipmi")
                .about("Show IPMI details of one machine or all matching machines")
                .arg(
                    Arg::new("machine")
                        .value_name("ID")
                        .add(ArgValueCandidates::new(completion::ids::<Machines>))
                        .help("Machine id"),
                ),
        ))
        .subcommand(find_args(
            Command::new("issues")
                .about("List machines with issues")
                .arg(
                    Arg::new("only")
                        .long("only")
                        .action(ArgAction::Append)
                        .value_delimiter(',')
                        .help("Evaluate only these issue types"),
                )
                .arg(
                    Arg::new("omit")
                        .long("omit")
                        .action(ArgAction::Append)
                        .value_delimiter(',')
                        .help("Skip these issue types"),
                )
                .arg(
                    Arg::new("severity")
                        .long("severity")
                        .add(ArgValueCandidates::new(completion::fixed(&[
                            "minor", "major", "critical",
                        ])))
                        .help("Minimum severity"),
                ),
        ))
        .subcommand(described("lock", "Lock a machine against allocation and freeing"))
        .subcommand(described("unlock", "Remove a lock"))
        .subcommand(described("reserve", "Reserve a machine for manual allocation"))
        .subcommand(described("unreserve", "Remove a reservation"))
        .subcommand(
            Command::new("logs")
                .visible_alias("log")
                .about("Show the provisioning event log of a machine")
                .arg(machine_id()),
        )
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    match m.subcommand() {
        Some(("power", sub)) => power(cfg, sub).await,
        Some(("identify", sub)) => identify(cfg, sub).await,
        Some(("reinstall", sub)) => reinstall(cfg, sub).await,
        Some(("console", sub)) => console(cfg, sub).await,
        Some(("ipmi", sub)) => ipmi(cfg, sub).await,
        Some(("issues", sub)) => issues(cfg, sub).await,
        Some(("lock", sub)) => set_state(cfg, sub, "LOCKED", true).await,
        Some(("unlock", sub)) => set_state(cfg, sub, "", false).await,
        Some(("reserve", sub)) => set_state(cfg, sub, "RESERVED", true).await,
        Some(("unreserve", sub)) => set_state(cfg, sub, "", false).await,
        Some(("logs", sub)) => logs(cfg, sub).await,
        _ => generic::run::<Machines>(cfg, m).await,
    }
}

pub fn firewall_command() -> Command {
    generic::command::<Firewalls>()
}

pub async fn run_firewall(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    generic::run::<Firewalls>(cfg, m).await
}

async fn power(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let Some((action, sub)) = m.subcommand() else {
        return Err(CliError::validation("action", "missing power action"));
    };
    let action: PowerAction = action
        .parse()
        .map_err(|_| CliError::validation("action", format!("unknown power action '{action}'")))?;
    let id = required(sub, "id")?;
    debug!(id, %action, "power");
    let machine = cfg.client()?.machine_power(id, action).await?;
    cfg.printer().print_one(&machine)
}

async fn identify(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let Some((state, sub)) = m.subcommand() else {
        return Err(CliError::validation("state", "pass on or off"));
    };
    let id = required(sub, "id")?;
    let description = one(sub, "description").unwrap_or_default();
    let machine = cfg
        .client()?
        .machine_identify(id, state == "on", &description)
        .await?;
    cfg.printer().print_one(&machine)
}

async fn reinstall(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let req = MachineReinstallRequest {
        image_id: required(m, "image")?.to_owned(),
        description: one(m, "description"),
    };
    let machine = cfg.client()?.reinstall_machine(required(m, "id")?, &req).await?;
    cfg.printer().print_one(&machine)
}

/// Lock and reserve need a reason; clearing sends an empty state.
async fn set_state(
    cfg: &Config,
    m: &ArgMatches,
    value: &str,
    needs_reason: bool,
) -> Result<(), CliError> {
    let description = one(m, "description").unwrap_or_default();
    if needs_reason && description.is_empty() {
        return Err(CliError::validation("description", "a reason is required"));
    }
    let req = MachineStateRequest {
        value: value.to_owned(),
        description,
    };
    let machine = cfg.client()?.set_machine_state(required(m, "id")?, &req).await?;
    cfg.printer().print_one(&machine)
}

async fn ipmi(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let client = cfg.client()?;
    let mut machines = match one(m, "machine") {
        Some(id) => vec![client.get_machine_ipmi(&id).await?],
        None => client.find_machines_ipmi(&find_request(m)).await?,
    };
    machine_sorter().sort_by_args::<&str>(&mut machines, &[])?;
    let views: Vec<IpmiView> = machines.into_iter().map(IpmiView).collect();
    cfg.printer().print(&views)
}

async fn issues(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let client = cfg.client()?;
    let find = find_request(m);
    let req = MachineIssuesRequest {
        find: find.clone(),
        only: many(m, "only"),
        omit: many(m, "omit"),
        severity: one(m, "severity"),
    };
    let reports = client.machine_issues(&req).await?;
    let mut machines = MachineAdapter::new(client).list(&find).await?;
    machine_sorter().sort_by_args::<&str>(&mut machines, &[])?;
    cfg.printer().print(&join_issues(machines, reports))
}

async fn logs(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let mut log = cfg.client()?.machine_events(required(m, "id")?).await?.log;
    log.sort_by_key(|e| e.time);
    cfg.printer().print(&log)
}

async fn console(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let id = required(m, "id")?;
    let client = cfg.client()?;
    if m.get_flag("ipmi") {
        let machine = client.get_machine_ipmi(id).await?;
        let ipmi = machine
            .ipmi
            .ok_or_else(|| CliError::validation("ipmi", format!("machine {id} has no IPMI data")))?;
        return spawn("ipmitool", &ipmitool_args(&ipmi.address, &ipmi.user, &ipmi.password));
    }

    let host = client
        .base_url()
        .host_str()
        .ok_or_else(|| CliError::validation("api-url", "has no host"))?
        .to_owned();
    let identity = one(m, "sshidentity").map(PathBuf::from).or_else(default_identity);
    spawn("ssh", &ssh_console_args(id, &host, identity.as_deref()))
}

/// `~/.ssh/id_rsa` when it exists; warns otherwise.
fn default_identity() -> Option<PathBuf> {
    let key = directories::BaseDirs::new()?.home_dir().join(".ssh").join("id_rsa");
    if key.is_file() {
        Some(key)
    } else {
        warn!(path = %key.display(), "default ssh key not found, relying on the ssh agent");
        None
    }
}

fn ssh_console_args(id: &str, host: &str, identity: Option<&std::path::Path>) -> Vec<String> {
    let mut args = vec!["-p".to_owned(), CONSOLE_PORT.to_owned()];
    if let Some(key) = identity {
        args.extend(["-i".to_owned(), key.display().to_string()]);
    }
    args.push(format!("{id}@{host}"));
    args
}

fn ipmitool_args(address: &str, user: &str, password: &str) -> Vec<String> {
    let (host, port) = address.split_once(':').unwrap_or((address, "623"));
    ["-I", "lanplus", "-H", host, "-p", port, "-U", user, "-P", password, "sol", "activate"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use metal_api::models::{MachineIssueResponse, MachineState};
    use pretty_assertions::assert_eq;

    use super::*;

    fn machine(id: &str) -> MachineResponse {
        MachineResponse {
            id: id.into(),
            ..MachineResponse::default()
        }
    }

    #[test]
    fn power_offers_every_action() {
        let cmd = command();
        let power = cmd.find_subcommand("power").unwrap();
        let actions: Vec<&str> = power.get_subcommands().map(Command::get_name).collect();
        assert_eq!(actions, vec!["on", "off", "reset", "cycle", "bios", "disk", "pxe"]);
    }

    #[test]
    fn allocation_uses_free_and_allocate_aliases() {
        let cmd = command();
        let create = cmd.find_subcommand("create").unwrap();
        assert!(create.get_all_aliases().any(|a| a == "allocate"));
        let delete = cmd.find_subcommand("delete").unwrap();
        assert!(delete.get_all_aliases().any(|a| a == "free"));
    }

    #[test]
    fn allocation_needs_every_placement_flag() {
        let cmd = allocate_args(Command::new("create"));
        let m = cmd
            .clone()
            .try_get_matches_from(["create", "--project", "p"])
            .unwrap();
        assert!(allocate_request(&m).is_err());

        let m = cmd
            .try_get_matches_from([
                "create",
                "--hostname",
                "web",
                "--project",
                "p",
                "--partition",
                "fra",
                "--size",
                "c1",
                "--image",
                "ubuntu-24.04",
                "--networks",
                "internet:noauto,private",
            ])
            .unwrap();
        let req = allocate_request(&m).unwrap().unwrap();
        assert_eq!(req.name, "web");
        assert!(!req.networks[0].autoacquire);
        assert!(req.networks[1].autoacquire);
    }

    #[test]
    fn no_placement_flag_means_no_cli_request() {
        let m = allocate_args(Command::new("create"))
            .try_get_matches_from(["create"])
            .unwrap();
        assert!(allocate_request(&m).unwrap().is_none());
    }

    #[test]
    fn console_targets_the_api_host() {
        assert_eq!(
            ssh_console_args("m1", "api.example.com", None),
            vec!["-p", "5222", "m1@api.example.com"]
        );
        let args = ipmitool_args("10.0.0.1:6230", "admin", "secret");
        assert_eq!(args[3], "10.0.0.1");
        assert_eq!(args[5], "6230");
    }

    #[test]
    fn issues_are_joined_to_machines() {
        let reports = vec![
            MachineIssueResponse {
                machineid: "m2".into(),
                issues: vec![MachineIssue {
                    id: "no-event-container".into(),
                    severity: "major".into(),
                    ..MachineIssue::default()
                }],
            },
            MachineIssueResponse {
                machineid: "m1".into(),
                issues: Vec::new(),
            },
        ];
        let joined = join_issues(vec![machine("m1"), machine("m2")], reports);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].machine.id, "m2");
    }

    #[test]
    fn locked_machine_shows_the_lock_glyph() {
        let mut m = machine("m1");
        m.state = MachineState {
            value: "LOCKED".into(),
            description: "maintenance".into(),
            ..MachineState::default()
        };
        let row = m.row(true, &Style::plain());
        assert!(row[1].contains(glyphs::LOCKED));
        assert_eq!(row.last().unwrap(), "maintenance");
    }
}
