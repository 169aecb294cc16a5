//! `metalctl network` and `metalctl network ip`

use std::collections::BTreeMap;

use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;
use serde::Serialize;

use metal_api::models::{
    IpAllocateRequest, IpFindRequest, IpResponse, IpUpdateRequest, NetworkAllocateRequest,
    NetworkCreateRequest, NetworkFindRequest, NetworkResponse,
};
use metalctl_core::entities::{
    IpAdapter, IpIssue, MachineAdapter, NetworkAdapter, ip_issues, ip_sorter, network_sorter,
};
use metalctl_core::{EntityAdapter, Sorter};

use crate::commands::partition::Partitions;
use crate::commands::project::Projects;
use crate::commands::util::{many, one, parse_labels};
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd, fetch_sorted, id_arg, required};
use crate::output::glyphs::{TREE_BRANCH, TREE_LAST};
use crate::output::{Printer, Style, Table, TableRow, Tabular};

const IP_TYPES: &[&str] = &["ephemeral", "static"];

pub struct Networks;

impl EntityCmd for Networks {
    type Adapter = NetworkAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "network",
            plural: "networks",
            aliases: &["net"],
            about: "Manage networks",
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<NetworkAdapter, CliError> {
        Ok(NetworkAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<NetworkResponse> {
        network_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        let tri = |name: &'static str, help: &'static str| {
            Arg::new(name)
                .long(name)
                .value_parser(clap::value_parser!(bool))
                .help(help)
        };
        cmd.arg(Arg::new("id").long("id").help("Network id"))
            .arg(Arg::new("name").long("name").help("Network name"))
            .arg(
                Arg::new("partition")
                    .long("partition")
                    .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                    .help("Partition id"),
            )
            .arg(
                Arg::new("project")
                    .long("project")
                    .add(ArgValueCandidates::new(completion::ids::<Projects>))
                    .help("Project id"),
            )
            .arg(
                Arg::new("prefixes")
                    .long("prefixes")
                    .action(ArgAction::Append)
                    .value_delimiter(',')
                    .help("Prefixes the network must contain"),
            )
            .arg(
                Arg::new("destination-prefixes")
                    .long("destination-prefixes")
                    .action(ArgAction::Append)
                    .value_delimiter(',')
                    .help("Destination prefixes"),
            )
            .arg(
                Arg::new("parent")
                    .long("parent")
                    .add(ArgValueCandidates::new(completion::ids::<Networks>))
                    .help("Parent network id"),
            )
            .arg(tri("privatesuper", "Only private super networks, or none"))
            .arg(tri("underlay", "Only underlay networks, or none"))
            .arg(tri("nat", "Only networks with NAT, or none"))
            .arg(label_arg())
    }

    fn filter(m: &ArgMatches) -> Result<NetworkFindRequest, CliError> {
        let flag = |name: &str| m.try_get_one::<bool>(name).ok().flatten().copied();
        Ok(NetworkFindRequest {
            id: one(m, "id"),
            name: one(m, "name"),
            partitionid: one(m, "partition"),
            projectid: one(m, "project"),
            prefixes: many(m, "prefixes"),
            destinationprefixes: many(m, "destination-prefixes"),
            parentnetworkid: one(m, "parent"),
            privatesuper: flag("privatesuper"),
            underlay: flag("underlay"),
            nat: flag("nat"),
            labels: parse_labels(&many(m, "label"))?,
        })
    }

    fn print_list(printer: &Printer, items: &[NetworkResponse]) -> Result<(), CliError> {
        printer.print(&NetworkTree(items))
    }

    fn create_args(cmd: Command) -> Command {
        let set = |name: &'static str, help: &'static str| {
            Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
        };
        cmd.arg(Arg::new("id").long("id").help("Network id"))
            .arg(Arg::new("name").long("name").help("Name"))
            .arg(Arg::new("description").long("description").help("Description"))
            .arg(
                Arg::new("partition")
                    .long("partition")
                    .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                    .help("Partition"),
            )
            .arg(
                Arg::new("project")
                    .long("project")
                    .add(ArgValueCandidates::new(completion::ids::<Projects>))
                    .help("Owning project"),
            )
            .arg(
                Arg::new("prefixes")
                    .long("prefixes")
                    .action(ArgAction::Append)
                    .value_delimiter(',')
                    .help("Prefixes of the network"),
            )
            .arg(
                Arg::new("destination-prefixes")
                    .long("destination-prefixes")
                    .action(ArgAction::Append)
                    .value_delimiter(',')
                    .help("Destination prefixes routed through this network"),
            )
            .arg(
                Arg::new("vrf")
                    .long("vrf")
                    .value_parser(clap::value_parser!(u64))
                    .help("VRF id"),
            )
            .arg(set("vrfshared", "VRF may be shared with other networks"))
            .arg(set("nat", "Source NAT towards this network"))
            .arg(set("privatesuper", "Child networks are allocated from this one"))
            .arg(set("underlay", "Underlay network of the switches"))
            .arg(set("shared", "Usable from other projects"))
            .arg(label_arg())
    }

    fn create_from_cli(m: &ArgMatches) -> Result<Option<NetworkCreateRequest>, CliError> {
        let prefixes = many(m, "prefixes");
        if one(m, "id").is_none() && prefixes.is_empty() {
            return Ok(None);
        }
        if prefixes.is_empty() {
            return Err(CliError::validation("prefixes", "at least one is required"));
        }
        Ok(Some(NetworkCreateRequest {
            id: one(m, "id").unwrap_or_default(),
            name: one(m, "name"),
            description: one(m, "description"),
            partitionid: one(m, "partition"),
            projectid: one(m, "project"),
            prefixes,
            destinationprefixes: many(m, "destination-prefixes"),
            vrf: m.get_one::<u64>("vrf").copied(),
            vrfshared: m.get_flag("vrfshared"),
            nat: m.get_flag("nat"),
            privatesuper: m.get_flag("privatesuper"),
            underlay: m.get_flag("underlay"),
            shared: m.get_flag("shared"),
            labels: parse_labels(&many(m, "label"))?,
        }))
    }
}

fn label_arg() -> Arg {
    Arg::new("label")
        .long("label")
        .value_name("KEY=VALUE")
        .action(ArgAction::Append)
        .help("Label, repeatable")
}

fn usage_cell(n: &NetworkResponse, style: &Style) -> String {
    let u = &n.usage;
    let (used, available) = if n.privatesuper {
        (u.used_prefixes, u.available_prefixes)
    } else {
        (u.used_ips, u.available_ips)
    };
    let cell = format!("{used}/{available}");
    // more than 80 percent used
    if available > 0 && used * 5 > available * 4 {
        style.yellow(&cell)
    } else {
        cell
    }
}

impl TableRow for NetworkResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "NAME", "PROJECT", "PARTITION", "NAT", "SHARED", "PREFIXES", "USAGE"];
        if wide {
            header.extend(["DESTINATION PREFIXES", "VRF", "PRIVATE SUPER", "UNDERLAY", "LABELS"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let yes = |b: bool| if b { "true" } else { "" }.to_owned();
        let mut row = vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            self.projectid.clone().unwrap_or_default(),
            self.partitionid.clone().unwrap_or_default(),
            yes(self.nat),
            yes(self.shared),
            self.prefixes.join("\n"),
            usage_cell(self, style),
        ];
        if wide {
            row.extend([
                self.destinationprefixes.join("\n"),
                self.vrf.map(|v| v.to_string()).unwrap_or_default(),
                yes(self.privatesuper),
                yes(self.underlay),
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

// ── Tree ─────────────────────────────────────────────────────────────

/// Networks with children drawn below their parent network.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct NetworkTree<'a>(pub &'a [NetworkResponse]);

/// Input positions in tree order, each with its branch prefix. Networks
/// whose parent is not listed are roots; input order is kept among
/// siblings.
pub fn tree_order(items: &[NetworkResponse]) -> Vec<(String, usize)> {
    let index: BTreeMap<&str, usize> = items
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let parent_of = |n: &NetworkResponse| {
        n.parentnetworkid
            .as_deref()
            .filter(|p| *p != n.id)
            .and_then(|p| index.get(p).copied())
    };

    let mut visited = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    for root in (0..items.len()).filter(|&i| parent_of(&items[i]).is_none()) {
        visit(items, root, String::new(), "", &parent_of, &mut visited, &mut out);
    }
    // members of a parent cycle are never reached from a root
    for i in 0..items.len() {
        if !visited[i] {
            visit(items, i, String::new(), "", &parent_of, &mut visited, &mut out);
        }
    }
    out
}

fn visit(
    items: &[NetworkResponse],
    at: usize,
    prefix: String,
    indent: &str,
    parent_of: &dyn Fn(&NetworkResponse) -> Option<usize>,
    visited: &mut [bool],
    out: &mut Vec<(String, usize)>,
) {
    if std::mem::replace(&mut visited[at], true) {
        return;
    }
    out.push((prefix, at));
    let children: Vec<usize> = (0..items.len())
        .filter(|&i| i != at && parent_of(&items[i]) == Some(at))
        .collect();
    let last = children.len().saturating_sub(1);
    for (pos, child) in children.into_iter().enumerate() {
        let (glyph, pad) = if pos == last {
            (TREE_LAST, "   ")
        } else {
            (TREE_BRANCH, "│  ")
        };
        let deeper = format!("{indent}{pad}");
        visit(items, child, format!("{indent}{glyph}"), &deeper, parent_of, visited, out);
    }
}

impl Tabular for NetworkTree<'_> {
    fn header_and_rows(&self, wide: bool, style: &Style) -> Table {
        let rows = tree_order(self.0)
            .into_iter()
            .map(|(prefix, i)| {
                let mut row = self.0[i].row(wide, style);
                if let Some(id) = row.first_mut() {
                    id.insert_str(0, &prefix);
                }
                row
            })
            .collect();
        Table {
            header: NetworkResponse::header(wide)
                .into_iter()
                .map(str::to_owned)
                .collect(),
            rows,
        }
    }
}

// ── IPs ──────────────────────────────────────────────────────────────

pub struct Ips;

impl EntityCmd for Ips {
    type Adapter = IpAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "ip",
            plural: "ips",
            about: "Manage IP addresses",
            create_aliases: &["allocate"],
            delete_aliases: &["free"],
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<IpAdapter, CliError> {
        Ok(IpAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<IpResponse> {
        ip_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        ip_find_args(cmd)
    }

    fn filter(m: &ArgMatches) -> Result<IpFindRequest, CliError> {
        Ok(IpFindRequest {
            ipaddress: one(m, "ipaddress"),
            name: one(m, "name"),
            projectid: one(m, "project"),
            networkid: one(m, "network"),
            networkprefix: one(m, "prefix"),
            kind: one(m, "type"),
            machineid: one(m, "machineid"),
            tags: many(m, "tags"),
        })
    }

    fn create_args(cmd: Command) -> Command {
        cmd.arg(
            Arg::new("ipaddress")
                .long("ipaddress")
                .help("Specific address to allocate, any free one when empty"),
        )
        .arg(Arg::new("name").long("name").help("Name"))
        .arg(Arg::new("description").long("description").help("Description"))
        .arg(
            Arg::new("network")
                .long("network")
                .add(ArgValueCandidates::new(completion::ids::<Networks>))
                .help("Network to allocate from"),
        )
        .arg(
            Arg::new("project")
                .long("project")
                .add(ArgValueCandidates::new(completion::ids::<Projects>))
                .help("Owning project"),
        )
        .arg(type_arg().default_value("static"))
        .arg(
            Arg::new("tags")
                .long("tags")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Tags"),
        )
    }

    fn create_from_cli(m: &ArgMatches) -> Result<Option<IpAllocateRequest>, CliError> {
        let Some(networkid) = one(m, "network") else {
            return Ok(None);
        };
        let projectid = one(m, "project")
            .ok_or_else(|| CliError::validation("project", "is required with --network"))?;
        Ok(Some(IpAllocateRequest {
            ipaddress: one(m, "ipaddress"),
            name: one(m, "name"),
            description: one(m, "description"),
            networkid,
            projectid,
            kind: one(m, "type").unwrap_or_default(),
            tags: many(m, "tags"),
            machineid: None,
        }))
    }

    fn update_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("name").long("name").help("New name"))
            .arg(Arg::new("description").long("description").help("New description"))
            .arg(type_arg())
            .arg(
                Arg::new("tags")
                    .long("tags")
                    .action(ArgAction::Append)
                    .value_delimiter(',')
                    .help("Replace all tags"),
            )
    }

    async fn update_from_cli(
        adapter: &IpAdapter,
        id: &str,
        m: &ArgMatches,
    ) -> Result<Option<IpUpdateRequest>, CliError> {
        let tags = many(m, "tags");
        let (name, description, kind) = (one(m, "name"), one(m, "description"), one(m, "type"));
        if name.is_none() && description.is_none() && kind.is_none() && tags.is_empty() {
            return Ok(None);
        }
        let current = adapter.convert(&adapter.get(id).await?)?.update;
        Ok(Some(IpUpdateRequest {
            name: name.or(current.name),
            description: description.or(current.description),
            kind: kind.unwrap_or(current.kind),
            tags: if tags.is_empty() { current.tags } else { tags },
            ipaddress: current.ipaddress,
        }))
    }
}

fn type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .value_parser(clap::builder::PossibleValuesParser::new(IP_TYPES))
        .help("Ephemeral IPs are freed together with their machine")
}

fn ip_find_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("ipaddress").long("ipaddress").help("Address"))
        .arg(Arg::new("name").long("name").help("Name"))
        .arg(
            Arg::new("project")
                .long("project")
                .add(ArgValueCandidates::new(completion::ids::<Projects>))
                .help("Project id"),
        )
        .arg(
            Arg::new("network")
                .long("network")
                .add(ArgValueCandidates::new(completion::ids::<Networks>))
                .help("Network id"),
        )
        .arg(Arg::new("prefix").long("prefix").help("Network prefix"))
        .arg(
            Arg::new("type")
                .long("type")
                .add(ArgValueCandidates::new(completion::fixed(IP_TYPES)))
                .help("ephemeral or static"),
        )
        .arg(Arg::new("machineid").long("machineid").help("Machine the IP is bound to"))
        .arg(
            Arg::new("tags")
                .long("tags")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Tags"),
        )
}

impl TableRow for IpResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["IP", "DESCRIPTION", "NAME", "NETWORK", "PROJECT", "TYPE", "TAGS"];
        if wide {
            header.extend(["ALLOCATION UUID", "CREATED"]);
        }
        header
    }

    fn row(&self, wide: bool, _style: &Style) -> Vec<String> {
        let mut row = vec![
            self.ipaddress.clone(),
            self.description.clone().unwrap_or_default(),
            self.name.clone().unwrap_or_default(),
            self.networkid.clone(),
            self.projectid.clone(),
            self.kind.clone(),
            self.tags.join("\n"),
        ];
        if wide {
            row.extend([
                self.allocationuuid.clone().unwrap_or_default(),
                self.created
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
            ]);
        }
        row
    }
}

impl TableRow for IpIssue {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["IP", "PROJECT", "MACHINE", "ISSUE"]
    }

    fn row(&self, _wide: bool, style: &Style) -> Vec<String> {
        vec![
            self.ipaddress.clone(),
            self.projectid.clone(),
            self.machineid.clone().unwrap_or_default(),
            style.yellow(self.issue),
        ]
    }
}

// ── Command tree ─────────────────────────────────────────────────────

pub fn command() -> Command {
    let ip = generic::command::<Ips>().subcommand(ip_find_args(
        Command::new("issues").about("List IPs bound to missing machines or to nothing"),
    ));
    generic::command::<Networks>()
        .subcommand(
            Command::new("allocate")
                .about("Allocate a child network from the private super network of a partition")
                .arg(Arg::new("name").long("name").help("Name"))
                .arg(Arg::new("description").long("description").help("Description"))
                .arg(
                    Arg::new("partition")
                        .long("partition")
                        .required(true)
                        .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                        .help("Partition"),
                )
                .arg(
                    Arg::new("project")
                        .long("project")
                        .required(true)
                        .add(ArgValueCandidates::new(completion::ids::<Projects>))
                        .help("Project"),
                )
                .arg(
                    Arg::new("shared")
                        .long("shared")
                        .action(ArgAction::SetTrue)
                        .help("Usable from other projects"),
                )
                .arg(label_arg()),
        )
        .subcommand(
            Command::new("free")
                .about("Free an allocated child network")
                .arg(id_arg::<Networks>("Network id").required(true)),
        )
        .subcommand(ip)
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    match m.subcommand() {
        Some(("allocate", sub)) => {
            let req = NetworkAllocateRequest {
                name: one(sub, "name"),
                description: one(sub, "description"),
                partitionid: required(sub, "partition")?.to_owned(),
                projectid: required(sub, "project")?.to_owned(),
                shared: sub.get_flag("shared"),
                labels: parse_labels(&many(sub, "label"))?,
            };
            let network = cfg.client()?.allocate_network(&req).await?;
            cfg.describe_printer().print_one(&network)
        }
        Some(("free", sub)) => {
            let network = cfg.client()?.free_network(required(sub, "id")?).await?;
            cfg.describe_printer().print_one(&network)
        }
        Some(("ip", sub)) => match sub.subcommand() {
            Some(("issues", args)) => ip_issues_cmd(cfg, args).await,
            _ => generic::run::<Ips>(cfg, sub).await,
        },
        _ => generic::run::<Networks>(cfg, m).await,
    }
}

async fn ip_issues_cmd(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let ips = fetch_sorted::<Ips>(cfg, m).await?;
    let machines = MachineAdapter::new(cfg.client()?)
        .list(&Default::default())
        .await?;
    let issues = ip_issues(&ips, machines.iter().map(|m| m.id.as_str()));
    cfg.printer().print(&issues)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::OutputFormat;
    use crate::output::OutputSpec;

    fn net(id: &str, parent: Option<&str>) -> NetworkResponse {
        NetworkResponse {
            id: id.into(),
            parentnetworkid: parent.map(str::to_owned),
            ..NetworkResponse::default()
        }
    }

    #[test]
    fn children_are_drawn_below_their_parent() {
        let items = vec![
            net("internet", None),
            net("tenant-super", None),
            net("child-a", Some("tenant-super")),
            net("child-b", Some("tenant-super")),
        ];
        let printer = Printer::new(OutputSpec {
            format: OutputFormat::Table,
            template: None,
            no_headers: true,
            color: false,
        });
        let out = printer.render(&NetworkTree(&items)).unwrap();
        let ids: Vec<&str> = out
            .lines()
            .map(|l| l.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec!["internet", "tenant-super", "├─╴child-a", "└─╴child-b"]
        );
    }

    #[test]
    fn orphans_and_cycles_are_never_dropped() {
        let items = vec![
            net("orphan", Some("missing")),
            net("a", Some("b")),
            net("b", Some("a")),
        ];
        let order: Vec<usize> = tree_order(&items).into_iter().map(|(_, i)| i).collect();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0], 0);
    }

    #[test]
    fn ip_needs_a_project() {
        let cmd = Ips::create_args(Command::new("create"));
        let m = cmd
            .clone()
            .try_get_matches_from(["create", "--network", "internet"])
            .unwrap();
        assert!(Ips::create_from_cli(&m).is_err());
        let m = cmd
            .try_get_matches_from(["create", "--network", "internet", "--project", "p"])
            .unwrap();
        assert_eq!(Ips::create_from_cli(&m).unwrap().unwrap().kind, "static");
    }

    #[test]
    fn ip_tree_has_allocate_and_free() {
        let cmd = command();
        let ip = cmd.find_subcommand("ip").unwrap();
        let create = ip.find_subcommand("create").unwrap();
        assert!(create.get_all_aliases().any(|a| a == "allocate"));
        assert!(ip.find_subcommand("issues").is_some());
    }
}
