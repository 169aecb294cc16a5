//! `metalctl switch`

use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;
use serde::Serialize;

use metal_api::models::{
    SwitchFindRequest, SwitchNic, SwitchPortToggleRequest, SwitchResponse, SwitchUpdateRequest,
};
use metalctl_core::Sorter;
use metalctl_core::entities::{SwitchAdapter, switch_sorter};

use crate::commands::partition::Partitions;
use crate::commands::util::{one, spawn};
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd, fetch_sorted, id_arg, required};
use crate::output::{Style, TableRow, humanize};

pub struct Switches;

impl EntityCmd for Switches {
    type Adapter = SwitchAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "switch",
            plural: "switches",
            aliases: &["sw"],
            about: "Manage leaf and spine switches",
            long_about: Some("Switches register themselves, so they can not be created."),
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<SwitchAdapter, CliError> {
        Ok(SwitchAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<SwitchResponse> {
        switch_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("id").long("id").help("Switch id"))
            .arg(Arg::new("name").long("name").help("Switch name"))
            .arg(
                Arg::new("partition")
                    .long("partition")
                    .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                    .help("Partition id"),
            )
            .arg(Arg::new("rack").long("rack").help("Rack id"))
            .arg(
                Arg::new("os-vendor")
                    .long("os-vendor")
                    .add(ArgValueCandidates::new(completion::fixed(&["SONiC", "Cumulus"])))
                    .help("Operating system vendor"),
            )
            .arg(Arg::new("os-version").long("os-version").help("Operating system version"))
    }

    fn filter(m: &ArgMatches) -> Result<SwitchFindRequest, CliError> {
        Ok(SwitchFindRequest {
            id: one(m, "id"),
            name: one(m, "name"),
            partition_id: one(m, "partition"),
            rack_id: one(m, "rack"),
            os_vendor: one(m, "os-vendor"),
            os_version: one(m, "os-version"),
        })
    }

    fn update_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("description").long("description").help("New description"))
            .arg(Arg::new("management-ip").long("management-ip").help("Management address"))
            .arg(Arg::new("management-user").long("management-user").help("Management user"))
            .arg(
                Arg::new("console-command")
                    .long("console-command")
                    .help("Command that opens the serial console"),
            )
    }

    async fn update_from_cli(
        _adapter: &SwitchAdapter,
        id: &str,
        m: &ArgMatches,
    ) -> Result<Option<SwitchUpdateRequest>, CliError> {
        let req = SwitchUpdateRequest {
            id: id.to_owned(),
            description: one(m, "description"),
            management_ip: one(m, "management-ip"),
            management_user: one(m, "management-user"),
            console_command: one(m, "console-command"),
            ..SwitchUpdateRequest::default()
        };
        let changed = req.description.is_some()
            || req.management_ip.is_some()
            || req.management_user.is_some()
            || req.console_command.is_some();
        Ok(changed.then_some(req))
    }

    fn delete_args(cmd: Command) -> Command {
        cmd.arg(
            Arg::new("force-delete")
                .long("force-delete")
                .action(ArgAction::SetTrue)
                .help("Delete even when machines are still connected"),
        )
    }

    fn delete_adapter(adapter: SwitchAdapter, m: &ArgMatches) -> SwitchAdapter {
        adapter.force_delete(m.get_flag("force-delete"))
    }
}

/// `error` when the last sync failed after the last success.
fn sync_state(s: &SwitchResponse) -> &'static str {
    let ok = s.last_sync.as_ref().and_then(|l| l.time);
    let failed = s.last_sync_error.as_ref().and_then(|l| l.time);
    match (ok, failed) {
        (_, None) => "ok",
        (Some(ok), Some(failed)) if ok > failed => "ok",
        _ => "error",
    }
}

impl TableRow for SwitchResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "PARTITION", "RACK", "OS", "STATUS", "LAST SYNC"];
        if wide {
            header.extend(["VERSION", "METAL-CORE", "MGMT IP", "MODE", "LAST ERROR"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let status = match sync_state(self) {
            "ok" => style.green("ok"),
            other => style.red(other),
        };
        let mut row = vec![
            self.id.clone(),
            self.partition
                .as_ref()
                .map(|p| p.id.clone())
                .unwrap_or_default(),
            self.rack_id.clone(),
            self.os.vendor.clone(),
            status,
            humanize::age(
                self.last_sync.as_ref().and_then(|s| s.time.as_ref()),
                Utc::now(),
            ),
        ];
        if wide {
            row.extend([
                self.os.version.clone(),
                self.os.metal_core_version.clone(),
                self.management_ip.clone(),
                self.mode.clone(),
                self.last_sync_error
                    .as_ref()
                    .and_then(|e| e.error.clone())
                    .unwrap_or_default(),
            ]);
        }
        row
    }
}

// ── Ports ────────────────────────────────────────────────────────────

/// One switch port with the machine connected to it.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchPort {
    pub switch: String,
    pub partition: String,
    pub rack: String,
    pub port: String,
    pub identifier: String,
    pub vrf: String,
    pub actual: String,
    pub machine: String,
    pub cidrs: Vec<String>,
    pub vnis: Vec<String>,
}

impl SwitchPort {
    fn from_nic(switch: &SwitchResponse, nic: &SwitchNic) -> Self {
        let filter = nic.filter.clone().unwrap_or_default();
        Self {
            switch: switch.id.clone(),
            partition: switch
                .partition
                .as_ref()
                .map(|p| p.id.clone())
                .unwrap_or_default(),
            rack: switch.rack_id.clone(),
            port: nic.name.clone(),
            identifier: nic.identifier.clone().unwrap_or_default(),
            vrf: nic.vrf.clone().unwrap_or_default(),
            actual: nic.actual.clone().unwrap_or_default(),
            machine: switch
                .connections
                .iter()
                .find(|c| c.nic.name == nic.name)
                .map(|c| c.machine_id.clone())
                .unwrap_or_default(),
            cidrs: filter.cidrs,
            vnis: filter.vnis,
        }
    }
}

/// Every port of every listed switch, sorted by switch and port name.
pub fn switch_detail(switches: &[SwitchResponse]) -> Vec<SwitchPort> {
    let mut ports: Vec<SwitchPort> = switches
        .iter()
        .flat_map(|s| s.nics.iter().map(move |nic| SwitchPort::from_nic(s, nic)))
        .collect();
    ports.sort_by(|a, b| (&a.switch, &a.port).cmp(&(&b.switch, &b.port)));
    ports
}

impl TableRow for SwitchPort {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["PARTITION", "RACK", "SWITCH", "PORT", "STATE", "MACHINE", "VRF"];
        if wide {
            header.extend(["IDENTIFIER", "CIDRS", "VNIS"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let state = match self.actual.as_str() {
            "UP" => style.green("UP"),
            "DOWN" => style.red("DOWN"),
            other => other.to_owned(),
        };
        let mut row = vec![
            self.partition.clone(),
            self.rack.clone(),
            self.switch.clone(),
            self.port.clone(),
            state,
            self.machine.clone(),
            self.vrf.clone(),
        ];
        if wide {
            row.extend([
                self.identifier.clone(),
                self.cidrs.join("\n"),
                self.vnis.join(", "),
            ]);
        }
        row
    }
}

fn port_of(switch: &SwitchResponse, port: &str) -> Result<SwitchPort, CliError> {
    switch
        .nics
        .iter()
        .find(|n| n.name == port)
        .map(|nic| SwitchPort::from_nic(switch, nic))
        .ok_or_else(|| CliError::NotFound {
            message: format!("port {port} on switch {}", switch.id),
        })
}

// ── Command tree ─────────────────────────────────────────────────────

fn switch_id() -> Arg {
    id_arg::<Switches>("Switch id").required(true)
}

fn port_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name).about(about).arg(switch_id()).arg(
        Arg::new("port")
            .long("port")
            .required(true)
            .help("Port name, e.g. Ethernet0"),
    )
}

pub fn command() -> Command {
    generic::command::<Switches>()
        .subcommand(Switches::list_args(
            Command::new("detail").about("List the ports of all matching switches"),
        ))
        .subcommand(
            Command::new("replace")
                .about("Put a switch into replace mode so a new one can take over")
                .arg(switch_id()),
        )
        .subcommand(
            Command::new("port")
                .about("Inspect or toggle a switch port")
                .subcommand_required(true)
                .subcommand(port_command("up", "Bring a port up"))
                .subcommand(port_command("down", "Take a port down"))
                .subcommand(port_command("describe", "Show one port")),
        )
        .subcommand(
            Command::new("ssh")
                .about("Connect to the management address of a switch")
                .arg(switch_id()),
        )
        .subcommand(
            Command::new("console")
                .about("Run the configured console command of a switch")
                .arg(switch_id()),
        )
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    match m.subcommand() {
        Some(("detail", sub)) => {
            let switches = fetch_sorted::<Switches>(cfg, sub).await?;
            cfg.printer().print(&switch_detail(&switches))
        }
        Some(("replace", sub)) => {
            let switch = cfg.client()?.replace_switch(required(sub, "id")?).await?;
            cfg.printer().print_one(&switch)
        }
        Some(("port", sub)) => port(cfg, sub).await,
        Some(("ssh", sub)) => {
            let switch = cfg.client()?.get_switch(required(sub, "id")?).await?;
            if switch.management_ip.is_empty() {
                return Err(CliError::validation("switch", "has no management address"));
            }
            let target = if switch.management_user.is_empty() {
                switch.management_ip
            } else {
                format!("{}@{}", switch.management_user, switch.management_ip)
            };
            spawn("ssh", &[target])
        }
        Some(("console", sub)) => {
            let switch = cfg.client()?.get_switch(required(sub, "id")?).await?;
            let command = switch.console_command.unwrap_or_default();
            let mut words = command.split_whitespace().map(str::to_owned);
            let program = words
                .next()
                .ok_or_else(|| CliError::validation("switch", "has no console command"))?;
            spawn(&program, &words.collect::<Vec<_>>())
        }
        _ => generic::run::<Switches>(cfg, m).await,
    }
}

async fn port(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let Some((action, sub)) = m.subcommand() else {
        return Err(CliError::validation("port", "missing action"));
    };
    let (id, name) = (required(sub, "id")?, required(sub, "port")?);
    let client = cfg.client()?;
    let switch = match action {
        "up" | "down" => {
            let req = SwitchPortToggleRequest {
                nic: name.to_owned(),
                status: action.to_uppercase(),
            };
            client.toggle_switch_port(id, &req).await?
        }
        _ => client.get_switch(id).await?,
    };
    cfg.printer().print_one(&port_of(&switch, name)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;
    use metal_api::models::{SwitchConnection, SwitchSync};
    use pretty_assertions::assert_eq;

    use super::*;

    fn nic(name: &str, actual: &str) -> SwitchNic {
        SwitchNic {
            name: name.into(),
            actual: Some(actual.into()),
            ..SwitchNic::default()
        }
    }

    #[test]
    fn detail_joins_connected_machines() {
        let switch = SwitchResponse {
            id: "leaf01".into(),
            nics: vec![nic("Ethernet4", "DOWN"), nic("Ethernet0", "UP")],
            connections: vec![SwitchConnection {
                machine_id: "m1".into(),
                nic: nic("Ethernet0", "UP"),
            }],
            ..SwitchResponse::default()
        };
        let ports = switch_detail(&[switch]);
        assert_eq!(ports[0].port, "Ethernet0");
        assert_eq!(ports[0].machine, "m1");
        assert_eq!(ports[1].machine, "");
    }

    #[test]
    fn newer_errors_mark_the_switch() {
        let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
        let sync = |h| SwitchSync {
            time: Some(at(h)),
            ..SwitchSync::default()
        };
        let mut switch = SwitchResponse {
            last_sync: Some(sync(2)),
            ..SwitchResponse::default()
        };
        assert_eq!(sync_state(&switch), "ok");
        switch.last_sync_error = Some(sync(1));
        assert_eq!(sync_state(&switch), "ok");
        switch.last_sync_error = Some(sync(3));
        assert_eq!(sync_state(&switch), "error");
    }

    #[test]
    fn switches_can_not_be_created() {
        let cmd = command();
        assert!(cmd.find_subcommand("create").is_none());
        assert!(cmd.find_subcommand("apply").is_none());
        let delete = cmd.find_subcommand("delete").unwrap();
        assert!(delete.get_arguments().any(|a| a.get_id() == "force-delete"));
    }
}
