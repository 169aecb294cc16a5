//! `metalctl firmware`, `health`, `version` and `vpn`

use clap::{Arg, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;
use serde::Serialize;
use tracing::{debug, warn};

use metal_api::V2Version;
use metal_api::models::{
    Firmware, FirmwareFilter, HealthResponse, VersionResponse, VpnAuthKeyRequest,
    VpnAuthKeyResponse,
};

use crate::commands::machine::Machines;
use crate::commands::project::Projects;
use crate::commands::util::one;
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{confirm_or_force, required};
use crate::output::{Style, Table, TableRow, Tabular};

const FIRMWARE_KINDS: &[&str] = &["bios", "bmc"];

// ── Firmware ─────────────────────────────────────────────────────────

impl TableRow for Firmware {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["KIND", "VENDOR", "BOARD", "REVISION"]
    }

    fn row(&self, _wide: bool, _style: &Style) -> Vec<String> {
        vec![
            self.kind.clone(),
            self.vendor.clone(),
            self.board.clone(),
            self.revision.clone(),
        ]
    }
}

fn kind_arg() -> Arg {
    Arg::new("kind")
        .long("kind")
        .value_parser(clap::builder::PossibleValuesParser::new(FIRMWARE_KINDS))
        .help("Firmware kind")
}

fn firmware_id_args(cmd: Command) -> Command {
    cmd.arg(kind_arg().required(true))
        .arg(Arg::new("vendor").long("vendor").required(true).help("Vendor"))
        .arg(Arg::new("board").long("board").required(true).help("Board"))
        .arg(Arg::new("revision").long("revision").required(true).help("Revision"))
}

pub fn firmware_command() -> Command {
    Command::new("firmware")
        .about("Manage BIOS and BMC firmware")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .visible_alias("ls")
                .about("List available firmware revisions")
                .arg(kind_arg())
                .arg(Arg::new("vendor").long("vendor").help("Vendor"))
                .arg(Arg::new("board").long("board").help("Board"))
                .arg(
                    Arg::new("machineid")
                        .long("machineid")
                        .add(ArgValueCandidates::new(completion::ids::<Machines>))
                        .help("Only revisions applicable to this machine"),
                ),
        )
        .subcommand(
            firmware_id_args(Command::new("upload").about("Upload a firmware file")).arg(
                Arg::new("file")
                    .long("file")
                    .short('f')
                    .required(true)
                    .value_name("PATH")
                    .help("Firmware file"),
            ),
        )
        .subcommand(
            firmware_id_args(
                Command::new("remove")
                    .visible_alias("rm")
                    .about("Remove a firmware revision"),
            ),
        )
}

pub async fn run_firmware(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let Some((verb, sub)) = m.subcommand() else {
        return Err(CliError::validation("command", "missing subcommand"));
    };
    match verb {
        "list" => {
            let filter = FirmwareFilter {
                kind: one(sub, "kind"),
                vendor: one(sub, "vendor"),
                board: one(sub, "board"),
                machineid: one(sub, "machineid"),
            };
            let firmwares = cfg.client()?.list_firmwares(&filter).await?.flatten();
            cfg.printer().print(&firmwares)
        }
        "upload" => {
            let path = required(sub, "file")?;
            let content = tokio::fs::read(path).await?;
            let file_name = std::path::Path::new(path)
                .file_name()
                .map_or_else(|| path.to_owned(), |n| n.to_string_lossy().into_owned());
            let (kind, vendor, board, revision) = firmware_key(sub)?;
            cfg.client()?
                .upload_firmware(kind, vendor, board, revision, file_name, content)
                .await?;
            eprintln!("uploaded {kind} firmware {vendor}/{board} {revision}");
            Ok(())
        }
        "remove" => {
            let (kind, vendor, board, revision) = firmware_key(sub)?;
            confirm_or_force(cfg, &format!("remove {kind} firmware {vendor}/{board} {revision}?"))?;
            cfg.client()?
                .remove_firmware(kind, vendor, board, revision)
                .await?;
            eprintln!("removed {kind} firmware {vendor}/{board} {revision}");
            Ok(())
        }
        other => Err(CliError::validation(
            "command",
            format!("unknown subcommand 'firmware {other}'"),
        )),
    }
}

fn firmware_key(m: &ArgMatches) -> Result<(&str, &str, &str, &str), CliError> {
    Ok((
        required(m, "kind")?,
        required(m, "vendor")?,
        required(m, "board")?,
        required(m, "revision")?,
    ))
}

// ── Health ───────────────────────────────────────────────────────────

fn status_cell(status: &str, style: &Style) -> String {
    match status {
        "healthy" => style.green(status),
        "degraded" => style.yellow(status),
        "unhealthy" => style.red(status),
        other => other.to_owned(),
    }
}

impl TableRow for HealthResponse {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["SERVICE", "STATUS", "MESSAGE"]
    }

    fn row(&self, _wide: bool, style: &Style) -> Vec<String> {
        vec![
            style.bold("overall"),
            status_cell(&self.status, style),
            self.message.clone(),
        ]
    }
}

/// The overall status followed by one row per service.
#[derive(Debug, Serialize)]
#[serde(transparent)]
struct HealthReport(HealthResponse);

impl Tabular for HealthReport {
    fn header_and_rows(&self, wide: bool, style: &Style) -> Table {
        let mut rows = vec![self.0.row(wide, style)];
        rows.extend(self.0.services.iter().map(|(name, result)| {
            vec![
                name.clone(),
                status_cell(&result.status, style),
                result.message.clone(),
            ]
        }));
        Table {
            header: HealthResponse::header(wide)
                .into_iter()
                .map(str::to_owned)
                .collect(),
            rows,
        }
    }
}

pub fn health_command() -> Command {
    Command::new("health").about("Show the health of the metal-api and its services")
}

pub async fn run_health(cfg: &Config) -> Result<(), CliError> {
    let health = cfg.client()?.health().await?;
    cfg.printer().print(&HealthReport(health))
}

// ── Version ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionReport {
    pub client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<VersionResponse>,
    #[serde(rename = "server-v2", skip_serializing_if = "Option::is_none")]
    pub server_v2: Option<V2Version>,
}

impl TableRow for VersionReport {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["CLIENT", "SERVER", "SERVER V2", "MIN CLIENT"]
    }

    fn row(&self, _wide: bool, style: &Style) -> Vec<String> {
        let server = self.server.as_ref();
        vec![
            self.client.clone(),
            server.map_or_else(|| style.dimmed("unreachable"), |s| s.version.clone()),
            self.server_v2
                .as_ref()
                .map(|v| v.version.clone())
                .unwrap_or_default(),
            server.map(|s| s.min_client_version.clone()).unwrap_or_default(),
        ]
    }
}

pub fn version_command() -> Command {
    Command::new("version").about("Show client and server versions")
}

pub async fn run_version(cfg: &Config) -> Result<(), CliError> {
    let mut report = VersionReport {
        client: env!("CARGO_PKG_VERSION").to_owned(),
        ..VersionReport::default()
    };
    match cfg.client() {
        Ok(client) => match client.version().await {
            Ok(version) => report.server = Some(version),
            Err(err) => warn!(%err, "server version unavailable"),
        },
        Err(err) => debug!(%err, "no metal-api configured"),
    }
    if let Some(v2) = cfg.v2_client()? {
        match v2.version().await {
            Ok(version) => report.server_v2 = Some(version),
            Err(err) => warn!(%err, "v2 server version unavailable"),
        }
    }
    cfg.describe_printer().print_one(&report)
}

// ── VPN ──────────────────────────────────────────────────────────────

impl TableRow for VpnAuthKeyResponse {
    fn header(_wide: bool) -> Vec<&'static str> {
        vec!["ADDRESS", "AUTH KEY", "EPHEMERAL", "EXPIRES"]
    }

    fn row(&self, _wide: bool, _style: &Style) -> Vec<String> {
        vec![
            self.address.clone(),
            self.authkey.clone(),
            self.ephemeral.to_string(),
            self.expires.clone(),
        ]
    }
}

/// Parse `90s`, `30m`, `12h` or `7d` into nanoseconds.
pub fn parse_expiry(raw: &str) -> Result<i64, CliError> {
    let invalid = || CliError::validation("expires", format!("'{raw}' is not a duration like 1h or 7d"));
    let raw = raw.trim();
    let split = raw.len().checked_sub(1).ok_or_else(invalid)?;
    let (digits, unit) = raw.split_at(split);
    let value: i64 = digits.parse().map_err(|_| invalid())?;
    let seconds = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => return Err(invalid()),
    };
    value
        .checked_mul(seconds * 1_000_000_000)
        .filter(|n| *n > 0)
        .ok_or_else(invalid)
}

pub fn vpn_command() -> Command {
    Command::new("vpn")
        .about("Access machines of a project through the VPN")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("key")
                .about("Issue an auth key to join the VPN of a project")
                .arg(
                    Arg::new("project")
                        .long("project")
                        .required(true)
                        .add(ArgValueCandidates::new(completion::ids::<Projects>))
                        .help("Project id"),
                )
                .arg(
                    Arg::new("ephemeral")
                        .long("ephemeral")
                        .action(clap::ArgAction::SetTrue)
                        .help("Node is removed from the VPN once it goes offline"),
                )
                .arg(
                    Arg::new("expires")
                        .long("expires")
                        .default_value("1h")
                        .help("Validity of the key, e.g. 1h or 7d"),
                ),
        )
}

pub async fn run_vpn(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let sub = match m.subcommand() {
        Some(("key", sub)) => sub,
        Some((other, _)) => {
            return Err(CliError::validation(
                "command",
                format!("unknown subcommand 'vpn {other}'"),
            ));
        }
        None => return Err(CliError::validation("command", "missing subcommand")),
    };
    let req = VpnAuthKeyRequest {
        pid: required(sub, "project")?.to_owned(),
        ephemeral: sub.get_flag("ephemeral"),
        expires: one(sub, "expires").as_deref().map(parse_expiry).transpose()?,
    };
    let key = cfg.client()?.vpn_auth_key(&req).await?;
    cfg.describe_printer().print_one(&key)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use metal_api::models::HealthResult;
    use pretty_assertions::assert_eq;

    use super::*;

    fn offline_config(dir: &std::path::Path) -> Config {
        let path = dir.join("config.yaml");
        std::fs::write(&path, "").unwrap();
        Config::new(crate::cli::GlobalOpts {
            config: Some(path),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn unknown_subcommands_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = offline_config(dir.path());

        let m = Command::new("firmware")
            .subcommand(Command::new("flash"))
            .get_matches_from(["firmware", "flash"]);
        let err = run_firmware(&cfg, &m).await.unwrap_err();
        assert!(
            matches!(&err, CliError::Validation { reason, .. } if reason.contains("firmware flash")),
            "{err}"
        );

        let m = Command::new("vpn").get_matches_from(["vpn"]);
        let err = run_vpn(&cfg, &m).await.unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }), "{err}");
    }

    #[test]
    fn expiry_units() {
        assert_eq!(parse_expiry("90s").unwrap(), 90_000_000_000);
        assert_eq!(parse_expiry("1h").unwrap(), 3_600_000_000_000);
        assert_eq!(parse_expiry("2d").unwrap(), 172_800_000_000_000);
        assert!(parse_expiry("h").is_err());
        assert!(parse_expiry("").is_err());
        assert!(parse_expiry("5w").is_err());
        assert!(parse_expiry("0m").is_err());
    }

    #[test]
    fn health_lists_overall_then_services() {
        let health = HealthResponse {
            status: "degraded".into(),
            message: "one service is down".into(),
            services: BTreeMap::from([
                (
                    "ipam".to_owned(),
                    HealthResult {
                        status: "healthy".into(),
                        message: String::new(),
                    },
                ),
                (
                    "rethinkdb".to_owned(),
                    HealthResult {
                        status: "unhealthy".into(),
                        message: "connection refused".into(),
                    },
                ),
            ]),
        };
        let table = HealthReport(health).header_and_rows(false, &Style::plain());
        let names: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["overall", "ipam", "rethinkdb"]);
        assert_eq!(table.rows[2][1], "unhealthy");
    }

    #[test]
    fn firmware_remove_needs_the_full_key() {
        let cmd = firmware_command();
        assert!(
            cmd.clone()
                .try_get_matches_from(["firmware", "remove", "--kind", "bios"])
                .is_err()
        );
        assert!(
            cmd.try_get_matches_from([
                "firmware", "remove", "--kind", "bios", "--vendor", "sm", "--board", "X11",
                "--revision", "2.1",
            ])
            .is_ok()
        );
    }

    #[test]
    fn version_without_server_is_marked() {
        let report = VersionReport {
            client: "1.0.0".into(),
            ..VersionReport::default()
        };
        let row = report.row(false, &Style::plain());
        assert_eq!(row[0], "1.0.0");
        assert_eq!(row[1], "unreachable");
    }
}
