//! `metalctl audit`

use chrono::{DateTime, TimeDelta, Utc};
use clap::{Arg, ArgMatches, Command};

use metal_api::models::{AuditFindRequest, AuditResponse};
use metalctl_core::Sorter;
use metalctl_core::entities::{AuditAdapter, audit_sorter};

use crate::commands::util::one;
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd};
use crate::output::{Style, TableRow};

pub struct AuditTraces;

impl EntityCmd for AuditTraces {
    type Adapter = AuditAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "audit",
            plural: "audit traces",
            about: "Search the audit trail of API requests",
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<AuditAdapter, CliError> {
        Ok(AuditAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<AuditResponse> {
        audit_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("request-id").long("request-id").help("Request id"))
            .arg(Arg::new("user").long("user").help("User who sent the request"))
            .arg(Arg::new("tenant").long("tenant").help("Tenant of the user"))
            .arg(Arg::new("project").long("project").help("Project of the request"))
            .arg(Arg::new("path").long("path").help("Request path"))
            .arg(
                Arg::new("phase")
                    .long("phase")
                    .add(clap_complete::engine::ArgValueCandidates::new(
                        completion::fixed(&["request", "response", "single", "error", "opened", "closed"]),
                    ))
                    .help("Trace phase"),
            )
            .arg(Arg::new("component").long("component").help("Emitting component"))
            .arg(
                Arg::new("status-code")
                    .long("status-code")
                    .value_parser(clap::value_parser!(u16))
                    .help("HTTP status code"),
            )
            .arg(
                Arg::new("from")
                    .long("from")
                    .default_value("1h")
                    .help("Start of the window, RFC 3339 or an age like 30m, 2h, 1d"),
            )
            .arg(Arg::new("to").long("to").help("End of the window, same syntax as --from"))
            .arg(
                Arg::new("limit")
                    .long("limit")
                    .value_parser(clap::value_parser!(u32))
                    .default_value("100")
                    .help("Maximum number of traces"),
            )
    }

    fn filter(m: &ArgMatches) -> Result<AuditFindRequest, CliError> {
        let now = Utc::now();
        let point = |name: &str| -> Result<Option<DateTime<Utc>>, CliError> {
            one(m, name)
                .map(|raw| parse_point(&raw, now).map_err(|reason| CliError::validation(name, reason)))
                .transpose()
        };
        Ok(AuditFindRequest {
            rqid: one(m, "request-id"),
            user: one(m, "user"),
            tenant: one(m, "tenant"),
            project: one(m, "project"),
            path: one(m, "path"),
            phase: one(m, "phase"),
            component: one(m, "component"),
            status_code: m.get_one::<u16>("status-code").copied(),
            from: point("from")?,
            to: point("to")?,
            limit: m.get_one::<u32>("limit").copied(),
        })
    }
}

/// An absolute RFC 3339 time, or an age before `now` like `90s`, `30m`, `2h`, `1d`.
pub fn parse_point(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    let raw = raw.trim();
    let split = raw.char_indices().last().map_or(0, |(i, _)| i);
    let (digits, unit) = raw.split_at(split);
    let n: i64 = digits
        .parse()
        .map_err(|_| format!("'{raw}' is neither RFC 3339 nor an age like 2h"))?;
    let age = match unit {
        "s" => TimeDelta::try_seconds(n),
        "m" => TimeDelta::try_minutes(n),
        "h" => TimeDelta::try_hours(n),
        "d" => TimeDelta::try_days(n),
        _ => None,
    }
    .ok_or_else(|| format!("'{raw}' has an unknown unit, use s, m, h or d"))?;
    Ok(now - age)
}

impl TableRow for AuditResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["TIME", "REQUEST ID", "COMPONENT", "PATH", "PHASE", "USER", "CODE"];
        if wide {
            header.extend(["TENANT", "PROJECT", "REMOTE ADDR", "ERROR"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let code = self.status_code.map(|c| c.to_string()).unwrap_or_default();
        let code = if self.status_code.is_some_and(|c| c >= 400) {
            style.red(&code)
        } else {
            code
        };
        let mut row = vec![
            self.timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            self.rqid.clone(),
            self.component.clone(),
            self.path.clone(),
            self.phase.clone(),
            self.user.clone(),
            code,
        ];
        if wide {
            row.extend([
                self.tenant.clone(),
                self.project.clone().unwrap_or_default(),
                self.remote_addr.clone().unwrap_or_default(),
                self.error.clone().unwrap_or_default(),
            ]);
        }
        row
    }
}

pub fn command() -> Command {
    generic::command::<AuditTraces>()
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    generic::run::<AuditTraces>(cfg, m).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn points_accept_ages_and_timestamps() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            parse_point("2h", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_point("2024-04-30T00:00:00Z", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 30, 0, 0, 0).unwrap()
        );
        assert!(parse_point("2w", now).is_err());
        assert!(parse_point("soon", now).is_err());
    }

    #[test]
    fn only_list_and_describe_are_offered() {
        let cmd = command();
        let verbs: Vec<&str> = cmd.get_subcommands().map(Command::get_name).collect();
        assert_eq!(verbs, vec!["list", "describe"]);
    }
}
