//! `metalctl image`

use chrono::{DateTime, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;
use serde::Serialize;

use metal_api::models::{ImageCreateRequest, ImageFilter, ImageResponse, ImageUpdateRequest};
use metalctl_core::Sorter;
use metalctl_core::entities::{ImageAdapter, image_sorter};

use crate::commands::util::{many, one, parse_labels};
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd};
use crate::output::{Printer, Style, TableRow, humanize};

const CLASSIFICATIONS: &[&str] = &["preview", "supported", "deprecated", "unsupported"];
const FEATURES: &[&str] = &["machine", "firewall"];

pub struct Images;

impl EntityCmd for Images {
    type Adapter = ImageAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "image",
            plural: "images",
            aliases: &["img"],
            about: "Manage operating system images",
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<ImageAdapter, CliError> {
        Ok(ImageAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<ImageResponse> {
        image_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("id").long("id").help("Image id"))
            .arg(Arg::new("name").long("name").help("Image name"))
            .arg(Arg::new("os").long("os").help("Operating system, the id before the last dash"))
            .arg(
                Arg::new("os-version")
                    .long("os-version")
                    .help("Version, the id after the last dash"),
            )
            .arg(
                Arg::new("classification")
                    .long("classification")
                    .add(ArgValueCandidates::new(completion::fixed(CLASSIFICATIONS)))
                    .help("Classification"),
            )
            .arg(
                Arg::new("feature")
                    .long("feature")
                    .add(ArgValueCandidates::new(completion::fixed(FEATURES)))
                    .help("Required feature"),
            )
            .arg(
                Arg::new("show-usage")
                    .long("show-usage")
                    .action(ArgAction::SetTrue)
                    .help("Also show the machines running each image"),
            )
    }

    fn filter(m: &ArgMatches) -> Result<ImageFilter, CliError> {
        Ok(ImageFilter {
            id: one(m, "id"),
            name: one(m, "name"),
            os: one(m, "os"),
            version: one(m, "os-version"),
            classification: one(m, "classification"),
            feature: one(m, "feature"),
            show_usage: m.get_flag("show-usage"),
        })
    }

    fn print_list(printer: &Printer, items: &[ImageResponse]) -> Result<(), CliError> {
        if items.iter().any(|i| !i.usedby.is_empty()) {
            let usage: Vec<ImageUsage<'_>> = items.iter().map(ImageUsage).collect();
            return printer.print(&usage);
        }
        printer.print(items)
    }

    fn create_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("id").long("id").help("Image id like ubuntu-24.04"))
            .arg(Arg::new("name").long("name").help("Name"))
            .arg(Arg::new("description").long("description").help("Description"))
            .arg(Arg::new("url").long("url").help("Download URL of the image"))
            .arg(
                Arg::new("features")
                    .long("features")
                    .action(ArgAction::Append)
                    .value_delimiter(',')
                    .add(ArgValueCandidates::new(completion::fixed(FEATURES)))
                    .help("Features, machine and/or firewall"),
            )
            .arg(
                Arg::new("classification")
                    .long("classification")
                    .add(ArgValueCandidates::new(completion::fixed(CLASSIFICATIONS)))
                    .help("Classification"),
            )
            .arg(
                Arg::new("expiration")
                    .long("expiration")
                    .help("Expiration date, RFC 3339"),
            )
            .arg(
                Arg::new("label")
                    .long("label")
                    .value_name("KEY=VALUE")
                    .action(ArgAction::Append)
                    .help("Label, repeatable"),
            )
    }

    fn create_from_cli(m: &ArgMatches) -> Result<Option<ImageCreateRequest>, CliError> {
        let Some(id) = one(m, "id") else {
            return Ok(None);
        };
        let url = one(m, "url").ok_or_else(|| CliError::validation("url", "is required with --id"))?;
        Ok(Some(ImageCreateRequest {
            id,
            name: one(m, "name"),
            description: one(m, "description"),
            url,
            features: many(m, "features"),
            classification: one(m, "classification"),
            expiration_date: expiration(m)?,
            labels: parse_labels(&many(m, "label"))?,
        }))
    }

    fn update_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("description").long("description").help("New description"))
            .arg(
                Arg::new("classification")
                    .long("classification")
                    .add(ArgValueCandidates::new(completion::fixed(CLASSIFICATIONS)))
                    .help("New classification"),
            )
            .arg(
                Arg::new("expiration")
                    .long("expiration")
                    .help("New expiration date, RFC 3339"),
            )
    }

    async fn update_from_cli(
        _adapter: &ImageAdapter,
        id: &str,
        m: &ArgMatches,
    ) -> Result<Option<ImageUpdateRequest>, CliError> {
        let req = ImageUpdateRequest {
            id: id.to_owned(),
            description: one(m, "description"),
            classification: one(m, "classification"),
            expiration_date: expiration(m)?,
            ..ImageUpdateRequest::default()
        };
        let unchanged = req.description.is_none()
            && req.classification.is_none()
            && req.expiration_date.is_none();
        Ok((!unchanged).then_some(req))
    }
}

fn expiration(m: &ArgMatches) -> Result<Option<DateTime<Utc>>, CliError> {
    one(m, "expiration")
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| CliError::validation("expiration", e.to_string()))
        })
        .transpose()
}

/// Remaining lifetime, or `expired`.
fn expires_in(date: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match date {
        None => String::new(),
        Some(t) if *t <= now => "expired".to_owned(),
        Some(t) => humanize::duration(*t - now),
    }
}

impl TableRow for ImageResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "NAME", "DESCRIPTION", "FEATURES", "EXPIRATION", "STATUS"];
        if wide {
            header.extend(["URL", "LABELS"]);
        }
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let status = self.classification.clone().unwrap_or_default();
        let status = match status.as_str() {
            "deprecated" | "unsupported" => style.yellow(&status),
            _ => status,
        };
        let mut row = vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
            self.features.join(", "),
            expires_in(self.expiration_date.as_ref(), Utc::now()),
            status,
        ];
        if wide {
            row.extend([
                self.url.clone(),
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

/// Image row with a usage column, for `list --show-usage`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
struct ImageUsage<'a>(&'a ImageResponse);

impl TableRow for ImageUsage<'_> {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = ImageResponse::header(wide);
        header.push("USED BY");
        header
    }

    fn row(&self, wide: bool, style: &Style) -> Vec<String> {
        let mut row = self.0.row(wide, style);
        let used = &self.0.usedby;
        row.push(if wide || used.len() <= 3 {
            used.join("\n")
        } else {
            format!("{} machines", used.len())
        });
        row
    }
}

pub fn command() -> Command {
    generic::command::<Images>()
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    generic::run::<Images>(cfg, m).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::{TimeDelta, TimeZone};

    use super::*;

    #[test]
    fn expiration_is_relative() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let later = now + TimeDelta::days(3) + TimeDelta::hours(2);
        assert_eq!(expires_in(Some(&later), now), "3d 2h");
        assert_eq!(expires_in(Some(&now), now), "expired");
        assert_eq!(expires_in(None, now), "");
    }

    #[test]
    fn list_filters_by_os_version() {
        let m = crate::cli::command()
            .try_get_matches_from(["metalctl", "image", "list", "--os", "ubuntu", "--os-version", "24.04"])
            .unwrap();
        let (_, image) = m.subcommand().unwrap();
        let (_, list) = image.subcommand().unwrap();
        let filter = Images::filter(list).unwrap();
        assert_eq!(filter.os.as_deref(), Some("ubuntu"));
        assert_eq!(filter.version.as_deref(), Some("24.04"));
    }

    #[test]
    fn version_flag_still_works_below_image() {
        let err = crate::cli::command()
            .try_get_matches_from(["metalctl", "image", "list", "--version"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn create_needs_a_url() {
        let cmd = Images::create_args(Command::new("create"));
        let m = cmd
            .clone()
            .try_get_matches_from(["create", "--id", "ubuntu-24.04"])
            .unwrap();
        assert!(Images::create_from_cli(&m).is_err());

        let m = cmd
            .try_get_matches_from([
                "create",
                "--id",
                "ubuntu-24.04",
                "--url",
                "https://images/ubuntu.tar.lz4",
                "--features",
                "machine,firewall",
            ])
            .unwrap();
        let req = Images::create_from_cli(&m).unwrap().unwrap();
        assert_eq!(req.features, vec!["machine", "firewall"]);
    }

    #[test]
    fn usage_column_appears_only_with_usage() {
        let image = ImageResponse {
            id: "ubuntu-24.04".into(),
            usedby: vec!["m1".into()],
            ..ImageResponse::default()
        };
        let row = ImageUsage(&image).row(false, &Style::plain());
        assert_eq!(row.last().unwrap(), "m1");
        assert_eq!(ImageUsage::header(false).len(), ImageResponse::header(false).len() + 1);
    }
}
