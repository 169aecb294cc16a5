//! `metalctl filesystemlayout`

use clap::{Arg, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;

use metal_api::models::{
    FilesystemLayoutMatchRequest, FilesystemLayoutResponse, FilesystemLayoutTryRequest,
};
use metalctl_core::Sorter;
use metalctl_core::entities::{FilesystemLayoutAdapter, filesystem_layout_sorter};

use crate::commands::image::Images;
use crate::commands::machine::Machines;
use crate::commands::size::Sizes;
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd, required};
use crate::output::{Style, TableRow};

pub struct FilesystemLayouts;

impl EntityCmd for FilesystemLayouts {
    type Adapter = FilesystemLayoutAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "filesystemlayout",
            plural: "filesystem layouts",
            aliases: &["fsl"],
            about: "Manage disk and filesystem layouts",
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<FilesystemLayoutAdapter, CliError> {
        Ok(FilesystemLayoutAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<FilesystemLayoutResponse> {
        filesystem_layout_sorter()
    }
}

impl TableRow for FilesystemLayoutResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "DESCRIPTION", "FILESYSTEMS", "SIZES", "IMAGES"];
        if wide {
            header.extend(["DISKS", "VOLUME GROUPS"]);
        }
        header
    }

    fn row(&self, wide: bool, _style: &Style) -> Vec<String> {
        let mut filesystems: Vec<String> = self
            .filesystems
            .iter()
            .map(|fs| {
                let path = fs.path.as_deref().unwrap_or("-");
                format!("{path:<10} {} {}", fs.device, fs.format)
            })
            .collect();
        filesystems.sort();
        let images = self
            .constraints
            .images
            .iter()
            .map(|(os, constraint)| format!("{os} {constraint}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut row = vec![
            self.id.clone(),
            self.description.clone().unwrap_or_default(),
            filesystems.join("\n"),
            self.constraints.sizes.join("\n"),
            images,
        ];
        if wide {
            row.extend([
                self.disks
                    .iter()
                    .map(|d| d.device.clone())
                    .collect::<Vec<_>>()
                    .join("\n"),
                self.volumegroups
                    .iter()
                    .map(|v| v.name.clone())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ]);
        }
        row
    }
}

pub fn command() -> Command {
    generic::command::<FilesystemLayouts>()
        .subcommand(
            Command::new("try")
                .about("Show the layout chosen for a size and image")
                .arg(
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
                ),
        )
        .subcommand(
            Command::new("match")
                .about("Check whether the disks of a machine fit a layout")
                .arg(
                    Arg::new("machine")
                        .long("machine")
                        .required(true)
                        .add(ArgValueCandidates::new(completion::ids::<Machines>))
                        .help("Machine id"),
                )
                .arg(
                    Arg::new("filesystemlayout")
                        .long("filesystemlayout")
                        .required(true)
                        .add(ArgValueCandidates::new(completion::ids::<FilesystemLayouts>))
                        .help("Layout id"),
                ),
        )
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    match m.subcommand() {
        Some(("try", sub)) => {
            let req = FilesystemLayoutTryRequest {
                size: required(sub, "size")?.to_owned(),
                image: required(sub, "image")?.to_owned(),
            };
            let layout = cfg.client()?.try_filesystem_layout(&req).await?;
            cfg.printer().print_one(&layout)
        }
        Some(("match", sub)) => {
            let req = FilesystemLayoutMatchRequest {
                machine: required(sub, "machine")?.to_owned(),
                filesystemlayout: required(sub, "filesystemlayout")?.to_owned(),
            };
            let layout = cfg.client()?.match_filesystem_layout(&req).await?;
            cfg.printer().print_one(&layout)
        }
        _ => generic::run::<FilesystemLayouts>(cfg, m).await,
    }
}

#[cfg(test)]
mod tests {
    use metal_api::models::{Filesystem, FilesystemLayoutConstraints};

    use super::*;

    #[test]
    fn filesystems_are_listed_by_path() {
        let fs = |path: &str, device: &str| Filesystem {
            path: Some(path.into()),
            device: device.into(),
            format: "ext4".into(),
            ..Filesystem::default()
        };
        let layout = FilesystemLayoutResponse {
            id: "default".into(),
            filesystems: vec![fs("/var", "/dev/sda3"), fs("/", "/dev/sda2")],
            constraints: FilesystemLayoutConstraints {
                sizes: vec!["c1-xlarge-x86".into()],
                images: [("ubuntu".to_owned(), ">= 20.04".to_owned())].into(),
            },
            ..FilesystemLayoutResponse::default()
        };
        let row = layout.row(false, &Style::plain());
        let lines: Vec<&str> = row[2].lines().collect();
        assert!(lines[0].starts_with("/ "));
        assert!(lines[1].starts_with("/var"));
        assert_eq!(row[4], "ubuntu >= 20.04");
    }
}
