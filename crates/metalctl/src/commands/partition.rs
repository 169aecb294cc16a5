//! `metalctl partition`

use clap::{Arg, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;
use serde::Serialize;

use metal_api::models::{PartitionCapacity, PartitionCapacityRequest, PartitionResponse};
use metalctl_core::Sorter;
use metalctl_core::entities::{PartitionAdapter, partition_sorter};

use crate::commands::size::Sizes;
use crate::commands::util::one;
use crate::completion;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd};
use crate::output::{Style, Table, TableRow, Tabular};

pub struct Partitions;

impl EntityCmd for Partitions {
    type Adapter = PartitionAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "partition",
            plural: "partitions",
            about: "Manage partitions, the failure domains of a metal-stack installation",
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<PartitionAdapter, CliError> {
        Ok(PartitionAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<PartitionResponse> {
        partition_sorter()
    }
}

impl TableRow for PartitionResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "NAME", "DESCRIPTION"];
        if wide {
            header.extend(["BOOT IMAGE", "KERNEL", "MGMT SERVICE", "LABELS"]);
        }
        header
    }

    fn row(&self, wide: bool, _style: &Style) -> Vec<String> {
        let mut row = vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
        ];
        if wide {
            let boot = self.bootconfig.clone().unwrap_or_default();
            row.extend([
                boot.imageurl.unwrap_or_default(),
                boot.kernelurl.unwrap_or_default(),
                self.mgmtserviceaddress.clone().unwrap_or_default(),
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

/// Capacity of every size in every partition, summed up in a last row.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CapacityReport(pub Vec<PartitionCapacity>);

impl Tabular for CapacityReport {
    fn header_and_rows(&self, wide: bool, style: &Style) -> Table {
        let mut header = vec![
            "PARTITION", "SIZE", "ALLOCATED", "FREE", "RESERVED", "OTHER", "FAULTY", "TOTAL",
        ];
        if wide {
            header.extend(["OTHER MACHINES", "FAULTY MACHINES"]);
        }

        let mut total = [0u32; 6];
        let mut rows = Vec::new();
        for partition in &self.0 {
            for server in &partition.servers {
                let counts = [
                    server.allocated,
                    server.free,
                    server.reservations,
                    server.other,
                    server.faulty,
                    server.total,
                ];
                for (sum, n) in total.iter_mut().zip(counts) {
                    *sum += n;
                }
                let faulty = server.faulty.to_string();
                let mut row = vec![
                    partition.id.clone(),
                    server.size.clone(),
                    server.allocated.to_string(),
                    server.free.to_string(),
                    format!("{}/{}", server.usedreservations, server.reservations),
                    server.other.to_string(),
                    if server.faulty > 0 { style.red(&faulty) } else { faulty },
                    server.total.to_string(),
                ];
                if wide {
                    row.extend([server.othermachines.join("\n"), server.faultymachines.join("\n")]);
                }
                rows.push(row);
            }
        }

        let [allocated, free, reserved, other, faulty, all] = total;
        let mut sum = vec![
            style.bold("Total"),
            String::new(),
            allocated.to_string(),
            free.to_string(),
            reserved.to_string(),
            other.to_string(),
            faulty.to_string(),
            all.to_string(),
        ];
        if wide {
            sum.extend([String::new(), String::new()]);
        }
        rows.push(sum);

        Table {
            header: header.into_iter().map(str::to_owned).collect(),
            rows,
        }
    }
}

pub fn command() -> Command {
    generic::command::<Partitions>().subcommand(
        Command::new("capacity")
            .about("Show free, allocated and faulty machines per partition and size")
            .arg(
                Arg::new("id")
                    .long("id")
                    .add(ArgValueCandidates::new(completion::ids::<Partitions>))
                    .help("Partition id"),
            )
            .arg(
                Arg::new("size")
                    .long("size")
                    .add(ArgValueCandidates::new(completion::ids::<Sizes>))
                    .help("Size id"),
            ),
    )
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    match m.subcommand() {
        Some(("capacity", sub)) => capacity(cfg, sub).await,
        _ => generic::run::<Partitions>(cfg, m).await,
    }
}

async fn capacity(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    let req = PartitionCapacityRequest {
        id: one(m, "id"),
        sizeid: one(m, "size"),
    };
    let mut partitions = cfg.client()?.partition_capacity(&req).await?;
    partitions.sort_by(|a, b| a.id.cmp(&b.id));
    for p in &mut partitions {
        p.servers.sort_by(|a, b| a.size.cmp(&b.size));
    }
    cfg.printer().print(&CapacityReport(partitions))
}

#[cfg(test)]
mod tests {
    use metal_api::models::ServerCapacity;
    use pretty_assertions::assert_eq;

    use super::*;

    fn server(size: &str, total: u32, free: u32, allocated: u32) -> ServerCapacity {
        ServerCapacity {
            size: size.into(),
            total,
            free,
            allocated,
            ..ServerCapacity::default()
        }
    }

    #[test]
    fn totals_sum_every_size() {
        let report = CapacityReport(vec![
            PartitionCapacity {
                id: "fra".into(),
                name: None,
                servers: vec![server("c1", 10, 4, 6), server("s2", 5, 5, 0)],
            },
            PartitionCapacity {
                id: "muc".into(),
                name: None,
                servers: vec![server("c1", 3, 1, 2)],
            },
        ]);
        let table = report.header_and_rows(false, &Style::plain());
        assert_eq!(table.rows.len(), 4);
        let total = table.rows.last().cloned().unwrap_or_default();
        assert_eq!(total[0], "Total");
        assert_eq!(total[2], "8");
        assert_eq!(total[3], "10");
        assert_eq!(total[7], "18");
    }
}
