//! `metalctl tenant`

use clap::{Arg, ArgMatches, Command};

use metal_api::models::{TenantFindRequest, TenantResponse};
use metalctl_core::entities::{TenantAdapter, tenant_sorter};
use metalctl_core::{EntityAdapter, Sorter};

use crate::commands::project::{
    annotations_cell, apply_meta_edits, has_meta_edits, meta_update_args, quota_cell,
};
use crate::commands::util::one;
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd};
use crate::output::{Style, TableRow};

pub struct Tenants;

impl EntityCmd for Tenants {
    type Adapter = TenantAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "tenant",
            plural: "tenants",
            about: "Manage tenants",
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<TenantAdapter, CliError> {
        Ok(TenantAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<TenantResponse> {
        tenant_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("id").long("id").help("Tenant id"))
            .arg(Arg::new("name").long("name").help("Tenant name"))
    }

    fn filter(m: &ArgMatches) -> Result<TenantFindRequest, CliError> {
        Ok(TenantFindRequest {
            id: one(m, "id"),
            name: one(m, "name"),
        })
    }

    fn update_args(cmd: Command) -> Command {
        meta_update_args(
            cmd.arg(Arg::new("name").long("name").help("New name"))
                .arg(Arg::new("description").long("description").help("New description")),
        )
    }

    async fn update_from_cli(
        adapter: &TenantAdapter,
        id: &str,
        m: &ArgMatches,
    ) -> Result<Option<TenantResponse>, CliError> {
        let name = one(m, "name");
        let description = one(m, "description");
        if !has_meta_edits(m) && name.is_none() && description.is_none() {
            return Ok(None);
        }
        let mut tenant = adapter.get(id).await?;
        if let Some(name) = name {
            tenant.name = name;
        }
        if let Some(description) = description {
            tenant.description = description;
        }
        apply_meta_edits(&mut tenant.meta, m)?;
        Ok(Some(tenant))
    }
}

impl TableRow for TenantResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["ID", "NAME", "DESCRIPTION", "LABELS", "ANNOTATIONS"];
        if wide {
            header.extend(["QUOTAS", "DEFAULT QUOTAS"]);
        }
        header
    }

    fn row(&self, wide: bool, _style: &Style) -> Vec<String> {
        let mut row = vec![
            TenantAdapter::id(self),
            self.name.clone(),
            self.description.clone(),
            self.meta.labels.join(", "),
            annotations_cell(&self.meta),
        ];
        if wide {
            row.push(quota_cell(self.quotas.as_ref()));
            row.push(quota_cell(self.default_quotas.as_ref()));
        }
        row
    }
}

pub fn command() -> Command {
    generic::command::<Tenants>()
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    generic::run::<Tenants>(cfg, m).await
}
