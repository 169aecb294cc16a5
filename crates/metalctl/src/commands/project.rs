//! `metalctl project`

use clap::{Arg, ArgAction, ArgMatches, Command};

use metal_api::models::{Meta, ProjectFindRequest, ProjectResponse};
use metalctl_core::entities::{ProjectAdapter, project_sorter};
use metalctl_core::{EntityAdapter, Sorter};

use crate::commands::util::{many, one, parse_labels};
use crate::config::Config;
use crate::error::CliError;
use crate::generic::{self, CmdsConfig, EntityCmd};
use crate::output::{Style, TableRow};

pub struct Projects;

impl EntityCmd for Projects {
    type Adapter = ProjectAdapter;

    fn config() -> CmdsConfig {
        CmdsConfig {
            name: "project",
            plural: "projects",
            aliases: &["proj"],
            about: "Manage projects",
            long_about: Some("A project groups machines, networks and IPs of one tenant."),
            ..CmdsConfig::default()
        }
    }

    fn adapter(cfg: &Config) -> Result<ProjectAdapter, CliError> {
        Ok(ProjectAdapter::new(cfg.client()?))
    }

    fn sorter() -> Sorter<ProjectResponse> {
        project_sorter()
    }

    fn list_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("id").long("id").help("Project id"))
            .arg(Arg::new("name").long("name").help("Project name"))
            .arg(Arg::new("tenant").long("tenant").help("Tenant id"))
    }

    fn filter(m: &ArgMatches) -> Result<ProjectFindRequest, CliError> {
        Ok(ProjectFindRequest {
            id: one(m, "id"),
            name: one(m, "name"),
            tenant_id: one(m, "tenant"),
        })
    }

    fn create_args(cmd: Command) -> Command {
        cmd.arg(Arg::new("name").long("name").help("Project name"))
            .arg(Arg::new("description").long("description").help("Description"))
            .arg(Arg::new("tenant").long("tenant").help("Owning tenant"))
            .arg(
                Arg::new("label")
                    .long("label")
                    .action(ArgAction::Append)
                    .help("Label, repeatable"),
            )
            .arg(
                Arg::new("annotation")
                    .long("annotation")
                    .value_name("KEY=VALUE")
                    .action(ArgAction::Append)
                    .help("Annotation, repeatable"),
            )
    }

    fn create_from_cli(m: &ArgMatches) -> Result<Option<ProjectResponse>, CliError> {
        let Some(name) = one(m, "name") else {
            return Ok(None);
        };
        let tenant_id = one(m, "tenant")
            .ok_or_else(|| CliError::validation("tenant", "is required with --name"))?;
        Ok(Some(ProjectResponse {
            name,
            description: one(m, "description").unwrap_or_default(),
            tenant_id,
            meta: Meta {
                labels: many(m, "label"),
                annotations: parse_labels(&many(m, "annotation"))?,
                ..Meta::default()
            },
            ..ProjectResponse::default()
        }))
    }

    fn update_args(cmd: Command) -> Command {
        meta_update_args(
            cmd.arg(Arg::new("name").long("name").help("New name"))
                .arg(Arg::new("description").long("description").help("New description")),
        )
    }

    async fn update_from_cli(
        adapter: &ProjectAdapter,
        id: &str,
        m: &ArgMatches,
    ) -> Result<Option<ProjectResponse>, CliError> {
        if !has_meta_edits(m) && one(m, "name").is_none() && one(m, "description").is_none() {
            return Ok(None);
        }
        let mut project = adapter.get(id).await?;
        if let Some(name) = one(m, "name") {
            project.name = name;
        }
        if let Some(description) = one(m, "description") {
            project.description = description;
        }
        apply_meta_edits(&mut project.meta, m)?;
        Ok(Some(project))
    }
}

// ── Label and annotation edits ───────────────────────────────────────

/// `--add-label`, `--remove-label`, `--add-annotation`, `--remove-annotation`
pub fn meta_update_args(cmd: Command) -> Command {
    let repeat = |name: &'static str, help: &'static str| {
        Arg::new(name).long(name).action(ArgAction::Append).help(help)
    };
    cmd.arg(repeat("add-label", "Label to add"))
        .arg(repeat("remove-label", "Label to remove"))
        .arg(repeat("add-annotation", "Annotation KEY=VALUE to add or replace"))
        .arg(repeat("remove-annotation", "Annotation key to remove"))
}

pub fn has_meta_edits(m: &ArgMatches) -> bool {
    ["add-label", "remove-label", "add-annotation", "remove-annotation"]
        .iter()
        .any(|flag| !many(m, flag).is_empty())
}

/// Apply label and annotation edits to a fetched `meta`. Labels stay
/// unique and keep their order.
pub fn apply_meta_edits(meta: &mut Meta, m: &ArgMatches) -> Result<(), CliError> {
    let remove = many(m, "remove-label");
    meta.labels.retain(|l| !remove.contains(l));
    for label in many(m, "add-label") {
        if !meta.labels.contains(&label) {
            meta.labels.push(label);
        }
    }
    for key in many(m, "remove-annotation") {
        meta.annotations.remove(&key);
    }
    meta.annotations
        .extend(parse_labels(&many(m, "add-annotation"))?);
    Ok(())
}

pub fn annotations_cell(meta: &Meta) -> String {
    meta.annotations
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Table ────────────────────────────────────────────────────────────

impl TableRow for ProjectResponse {
    fn header(wide: bool) -> Vec<&'static str> {
        let mut header = vec!["UID", "TENANT", "NAME", "DESCRIPTION", "LABELS", "ANNOTATIONS"];
        if wide {
            header.push("QUOTAS");
        }
        header
    }

    fn row(&self, wide: bool, _style: &Style) -> Vec<String> {
        let mut row = vec![
            ProjectAdapter::id(self),
            self.tenant_id.clone(),
            self.name.clone(),
            self.description.clone(),
            self.meta.labels.join(", "),
            annotations_cell(&self.meta),
        ];
        if wide {
            row.push(quota_cell(self.quotas.as_ref()));
        }
        row
    }
}

pub fn quota_cell(quotas: Option<&metal_api::models::QuotaSet>) -> String {
    let Some(q) = quotas else {
        return String::new();
    };
    [("cluster", &q.cluster), ("machine", &q.machine), ("ip", &q.ip)]
        .into_iter()
        .filter_map(|(name, quota)| {
            let quota = quota.as_ref()?;
            let max = quota.quota.map_or_else(|| "∞".to_owned(), |n| n.to_string());
            Some(format!("{name} {}/{max}", quota.used.unwrap_or(0)))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn command() -> Command {
    generic::command::<Projects>()
}

pub async fn run(cfg: &Config, m: &ArgMatches) -> Result<(), CliError> {
    generic::run::<Projects>(cfg, m).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::OutputFormat;
    use crate::output::{OutputSpec, Printer};

    fn project(id: &str, name: &str) -> ProjectResponse {
        ProjectResponse {
            id: id.into(),
            name: name.into(),
            tenant_id: "t".into(),
            ..ProjectResponse::default()
        }
    }

    fn printer(format: OutputFormat, template: Option<&str>) -> Printer {
        Printer::new(OutputSpec {
            format,
            template: template.map(str::to_owned),
            no_headers: false,
            color: false,
        })
    }

    #[test]
    fn list_is_sorted_by_id_with_project_header() {
        let mut items = vec![project("2", "project-2"), project("1", "project-1")];
        project_sorter().sort_by_args(&mut items, &["id"]).unwrap();
        let out = printer(OutputFormat::Table, None).render(&items).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0].split_whitespace().collect::<Vec<_>>(),
            vec!["UID", "TENANT", "NAME", "DESCRIPTION", "LABELS", "ANNOTATIONS"]
        );
        assert!(lines[1].starts_with("1 "));
        assert!(lines[2].starts_with("2 "));
    }

    #[test]
    fn sort_descending_inverts_the_order() {
        let mut items = vec![project("1", "a"), project("2", "b"), project("3", "c")];
        project_sorter().sort_by_args(&mut items, &["id:desc"]).unwrap();
        let ids: Vec<_> = items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn go_style_template_prints_one_line() {
        let out = printer(OutputFormat::Template, Some("{{ .id }} {{ .name }}"))
            .render(&vec![project("1", "project-1")])
            .unwrap();
        assert_eq!(out, "1 project-1");
    }

    #[test]
    fn meta_edits_add_and_remove() {
        let m = Projects::update_args(Command::new("update").arg(Arg::new("id")))
            .try_get_matches_from([
                "update",
                "p",
                "--add-label",
                "b",
                "--remove-label",
                "a",
                "--add-annotation",
                "k=v",
                "--remove-annotation",
                "old",
            ])
            .unwrap();
        let mut meta = Meta {
            labels: vec!["a".into(), "c".into()],
            annotations: [("old".to_owned(), "x".to_owned())].into(),
            ..Meta::default()
        };
        assert!(has_meta_edits(&m));
        apply_meta_edits(&mut meta, &m).unwrap();
        assert_eq!(meta.labels, vec!["c", "b"]);
        assert_eq!(annotations_cell(&meta), "k=v");
    }
}
