// Networks and IP addresses.

use std::collections::BTreeSet;

use metal_api::MetalClient;
use metal_api::models::{
    IpAllocateRequest, IpFindRequest, IpResponse, IpUpdateRequest, NetworkCreateRequest,
    NetworkFindRequest, NetworkResponse, NetworkUpdateRequest,
};
use serde::Serialize;

use crate::adapter::{Converted, EntityAdapter};
use crate::error::CoreError;
use crate::sort::{Sorter, cmp_ip, cmp_opt};

// ── Network ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NetworkAdapter {
    client: MetalClient,
}

impl NetworkAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for NetworkAdapter {
    type Response = NetworkResponse;
    type CreateRequest = NetworkCreateRequest;
    type UpdateRequest = NetworkUpdateRequest;
    type Filter = NetworkFindRequest;

    const KIND: &'static str = "network";

    async fn get(&self, id: &str) -> Result<NetworkResponse, CoreError> {
        Ok(self.client.get_network(id).await?)
    }

    async fn list(&self, filter: &NetworkFindRequest) -> Result<Vec<NetworkResponse>, CoreError> {
        if filter.is_empty() {
            Ok(self.client.list_networks().await?)
        } else {
            Ok(self.client.find_networks(filter).await?)
        }
    }

    async fn create(&self, req: &NetworkCreateRequest) -> Result<NetworkResponse, CoreError> {
        Ok(self.client.create_network(req).await?)
    }

    async fn update(&self, req: &NetworkUpdateRequest) -> Result<NetworkResponse, CoreError> {
        Ok(self.client.update_network(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<NetworkResponse, CoreError> {
        Ok(self.client.delete_network(id).await?)
    }

    fn id(resp: &NetworkResponse) -> String {
        resp.id.clone()
    }

    fn completion_hint(resp: &NetworkResponse) -> Option<String> {
        resp.name.clone()
    }

    fn convert(
        &self,
        resp: &NetworkResponse,
    ) -> Result<Converted<NetworkCreateRequest, NetworkUpdateRequest>, CoreError> {
        Ok(Converted {
            id: resp.id.clone(),
            create: NetworkCreateRequest {
                id: resp.id.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                partitionid: resp.partitionid.clone(),
                projectid: resp.projectid.clone(),
                prefixes: resp.prefixes.clone(),
                destinationprefixes: resp.destinationprefixes.clone(),
                vrf: resp.vrf,
                vrfshared: resp.vrfshared,
                nat: resp.nat,
                privatesuper: resp.privatesuper,
                underlay: resp.underlay,
                shared: resp.shared,
                labels: resp.labels.clone(),
            },
            update: NetworkUpdateRequest {
                id: resp.id.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                prefixes: resp.prefixes.clone(),
                destinationprefixes: resp.destinationprefixes.clone(),
                shared: Some(resp.shared),
                labels: resp.labels.clone(),
            },
        })
    }
}

pub fn network_sorter() -> Sorter<NetworkResponse> {
    Sorter::<NetworkResponse>::new()
        .str_field("id", |n| n.id.as_str())
        .str_field("name", |n| n.name.as_deref().unwrap_or_default())
        .str_field("partition", |n| n.partitionid.as_deref().unwrap_or_default())
        .str_field("project", |n| n.projectid.as_deref().unwrap_or_default())
        .str_field("description", |n| n.description.as_deref().unwrap_or_default())
        .field("vrf", |a, b, d| cmp_opt(a.vrf.as_ref(), b.vrf.as_ref(), d))
        .default_keys(&["partition", "id"])
}

// ── IP ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct IpAdapter {
    client: MetalClient,
}

impl IpAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for IpAdapter {
    type Response = IpResponse;
    type CreateRequest = IpAllocateRequest;
    type UpdateRequest = IpUpdateRequest;
    type Filter = IpFindRequest;

    const KIND: &'static str = "ip";
    const ID_FIELDS: &'static [&'static str] = &["ipaddress"];

    async fn get(&self, id: &str) -> Result<IpResponse, CoreError> {
        Ok(self.client.get_ip(id).await?)
    }

    async fn list(&self, filter: &IpFindRequest) -> Result<Vec<IpResponse>, CoreError> {
        if filter.is_empty() {
            Ok(self.client.list_ips().await?)
        } else {
            Ok(self.client.find_ips(filter).await?)
        }
    }

    async fn create(&self, req: &IpAllocateRequest) -> Result<IpResponse, CoreError> {
        Ok(self.client.allocate_ip(req).await?)
    }

    async fn update(&self, req: &IpUpdateRequest) -> Result<IpResponse, CoreError> {
        Ok(self.client.update_ip(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<IpResponse, CoreError> {
        Ok(self.client.free_ip(id).await?)
    }

    fn id(resp: &IpResponse) -> String {
        resp.ipaddress.clone()
    }

    fn completion_hint(resp: &IpResponse) -> Option<String> {
        resp.name.clone()
    }

    fn convert(
        &self,
        resp: &IpResponse,
    ) -> Result<Converted<IpAllocateRequest, IpUpdateRequest>, CoreError> {
        Ok(Converted {
            id: resp.ipaddress.clone(),
            create: IpAllocateRequest {
                ipaddress: Some(resp.ipaddress.clone()),
                name: resp.name.clone(),
                description: resp.description.clone(),
                networkid: resp.networkid.clone(),
                projectid: resp.projectid.clone(),
                kind: resp.kind.clone(),
                tags: resp.tags.clone(),
                machineid: None,
            },
            update: IpUpdateRequest {
                ipaddress: resp.ipaddress.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                kind: resp.kind.clone(),
                tags: resp.tags.clone(),
            },
        })
    }
}

pub fn ip_sorter() -> Sorter<IpResponse> {
    Sorter::<IpResponse>::new()
        .field("ipaddress", |a, b, d| cmp_ip(&a.ipaddress, &b.ipaddress, d))
        .str_field("name", |i| i.name.as_deref().unwrap_or_default())
        .str_field("network", |i| i.networkid.as_str())
        .str_field("project", |i| i.projectid.as_str())
        .str_field("type", |i| i.kind.as_str())
        .str_field("description", |i| i.description.as_deref().unwrap_or_default())
        .default_keys(&["ipaddress"])
}

// ── IP issues ───────────────────────────────────────────────────────

/// Tag the API puts on IPs bound to a machine: `<prefix><machine-id>`.
pub const MACHINE_TAG_PREFIX: &str = "machine.metal-stack.io/id=";

/// An IP that looks orphaned or inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpIssue {
    pub ipaddress: String,
    pub projectid: String,
    pub machineid: Option<String>,
    pub issue: &'static str,
}

/// Flag IPs bound to machines that no longer exist and ephemeral IPs
/// that are bound to nothing.
pub fn ip_issues<'a>(
    ips: &[IpResponse],
    machine_ids: impl IntoIterator<Item = &'a str>,
) -> Vec<IpIssue> {
    let machines: BTreeSet<&str> = machine_ids.into_iter().collect();
    ips.iter()
        .filter_map(|ip| {
            let machine = ip
                .tags
                .iter()
                .find_map(|t| t.strip_prefix(MACHINE_TAG_PREFIX));
            let issue = match machine {
                Some(id) if !machines.contains(id) => "bound to a machine that does not exist",
                None if ip.kind == "ephemeral" => "ephemeral ip without machine",
                _ => return None,
            };
            Some(IpIssue {
                ipaddress: ip.ipaddress.clone(),
                projectid: ip.projectid.clone(),
                machineid: machine.map(str::to_owned),
                issue,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entities::testing::{offline_client, reread};

    fn ip(addr: &str, kind: &str, tags: &[&str]) -> IpResponse {
        IpResponse {
            ipaddress: addr.into(),
            kind: kind.into(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            ..IpResponse::default()
        }
    }

    #[test]
    fn ip_issues_flags_dangling_and_unbound() {
        let ips = vec![
            ip("10.0.0.1", "ephemeral", &["machine.metal-stack.io/id=m1"]),
            ip("10.0.0.2", "ephemeral", &["machine.metal-stack.io/id=gone"]),
            ip("10.0.0.3", "ephemeral", &[]),
            ip("10.0.0.4", "static", &[]),
        ];
        let issues = ip_issues(&ips, ["m1"]);

        let flagged: Vec<&str> = issues.iter().map(|i| i.ipaddress.as_str()).collect();
        assert_eq!(flagged, vec!["10.0.0.2", "10.0.0.3"]);
        assert_eq!(issues[0].machineid.as_deref(), Some("gone"));
    }

    #[test]
    fn ips_sort_numerically_by_default() {
        let mut ips = vec![
            ip("10.0.0.10", "static", &[]),
            ip("10.0.0.9", "static", &[]),
        ];
        ip_sorter().sort_by_args::<&str>(&mut ips, &[]).unwrap();
        assert_eq!(ips[0].ipaddress, "10.0.0.9");
    }

    #[test]
    fn described_network_reapplies_as_its_conversion() {
        let network = NetworkResponse {
            id: "tenant-net".into(),
            name: Some("tenant".into()),
            partitionid: Some("fra-equ01".into()),
            projectid: Some("p1".into()),
            prefixes: vec!["10.0.0.0/22".into()],
            parentnetworkid: Some("tenant-super".into()),
            vrf: Some(30),
            shared: true,
            labels: BTreeMap::from([("team".to_owned(), "infra".to_owned())]),
            ..NetworkResponse::default()
        };
        let converted = NetworkAdapter::new(offline_client()).convert(&network).unwrap();

        assert_eq!(converted.id, "tenant-net");
        assert_eq!(converted.update.shared, Some(true));
        assert_eq!(reread::<NetworkCreateRequest>(&network), converted.create);
        assert_eq!(reread::<NetworkUpdateRequest>(&network), converted.update);
    }

    #[test]
    fn described_ip_reapplies_as_its_conversion() {
        let mut addr = ip("212.34.83.10", "static", &["cluster.metal-stack.io/id=c1"]);
        addr.networkid = "internet".into();
        addr.projectid = "p1".into();
        addr.name = Some("ingress".into());
        let converted = IpAdapter::new(offline_client()).convert(&addr).unwrap();

        assert_eq!(converted.id, "212.34.83.10");
        assert_eq!(converted.create.ipaddress.as_deref(), Some("212.34.83.10"));
        assert_eq!(converted.create.machineid, None);
        assert_eq!(reread::<IpAllocateRequest>(&addr), converted.create);
        assert_eq!(reread::<IpUpdateRequest>(&addr), converted.update);
    }
}
