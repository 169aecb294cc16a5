// Machines and firewalls.
//
// Both are allocated rather than created and freed rather than deleted.
// A firewall is a machine with the firewall role, so the two adapters
// share conversion and sorting.

use metal_api::MetalClient;
use metal_api::models::{
    FirewallCreateRequest, FirewallResponse, MachineAllocateRequest, MachineAllocationNetwork,
    MachineFindRequest, MachineResponse, MachineUpdateRequest,
};

use crate::adapter::{Converted, EntityAdapter, Operation};
use crate::error::CoreError;
use crate::sort::{Sorter, cmp_opt, cmp_ord};

#[derive(Debug, Clone)]
pub struct MachineAdapter {
    client: MetalClient,
}

impl MachineAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for MachineAdapter {
    type Response = MachineResponse;
    type CreateRequest = MachineAllocateRequest;
    type UpdateRequest = MachineUpdateRequest;
    type Filter = MachineFindRequest;

    const KIND: &'static str = "machine";

    async fn get(&self, id: &str) -> Result<MachineResponse, CoreError> {
        Ok(self.client.get_machine(id).await?)
    }

    async fn list(&self, filter: &MachineFindRequest) -> Result<Vec<MachineResponse>, CoreError> {
        if filter.is_empty() {
            Ok(self.client.list_machines().await?)
        } else {
            Ok(self.client.find_machines(filter).await?)
        }
    }

    async fn create(&self, req: &MachineAllocateRequest) -> Result<MachineResponse, CoreError> {
        Ok(self.client.allocate_machine(req).await?)
    }

    async fn update(&self, req: &MachineUpdateRequest) -> Result<MachineResponse, CoreError> {
        Ok(self.client.update_machine(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<MachineResponse, CoreError> {
        Ok(self.client.free_machine(id).await?)
    }

    fn id(resp: &MachineResponse) -> String {
        resp.id.clone()
    }

    fn completion_hint(resp: &MachineResponse) -> Option<String> {
        resp.allocation
            .as_ref()
            .and_then(|a| a.hostname.clone().or_else(|| Some(a.name.clone())))
            .filter(|h| !h.is_empty())
    }

    fn convert(
        &self,
        resp: &MachineResponse,
    ) -> Result<Converted<MachineAllocateRequest, MachineUpdateRequest>, CoreError> {
        Ok(Converted {
            id: resp.id.clone(),
            create: allocate_request(resp)?,
            update: MachineUpdateRequest {
                id: resp.id.clone(),
                description: resp
                    .allocation
                    .as_ref()
                    .and_then(|a| a.description.clone())
                    .or_else(|| resp.description.clone()),
                tags: Some(resp.tags.clone()),
            },
        })
    }
}

/// Rebuild the allocation request that produced `resp`.
fn allocate_request(resp: &MachineResponse) -> Result<MachineAllocateRequest, CoreError> {
    let alloc = resp.allocation.as_ref().ok_or_else(|| {
        CoreError::InvalidArgument(format!("machine {} is not allocated", resp.id))
    })?;
    let id_of = |v: Option<String>| v.unwrap_or_default();

    Ok(MachineAllocateRequest {
        uuid: Some(resp.id.clone()),
        name: alloc.name.clone(),
        description: alloc.description.clone(),
        hostname: alloc.hostname.clone(),
        projectid: alloc.project.clone(),
        partitionid: id_of(resp.partition.as_ref().map(|p| p.id.clone())),
        sizeid: id_of(resp.size.as_ref().map(|s| s.id.clone())),
        imageid: id_of(alloc.image.as_ref().map(|i| i.id.clone())),
        filesystemlayoutid: alloc.filesystemlayout.as_ref().map(|f| f.id.clone()),
        networks: alloc
            .networks
            .iter()
            .filter(|n| !n.underlay)
            .map(|n| MachineAllocationNetwork {
                networkid: n.networkid.clone(),
                autoacquire: false,
            })
            .collect(),
        ips: alloc
            .networks
            .iter()
            .filter(|n| !n.private && !n.underlay)
            .flat_map(|n| n.ips.iter().cloned())
            .collect(),
        ssh_pub_keys: alloc.ssh_pub_keys.clone(),
        user_data: alloc.user_data.clone(),
        tags: resp.tags.clone(),
        placement_tags: Vec::new(),
    })
}

// ── Firewall ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FirewallAdapter {
    client: MetalClient,
}

impl FirewallAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for FirewallAdapter {
    type Response = FirewallResponse;
    type CreateRequest = FirewallCreateRequest;
    type UpdateRequest = MachineUpdateRequest;
    type Filter = MachineFindRequest;

    const KIND: &'static str = "firewall";
    const SUPPORTED: &'static [Operation] = &[
        Operation::List,
        Operation::Get,
        Operation::Create,
        Operation::Delete,
    ];

    async fn get(&self, id: &str) -> Result<FirewallResponse, CoreError> {
        Ok(self.client.get_firewall(id).await?)
    }

    async fn list(&self, filter: &MachineFindRequest) -> Result<Vec<FirewallResponse>, CoreError> {
        if filter.is_empty() {
            Ok(self.client.list_firewalls().await?)
        } else {
            Ok(self.client.find_firewalls(filter).await?)
        }
    }

    async fn create(&self, req: &FirewallCreateRequest) -> Result<FirewallResponse, CoreError> {
        Ok(self.client.allocate_firewall(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<FirewallResponse, CoreError> {
        let machine = self.client.free_machine(id).await?;
        Ok(FirewallResponse { machine })
    }

    fn id(resp: &FirewallResponse) -> String {
        resp.machine.id.clone()
    }

    fn completion_hint(resp: &FirewallResponse) -> Option<String> {
        MachineAdapter::completion_hint(&resp.machine)
    }

    fn convert(
        &self,
        resp: &FirewallResponse,
    ) -> Result<Converted<FirewallCreateRequest, MachineUpdateRequest>, CoreError> {
        Ok(Converted {
            id: resp.machine.id.clone(),
            create: FirewallCreateRequest {
                machine: allocate_request(&resp.machine)?,
                firewall_rules: None,
            },
            update: MachineUpdateRequest {
                id: resp.machine.id.clone(),
                description: resp.machine.description.clone(),
                tags: Some(resp.machine.tags.clone()),
            },
        })
    }
}

// ── Sorting ─────────────────────────────────────────────────────────

fn partition(m: &MachineResponse) -> &str {
    m.partition.as_ref().map_or("", |p| p.id.as_str())
}

fn size(m: &MachineResponse) -> &str {
    m.size.as_ref().map_or("", |s| s.id.as_str())
}

fn project(m: &MachineResponse) -> &str {
    m.allocation.as_ref().map_or("", |a| a.project.as_str())
}

fn hostname(m: &MachineResponse) -> &str {
    m.allocation
        .as_ref()
        .and_then(|a| a.hostname.as_deref())
        .unwrap_or_default()
}

fn image(m: &MachineResponse) -> &str {
    m.allocation
        .as_ref()
        .and_then(|a| a.image.as_ref())
        .map_or("", |i| i.id.as_str())
}

pub fn machine_sorter() -> Sorter<MachineResponse> {
    Sorter::<MachineResponse>::new()
        .str_field("id", |m| m.id.as_str())
        .str_field("partition", partition)
        .str_field("size", size)
        .str_field("rack", |m| m.rackid.as_deref().unwrap_or_default())
        .str_field("project", project)
        .str_field("hostname", hostname)
        .str_field("image", image)
        .str_field("liveliness", |m| m.liveliness.as_deref().unwrap_or_default())
        .field("event", |a, b, d| {
            cmp_opt(
                a.events.as_ref().and_then(|e| e.log.first()).map(|e| &e.event),
                b.events.as_ref().and_then(|e| e.log.first()).map(|e| &e.event),
                d,
            )
        })
        .field("when", |a, b, d| {
            cmp_opt(
                a.events.as_ref().and_then(|e| e.last_event_time.as_ref()),
                b.events.as_ref().and_then(|e| e.last_event_time.as_ref()),
                d,
            )
        })
        .field("age", |a, b, d| {
            // older allocation first
            let created = |m: &MachineResponse| m.allocation.as_ref().and_then(|x| x.created);
            cmp_opt(created(a).as_ref(), created(b).as_ref(), d)
        })
        .field("memory", |a, b, d| {
            let mem = |m: &MachineResponse| m.hardware.as_ref().map_or(0, |h| h.memory);
            cmp_ord(&mem(a), &mem(b), d)
        })
        .field("cores", |a, b, d| {
            let cores = |m: &MachineResponse| m.hardware.as_ref().map_or(0, |h| h.cpu_cores);
            cmp_ord(&cores(a), &cores(b), d)
        })
        .default_keys(&["id"])
}

pub fn firewall_sorter() -> Sorter<FirewallResponse> {
    Sorter::<FirewallResponse>::new()
        .str_field("id", |f| f.machine.id.as_str())
        .str_field("partition", |f| partition(&f.machine))
        .str_field("size", |f| size(&f.machine))
        .str_field("project", |f| project(&f.machine))
        .str_field("hostname", |f| hostname(&f.machine))
        .str_field("image", |f| image(&f.machine))
        .default_keys(&["id"])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use metal_api::models::{
        ImageResponse, MachineAllocation, MachineNetwork, PartitionResponse, SizeResponse,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entities::testing::{offline_client, reread};

    fn network(id: &str, ips: &[&str], private: bool, underlay: bool) -> MachineNetwork {
        MachineNetwork {
            networkid: id.into(),
            ips: ips.iter().map(|ip| (*ip).to_owned()).collect(),
            private,
            underlay,
            ..MachineNetwork::default()
        }
    }

    fn allocated() -> MachineResponse {
        MachineResponse {
            id: "m1".into(),
            description: Some("hardware note".into()),
            partition: Some(PartitionResponse {
                id: "fra-equ01".into(),
                ..PartitionResponse::default()
            }),
            size: Some(SizeResponse {
                id: "c1-xlarge-x86".into(),
                ..SizeResponse::default()
            }),
            allocation: Some(MachineAllocation {
                name: "worker-1".into(),
                description: Some("shoot worker".into()),
                hostname: Some("worker-1".into()),
                project: "p1".into(),
                image: Some(ImageResponse {
                    id: "ubuntu-24.04".into(),
                    ..ImageResponse::default()
                }),
                networks: vec![
                    network("tenant-net", &["10.0.0.5"], true, false),
                    network("internet", &["212.34.83.10"], false, false),
                    network("underlay", &["10.1.0.5"], false, true),
                ],
                ssh_pub_keys: vec!["ssh-ed25519 AAAA".into()],
                ..MachineAllocation::default()
            }),
            tags: vec!["cluster=c1".into()],
            ..MachineResponse::default()
        }
    }

    #[test]
    fn allocated_machine_converts_to_its_allocation() {
        let converted = MachineAdapter::new(offline_client())
            .convert(&allocated())
            .unwrap();
        let create = converted.create;

        assert_eq!(create.uuid.as_deref(), Some("m1"));
        assert_eq!(create.projectid, "p1");
        assert_eq!(create.partitionid, "fra-equ01");
        assert_eq!(create.sizeid, "c1-xlarge-x86");
        assert_eq!(create.imageid, "ubuntu-24.04");
        let networks: Vec<&str> = create.networks.iter().map(|n| n.networkid.as_str()).collect();
        assert_eq!(networks, vec!["tenant-net", "internet"]);
        assert_eq!(create.ips, vec!["212.34.83.10"]);
        assert_eq!(converted.update.description.as_deref(), Some("shoot worker"));
    }

    #[test]
    fn edited_machine_update_reads_back_unchanged() {
        let converted = MachineAdapter::new(offline_client())
            .convert(&allocated())
            .unwrap();

        assert_eq!(reread::<MachineUpdateRequest>(&converted.update), converted.update);
        assert_eq!(reread::<MachineAllocateRequest>(&converted.create), converted.create);
    }

    #[test]
    fn free_machine_cannot_be_converted() {
        let free = MachineResponse {
            allocation: None,
            ..allocated()
        };
        let err = MachineAdapter::new(offline_client())
            .convert(&free)
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn firewall_converts_through_its_machine() {
        let firewall = FirewallResponse {
            machine: allocated(),
        };
        let converted = FirewallAdapter::new(offline_client())
            .convert(&firewall)
            .unwrap();

        assert_eq!(converted.id, "m1");
        assert_eq!(converted.create.machine.uuid.as_deref(), Some("m1"));
        assert_eq!(converted.create.firewall_rules, None);
        assert_eq!(reread::<MachineUpdateRequest>(&firewall), converted.update);
    }
}
