// Per-entity adapters and their sorters.

mod audit;
mod filesystemlayout;
mod image;
mod machine;
mod network;
mod partition;
mod project;
mod size;
mod switch;

pub use audit::{AuditAdapter, audit_sorter};
pub use filesystemlayout::{FilesystemLayoutAdapter, filesystem_layout_sorter};
pub use image::{ImageAdapter, image_sorter, os_and_version};
pub use machine::{FirewallAdapter, MachineAdapter, firewall_sorter, machine_sorter};
pub use network::{
    IpAdapter, IpIssue, MACHINE_TAG_PREFIX, NetworkAdapter, ip_issues, ip_sorter, network_sorter,
};
pub use partition::{PartitionAdapter, partition_sorter};
pub use project::{ProjectAdapter, TenantAdapter, project_sorter, tenant_sorter};
pub use size::{
    SizeAdapter, SizeImageConstraintAdapter, SizeReservationAdapter, size_image_constraint_sorter,
    size_reservation_sorter, size_sorter,
};
pub use switch::{SwitchAdapter, switch_sorter};

#[cfg(test)]
mod testing {
    #![allow(clippy::unwrap_used)]

    use metal_api::{Credentials, MetalClient};
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use crate::bulk::{BulkReader, encode_all};

    /// A client that is never sent a request.
    pub fn offline_client() -> MetalClient {
        MetalClient::with_client(
            "http://metal-api.invalid",
            reqwest::Client::new(),
            Credentials::Anonymous,
        )
        .unwrap()
    }

    /// Decode `item` the way `apply -f` reads what `describe -o yaml` printed.
    pub fn reread<T: DeserializeOwned>(item: &impl Serialize) -> T {
        BulkReader::from_string(encode_all(std::slice::from_ref(item)).unwrap())
            .decode_at(0)
            .unwrap()
    }
}
