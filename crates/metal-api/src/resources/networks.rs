// Network and IP endpoints
//
// Child networks are allocated from private super networks; IPs are
// allocated from networks and freed by address.

use tracing::debug;

use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{
    IpAllocateRequest, IpFindRequest, IpResponse, IpUpdateRequest, NetworkAllocateRequest,
    NetworkCreateRequest, NetworkFindRequest, NetworkResponse, NetworkUpdateRequest,
};

impl MetalClient {
    // ── Networks ─────────────────────────────────────────────────────

    pub async fn list_networks(&self) -> Result<Vec<NetworkResponse>, Error> {
        self.get("v1/network").await
    }

    pub async fn find_networks(
        &self,
        find: &NetworkFindRequest,
    ) -> Result<Vec<NetworkResponse>, Error> {
        self.post("v1/network/find", find).await
    }

    pub async fn get_network(&self, id: &str) -> Result<NetworkResponse, Error> {
        self.get(&format!("v1/network/{}", segment(id))).await
    }

    pub async fn create_network(&self, req: &NetworkCreateRequest) -> Result<NetworkResponse, Error> {
        self.put("v1/network", req).await
    }

    pub async fn update_network(&self, req: &NetworkUpdateRequest) -> Result<NetworkResponse, Error> {
        self.post("v1/network", req).await
    }

    pub async fn delete_network(&self, id: &str) -> Result<NetworkResponse, Error> {
        self.delete(&format!("v1/network/{}", segment(id))).await
    }

    /// `POST /v1/network/allocate`
    pub async fn allocate_network(
        &self,
        req: &NetworkAllocateRequest,
    ) -> Result<NetworkResponse, Error> {
        debug!(project = %req.projectid, partition = %req.partitionid, "allocating network");
        self.post("v1/network/allocate", req).await
    }

    /// `DELETE /v1/network/free/{id}`
    pub async fn free_network(&self, id: &str) -> Result<NetworkResponse, Error> {
        self.delete(&format!("v1/network/free/{}", segment(id))).await
    }

    // ── IPs ──────────────────────────────────────────────────────────

    pub async fn list_ips(&self) -> Result<Vec<IpResponse>, Error> {
        self.get("v1/ip").await
    }

    pub async fn find_ips(&self, find: &IpFindRequest) -> Result<Vec<IpResponse>, Error> {
        self.post("v1/ip/find", find).await
    }

    pub async fn get_ip(&self, ip: &str) -> Result<IpResponse, Error> {
        self.get(&format!("v1/ip/{}", segment(ip))).await
    }

    /// `POST /v1/ip/allocate` or `POST /v1/ip/allocate/{ip}` for a specific address.
    pub async fn allocate_ip(&self, req: &IpAllocateRequest) -> Result<IpResponse, Error> {
        match req.ipaddress.as_deref().filter(|ip| !ip.is_empty()) {
            Some(ip) => {
                debug!(ip, "allocating specific ip");
                self.post(&format!("v1/ip/allocate/{}", segment(ip)), req)
                    .await
            }
            None => self.post("v1/ip/allocate", req).await,
        }
    }

    pub async fn update_ip(&self, req: &IpUpdateRequest) -> Result<IpResponse, Error> {
        self.post("v1/ip", req).await
    }

    /// `POST /v1/ip/free/{ip}`
    pub async fn free_ip(&self, ip: &str) -> Result<IpResponse, Error> {
        self.post(&format!("v1/ip/free/{}", segment(ip)), &serde_json::json!({}))
            .await
    }
}
