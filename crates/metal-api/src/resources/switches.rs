use tracing::debug;

use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{
    SwitchFindRequest, SwitchPortToggleRequest, SwitchResponse, SwitchUpdateRequest,
};

impl MetalClient {
    pub async fn list_switches(&self) -> Result<Vec<SwitchResponse>, Error> {
        self.get("v1/switch").await
    }

    pub async fn find_switches(&self, find: &SwitchFindRequest) -> Result<Vec<SwitchResponse>, Error> {
        self.post("v1/switch/find", find).await
    }

    pub async fn get_switch(&self, id: &str) -> Result<SwitchResponse, Error> {
        self.get(&format!("v1/switch/{}", segment(id))).await
    }

    pub async fn update_switch(&self, req: &SwitchUpdateRequest) -> Result<SwitchResponse, Error> {
        self.post("v1/switch", req).await
    }

    /// `DELETE /v1/switch/{id}[?force=true]`
    pub async fn delete_switch(&self, id: &str, force: bool) -> Result<SwitchResponse, Error> {
        let path = format!("v1/switch/{}", segment(id));
        if force {
            self.delete(&format!("{path}?force=true")).await
        } else {
            self.delete(&path).await
        }
    }

    /// Put a switch into replace mode so a new one can take over its identity.
    pub async fn replace_switch(&self, id: &str) -> Result<SwitchResponse, Error> {
        debug!(id, "putting switch into replace mode");
        let req = SwitchUpdateRequest {
            id: id.to_owned(),
            mode: Some("replace".into()),
            ..SwitchUpdateRequest::default()
        };
        self.update_switch(&req).await
    }

    /// `POST /v1/switch/{id}/port`
    pub async fn toggle_switch_port(
        &self,
        id: &str,
        req: &SwitchPortToggleRequest,
    ) -> Result<SwitchResponse, Error> {
        debug!(id, nic = %req.nic, status = %req.status, "toggling switch port");
        self.post(&format!("v1/switch/{}/port", segment(id)), req)
            .await
    }
}
