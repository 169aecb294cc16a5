// Machine and firewall endpoints
//
// Machines are allocated instead of created and freed instead of
// deleted. Power, LED, state and reinstall are sub-resources of a
// single machine.

use serde_json::json;
use tracing::debug;

use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{
    FirewallCreateRequest, FirewallResponse, MachineAllocateRequest, MachineEvents,
    MachineFindRequest, MachineIssueResponse, MachineIssuesRequest, MachineReinstallRequest,
    MachineResponse, MachineStateRequest, MachineUpdateRequest,
};

/// Power actions accepted by `POST /v1/machine/{id}/power/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum PowerAction {
    On,
    Off,
    Reset,
    Cycle,
    Bios,
    Disk,
    Pxe,
}

impl MetalClient {
    // ── Machines ─────────────────────────────────────────────────────

    /// `GET /v1/machine`
    pub async fn list_machines(&self) -> Result<Vec<MachineResponse>, Error> {
        self.get("v1/machine").await
    }

    /// `POST /v1/machine/find`
    pub async fn find_machines(
        &self,
        find: &MachineFindRequest,
    ) -> Result<Vec<MachineResponse>, Error> {
        self.post("v1/machine/find", find).await
    }

    /// `GET /v1/machine/{id}`
    pub async fn get_machine(&self, id: &str) -> Result<MachineResponse, Error> {
        self.get(&format!("v1/machine/{}", segment(id))).await
    }

    /// `POST /v1/machine/allocate`
    pub async fn allocate_machine(
        &self,
        req: &MachineAllocateRequest,
    ) -> Result<MachineResponse, Error> {
        debug!(project = %req.projectid, partition = %req.partitionid, "allocating machine");
        self.post("v1/machine/allocate", req).await
    }

    /// `POST /v1/machine`
    pub async fn update_machine(&self, req: &MachineUpdateRequest) -> Result<MachineResponse, Error> {
        self.post("v1/machine", req).await
    }

    /// Release an allocated machine back into the pool.
    ///
    /// `DELETE /v1/machine/{id}/free`
    pub async fn free_machine(&self, id: &str) -> Result<MachineResponse, Error> {
        debug!(id, "freeing machine");
        self.delete(&format!("v1/machine/{}/free", segment(id))).await
    }

    /// `POST /v1/machine/{id}/power/{action}`
    pub async fn machine_power(
        &self,
        id: &str,
        action: PowerAction,
    ) -> Result<MachineResponse, Error> {
        debug!(id, %action, "machine power");
        self.post(
            &format!("v1/machine/{}/power/{action}", segment(id)),
            &json!([]),
        )
        .await
    }

    /// Switch the chassis identify LED.
    ///
    /// `POST /v1/machine/{id}/power/chassis-identify-led-{on,off}`
    pub async fn machine_identify(
        &self,
        id: &str,
        on: bool,
        description: &str,
    ) -> Result<MachineResponse, Error> {
        let state = if on { "on" } else { "off" };
        self.post(
            &format!(
                "v1/machine/{}/power/chassis-identify-led-{state}",
                segment(id)
            ),
            &json!({ "description": description }),
        )
        .await
    }

    /// `POST /v1/machine/{id}/reinstall`
    pub async fn reinstall_machine(
        &self,
        id: &str,
        req: &MachineReinstallRequest,
    ) -> Result<MachineResponse, Error> {
        self.post(&format!("v1/machine/{}/reinstall", segment(id)), req)
            .await
    }

    /// Set the machine state (`LOCKED`, `RESERVED` or empty to clear).
    ///
    /// `POST /v1/machine/{id}/state`
    pub async fn set_machine_state(
        &self,
        id: &str,
        req: &MachineStateRequest,
    ) -> Result<MachineResponse, Error> {
        self.post(&format!("v1/machine/{}/state", segment(id)), req)
            .await
    }

    /// Machine including the BMC details.
    ///
    /// `GET /v1/machine/{id}/ipmi`
    pub async fn get_machine_ipmi(&self, id: &str) -> Result<MachineResponse, Error> {
        self.get(&format!("v1/machine/{}/ipmi", segment(id))).await
    }

    /// `POST /v1/machine/ipmi/find`
    pub async fn find_machines_ipmi(
        &self,
        find: &MachineFindRequest,
    ) -> Result<Vec<MachineResponse>, Error> {
        self.post("v1/machine/ipmi/find", find).await
    }

    /// Provisioning event log of one machine.
    ///
    /// `GET /v1/machine/{id}/event`
    pub async fn machine_events(&self, id: &str) -> Result<MachineEvents, Error> {
        self.get(&format!("v1/machine/{}/event", segment(id))).await
    }

    /// `POST /v1/machine/issues`
    pub async fn machine_issues(
        &self,
        req: &MachineIssuesRequest,
    ) -> Result<Vec<MachineIssueResponse>, Error> {
        self.post("v1/machine/issues", req).await
    }

    // ── Firewalls ────────────────────────────────────────────────────

    /// `GET /v1/firewall`
    pub async fn list_firewalls(&self) -> Result<Vec<FirewallResponse>, Error> {
        self.get("v1/firewall").await
    }

    /// `POST /v1/firewall/find`
    pub async fn find_firewalls(
        &self,
        find: &MachineFindRequest,
    ) -> Result<Vec<FirewallResponse>, Error> {
        self.post("v1/firewall/find", find).await
    }

    /// `GET /v1/firewall/{id}`
    pub async fn get_firewall(&self, id: &str) -> Result<FirewallResponse, Error> {
        self.get(&format!("v1/firewall/{}", segment(id))).await
    }

    /// `POST /v1/firewall/allocate`
    pub async fn allocate_firewall(
        &self,
        req: &FirewallCreateRequest,
    ) -> Result<FirewallResponse, Error> {
        self.post("v1/firewall/allocate", req).await
    }
}
