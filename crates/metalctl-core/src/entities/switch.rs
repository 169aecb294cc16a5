// Switches register themselves with the API, so there is no create.

use metal_api::MetalClient;
use metal_api::models::{SwitchFindRequest, SwitchResponse, SwitchUpdateRequest};

use crate::adapter::{Converted, EntityAdapter, Operation};
use crate::error::CoreError;
use crate::sort::{Sorter, cmp_opt};

#[derive(Debug, Clone)]
pub struct SwitchAdapter {
    client: MetalClient,
    force_delete: bool,
}

impl SwitchAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self {
            client,
            force_delete: false,
        }
    }

    /// Delete switches even when machines are still connected.
    pub fn force_delete(mut self, force: bool) -> Self {
        self.force_delete = force;
        self
    }
}

impl EntityAdapter for SwitchAdapter {
    type Response = SwitchResponse;
    type CreateRequest = SwitchUpdateRequest;
    type UpdateRequest = SwitchUpdateRequest;
    type Filter = SwitchFindRequest;

    const KIND: &'static str = "switch";
    const SUPPORTED: &'static [Operation] = &[
        Operation::List,
        Operation::Get,
        Operation::Update,
        Operation::Delete,
    ];

    async fn get(&self, id: &str) -> Result<SwitchResponse, CoreError> {
        Ok(self.client.get_switch(id).await?)
    }

    async fn list(&self, filter: &SwitchFindRequest) -> Result<Vec<SwitchResponse>, CoreError> {
        if *filter == SwitchFindRequest::default() {
            Ok(self.client.list_switches().await?)
        } else {
            Ok(self.client.find_switches(filter).await?)
        }
    }

    async fn update(&self, req: &SwitchUpdateRequest) -> Result<SwitchResponse, CoreError> {
        Ok(self.client.update_switch(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<SwitchResponse, CoreError> {
        Ok(self.client.delete_switch(id, self.force_delete).await?)
    }

    fn id(resp: &SwitchResponse) -> String {
        resp.id.clone()
    }

    fn completion_hint(resp: &SwitchResponse) -> Option<String> {
        Some(resp.rack_id.clone()).filter(|r| !r.is_empty())
    }

    fn convert(
        &self,
        resp: &SwitchResponse,
    ) -> Result<Converted<SwitchUpdateRequest, SwitchUpdateRequest>, CoreError> {
        let update = SwitchUpdateRequest {
            id: resp.id.clone(),
            name: resp.name.clone(),
            description: resp.description.clone(),
            mode: Some(resp.mode.clone()).filter(|m| !m.is_empty()),
            management_ip: Some(resp.management_ip.clone()).filter(|m| !m.is_empty()),
            management_user: Some(resp.management_user.clone()).filter(|m| !m.is_empty()),
            console_command: resp.console_command.clone(),
        };
        Ok(Converted {
            id: resp.id.clone(),
            create: update.clone(),
            update,
        })
    }
}

pub fn switch_sorter() -> Sorter<SwitchResponse> {
    Sorter::<SwitchResponse>::new()
        .str_field("id", |s| s.id.as_str())
        .str_field("partition", |s| {
            s.partition.as_ref().map_or("", |p| p.id.as_str())
        })
        .str_field("rack", |s| s.rack_id.as_str())
        .str_field("os", |s| s.os.vendor.as_str())
        .str_field("version", |s| s.os.version.as_str())
        .field("sync", |a, b, d| {
            cmp_opt(
                a.last_sync.as_ref().and_then(|s| s.time.as_ref()),
                b.last_sync.as_ref().and_then(|s| s.time.as_ref()),
                d,
            )
        })
        .default_keys(&["partition", "rack", "id"])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use metal_api::models::SwitchOs;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entities::testing::{offline_client, reread};

    fn leaf() -> SwitchResponse {
        SwitchResponse {
            id: "leaf01".into(),
            name: Some("leaf01".into()),
            rack_id: "rack-1".into(),
            mode: "operational".into(),
            os: SwitchOs {
                vendor: "SONiC".into(),
                version: "ec202211".into(),
                ..SwitchOs::default()
            },
            management_ip: "10.1.1.1".into(),
            management_user: "admin".into(),
            ..SwitchResponse::default()
        }
    }

    #[test]
    fn described_switch_reapplies_as_its_conversion() {
        let switch = leaf();
        let converted = SwitchAdapter::new(offline_client()).convert(&switch).unwrap();

        assert_eq!(converted.id, "leaf01");
        assert_eq!(reread::<SwitchUpdateRequest>(&switch), converted.update);
    }

    #[test]
    fn empty_switch_fields_are_left_unchanged() {
        let switch = SwitchResponse {
            mode: String::new(),
            management_user: String::new(),
            ..leaf()
        };
        let converted = SwitchAdapter::new(offline_client()).convert(&switch).unwrap();

        assert_eq!(converted.update.mode, None);
        assert_eq!(converted.update.management_user, None);
        assert_eq!(converted.update.management_ip.as_deref(), Some("10.1.1.1"));
    }
}
