use metal_api::MetalClient;
use metal_api::models::{PartitionCreateRequest, PartitionResponse, PartitionUpdateRequest};

use crate::adapter::{Converted, EntityAdapter};
use crate::error::CoreError;
use crate::sort::Sorter;

#[derive(Debug, Clone)]
pub struct PartitionAdapter {
    client: MetalClient,
}

impl PartitionAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for PartitionAdapter {
    type Response = PartitionResponse;
    type CreateRequest = PartitionCreateRequest;
    type UpdateRequest = PartitionUpdateRequest;
    type Filter = ();

    const KIND: &'static str = "partition";

    async fn get(&self, id: &str) -> Result<PartitionResponse, CoreError> {
        Ok(self.client.get_partition(id).await?)
    }

    async fn list(&self, _: &()) -> Result<Vec<PartitionResponse>, CoreError> {
        Ok(self.client.list_partitions().await?)
    }

    async fn create(&self, req: &PartitionCreateRequest) -> Result<PartitionResponse, CoreError> {
        Ok(self.client.create_partition(req).await?)
    }

    async fn update(&self, req: &PartitionUpdateRequest) -> Result<PartitionResponse, CoreError> {
        Ok(self.client.update_partition(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<PartitionResponse, CoreError> {
        Ok(self.client.delete_partition(id).await?)
    }

    fn id(resp: &PartitionResponse) -> String {
        resp.id.clone()
    }

    fn completion_hint(resp: &PartitionResponse) -> Option<String> {
        resp.description.clone()
    }

    fn convert(
        &self,
        resp: &PartitionResponse,
    ) -> Result<Converted<PartitionCreateRequest, PartitionUpdateRequest>, CoreError> {
        Ok(Converted {
            id: resp.id.clone(),
            create: PartitionCreateRequest {
                id: resp.id.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                bootconfig: resp.bootconfig.clone(),
                mgmtserviceaddress: resp.mgmtserviceaddress.clone(),
                privatenetworkprefixlength: resp.privatenetworkprefixlength,
                labels: resp.labels.clone(),
            },
            update: PartitionUpdateRequest {
                id: resp.id.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                bootconfig: resp.bootconfig.clone(),
                mgmtserviceaddress: resp.mgmtserviceaddress.clone(),
                labels: resp.labels.clone(),
            },
        })
    }
}

pub fn partition_sorter() -> Sorter<PartitionResponse> {
    Sorter::<PartitionResponse>::new()
        .str_field("id", |p| p.id.as_str())
        .str_field("name", |p| p.name.as_deref().unwrap_or_default())
        .str_field("description", |p| p.description.as_deref().unwrap_or_default())
        .default_keys(&["id"])
}
