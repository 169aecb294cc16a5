use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{
    PartitionCapacity, PartitionCapacityRequest, PartitionCreateRequest, PartitionResponse,
    PartitionUpdateRequest,
};

impl MetalClient {
    pub async fn list_partitions(&self) -> Result<Vec<PartitionResponse>, Error> {
        self.get("v1/partition").await
    }

    pub async fn get_partition(&self, id: &str) -> Result<PartitionResponse, Error> {
        self.get(&format!("v1/partition/{}", segment(id))).await
    }

    pub async fn create_partition(
        &self,
        req: &PartitionCreateRequest,
    ) -> Result<PartitionResponse, Error> {
        self.put("v1/partition", req).await
    }

    pub async fn update_partition(
        &self,
        req: &PartitionUpdateRequest,
    ) -> Result<PartitionResponse, Error> {
        self.post("v1/partition", req).await
    }

    pub async fn delete_partition(&self, id: &str) -> Result<PartitionResponse, Error> {
        self.delete(&format!("v1/partition/{}", segment(id))).await
    }

    /// `POST /v1/partition/capacity`
    pub async fn partition_capacity(
        &self,
        req: &PartitionCapacityRequest,
    ) -> Result<Vec<PartitionCapacity>, Error> {
        self.post("v1/partition/capacity", req).await
    }
}
