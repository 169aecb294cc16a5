use metal_api::MetalClient;
use metal_api::models::FilesystemLayoutResponse;

use crate::adapter::{Converted, EntityAdapter};
use crate::error::CoreError;
use crate::sort::Sorter;

#[derive(Debug, Clone)]
pub struct FilesystemLayoutAdapter {
    client: MetalClient,
}

impl FilesystemLayoutAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for FilesystemLayoutAdapter {
    type Response = FilesystemLayoutResponse;
    type CreateRequest = FilesystemLayoutResponse;
    type UpdateRequest = FilesystemLayoutResponse;
    type Filter = ();

    const KIND: &'static str = "filesystem layout";

    async fn get(&self, id: &str) -> Result<FilesystemLayoutResponse, CoreError> {
        Ok(self.client.get_filesystem_layout(id).await?)
    }

    async fn list(&self, _: &()) -> Result<Vec<FilesystemLayoutResponse>, CoreError> {
        Ok(self.client.list_filesystem_layouts().await?)
    }

    async fn create(
        &self,
        req: &FilesystemLayoutResponse,
    ) -> Result<FilesystemLayoutResponse, CoreError> {
        Ok(self.client.create_filesystem_layout(req).await?)
    }

    async fn update(
        &self,
        req: &FilesystemLayoutResponse,
    ) -> Result<FilesystemLayoutResponse, CoreError> {
        Ok(self.client.update_filesystem_layout(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<FilesystemLayoutResponse, CoreError> {
        Ok(self.client.delete_filesystem_layout(id).await?)
    }

    fn id(resp: &FilesystemLayoutResponse) -> String {
        resp.id.clone()
    }

    fn completion_hint(resp: &FilesystemLayoutResponse) -> Option<String> {
        resp.description.clone()
    }

    fn convert(
        &self,
        resp: &FilesystemLayoutResponse,
    ) -> Result<Converted<FilesystemLayoutResponse, FilesystemLayoutResponse>, CoreError> {
        Ok(Converted {
            id: resp.id.clone(),
            create: resp.clone(),
            update: resp.clone(),
        })
    }
}

pub fn filesystem_layout_sorter() -> Sorter<FilesystemLayoutResponse> {
    Sorter::<FilesystemLayoutResponse>::new()
        .str_field("id", |f| f.id.as_str())
        .str_field("name", |f| f.name.as_deref().unwrap_or_default())
        .default_keys(&["id"])
}
