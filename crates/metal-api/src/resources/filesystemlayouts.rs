use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{
    FilesystemLayoutCreateRequest, FilesystemLayoutMatchRequest, FilesystemLayoutResponse,
    FilesystemLayoutTryRequest, FilesystemLayoutUpdateRequest,
};

impl MetalClient {
    pub async fn list_filesystem_layouts(&self) -> Result<Vec<FilesystemLayoutResponse>, Error> {
        self.get("v1/filesystemlayout").await
    }

    pub async fn get_filesystem_layout(&self, id: &str) -> Result<FilesystemLayoutResponse, Error> {
        self.get(&format!("v1/filesystemlayout/{}", segment(id)))
            .await
    }

    pub async fn create_filesystem_layout(
        &self,
        req: &FilesystemLayoutCreateRequest,
    ) -> Result<FilesystemLayoutResponse, Error> {
        self.put("v1/filesystemlayout", req).await
    }

    pub async fn update_filesystem_layout(
        &self,
        req: &FilesystemLayoutUpdateRequest,
    ) -> Result<FilesystemLayoutResponse, Error> {
        self.post("v1/filesystemlayout", req).await
    }

    pub async fn delete_filesystem_layout(
        &self,
        id: &str,
    ) -> Result<FilesystemLayoutResponse, Error> {
        self.delete(&format!("v1/filesystemlayout/{}", segment(id)))
            .await
    }

    /// Which layout would be chosen for a size and image.
    ///
    /// `POST /v1/filesystemlayout/try`
    pub async fn try_filesystem_layout(
        &self,
        req: &FilesystemLayoutTryRequest,
    ) -> Result<FilesystemLayoutResponse, Error> {
        self.post("v1/filesystemlayout/try", req).await
    }

    /// Check whether a machine's disks fit a layout.
    ///
    /// `POST /v1/filesystemlayout/matches`
    pub async fn match_filesystem_layout(
        &self,
        req: &FilesystemLayoutMatchRequest,
    ) -> Result<FilesystemLayoutResponse, Error> {
        self.post("v1/filesystemlayout/matches", req).await
    }
}
