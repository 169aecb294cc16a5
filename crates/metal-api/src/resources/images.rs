use tracing::debug;

use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{ImageCreateRequest, ImageResponse, ImageUpdateRequest};

impl MetalClient {
    /// `GET /v1/image[?show-usage=true]`
    pub async fn list_images(&self, show_usage: bool) -> Result<Vec<ImageResponse>, Error> {
        if show_usage {
            self.get_with_params("v1/image", &[("show-usage", "true".into())])
                .await
        } else {
            self.get("v1/image").await
        }
    }

    /// `GET /v1/image/{id}`
    pub async fn get_image(&self, id: &str) -> Result<ImageResponse, Error> {
        self.get(&format!("v1/image/{}", segment(id))).await
    }

    /// `PUT /v1/image`
    pub async fn create_image(&self, req: &ImageCreateRequest) -> Result<ImageResponse, Error> {
        debug!(id = %req.id, "creating image");
        self.put("v1/image", req).await
    }

    /// `POST /v1/image`
    pub async fn update_image(&self, req: &ImageUpdateRequest) -> Result<ImageResponse, Error> {
        self.post("v1/image", req).await
    }

    /// `DELETE /v1/image/{id}`
    pub async fn delete_image(&self, id: &str) -> Result<ImageResponse, Error> {
        self.delete(&format!("v1/image/{}", segment(id))).await
    }
}
