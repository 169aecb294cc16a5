use metal_api::MetalClient;
use metal_api::models::{ImageCreateRequest, ImageFilter, ImageResponse, ImageUpdateRequest};

use crate::adapter::{Converted, EntityAdapter};
use crate::error::CoreError;
use crate::sort::{Sorter, cmp_opt};

#[derive(Debug, Clone)]
pub struct ImageAdapter {
    client: MetalClient,
}

impl ImageAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

/// Split an image id like `ubuntu-24.04` into os and version.
pub fn os_and_version(id: &str) -> (&str, &str) {
    id.rsplit_once('-').unwrap_or((id, ""))
}

fn matches(filter: &ImageFilter, image: &ImageResponse) -> bool {
    let (os, version) = os_and_version(&image.id);
    let eq = |want: &Option<String>, got: &str| want.as_deref().is_none_or(|w| w == got);
    eq(&filter.id, &image.id)
        && eq(&filter.name, image.name.as_deref().unwrap_or_default())
        && eq(&filter.os, os)
        && eq(&filter.version, version)
        && eq(
            &filter.classification,
            image.classification.as_deref().unwrap_or_default(),
        )
        && filter
            .feature
            .as_ref()
            .is_none_or(|f| image.features.iter().any(|x| x == f))
}

impl EntityAdapter for ImageAdapter {
    type Response = ImageResponse;
    type CreateRequest = ImageCreateRequest;
    type UpdateRequest = ImageUpdateRequest;
    type Filter = ImageFilter;

    const KIND: &'static str = "image";

    async fn get(&self, id: &str) -> Result<ImageResponse, CoreError> {
        Ok(self.client.get_image(id).await?)
    }

    async fn list(&self, filter: &ImageFilter) -> Result<Vec<ImageResponse>, CoreError> {
        let images = self.client.list_images(filter.show_usage).await?;
        Ok(images.into_iter().filter(|i| matches(filter, i)).collect())
    }

    async fn create(&self, req: &ImageCreateRequest) -> Result<ImageResponse, CoreError> {
        Ok(self.client.create_image(req).await?)
    }

    async fn update(&self, req: &ImageUpdateRequest) -> Result<ImageResponse, CoreError> {
        Ok(self.client.update_image(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<ImageResponse, CoreError> {
        Ok(self.client.delete_image(id).await?)
    }

    fn id(resp: &ImageResponse) -> String {
        resp.id.clone()
    }

    fn completion_hint(resp: &ImageResponse) -> Option<String> {
        resp.name.clone()
    }

    fn convert(
        &self,
        resp: &ImageResponse,
    ) -> Result<Converted<ImageCreateRequest, ImageUpdateRequest>, CoreError> {
        Ok(Converted {
            id: resp.id.clone(),
            create: ImageCreateRequest {
                id: resp.id.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                url: resp.url.clone(),
                features: resp.features.clone(),
                classification: resp.classification.clone(),
                expiration_date: resp.expiration_date,
                labels: resp.labels.clone(),
            },
            update: ImageUpdateRequest {
                id: resp.id.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                url: Some(resp.url.clone()),
                features: resp.features.clone(),
                classification: resp.classification.clone(),
                expiration_date: resp.expiration_date,
                labels: resp.labels.clone(),
            },
        })
    }
}

pub fn image_sorter() -> Sorter<ImageResponse> {
    Sorter::<ImageResponse>::new()
        .str_field("id", |i| i.id.as_str())
        .str_field("name", |i| i.name.as_deref().unwrap_or_default())
        .str_field("os", |i| os_and_version(&i.id).0)
        .str_field("version", |i| os_and_version(&i.id).1)
        .str_field("classification", |i| {
            i.classification.as_deref().unwrap_or_default()
        })
        .field("expiration", |a, b, d| {
            cmp_opt(a.expiration_date.as_ref(), b.expiration_date.as_ref(), d)
        })
        .default_keys(&["id"])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entities::testing::{offline_client, reread};

    #[test]
    fn os_version_split_uses_last_dash() {
        assert_eq!(os_and_version("ubuntu-24.04"), ("ubuntu", "24.04"));
        assert_eq!(os_and_version("firewall-ubuntu-3.0"), ("firewall-ubuntu", "3.0"));
        assert_eq!(os_and_version("debian"), ("debian", ""));
    }

    #[test]
    fn filter_by_feature_and_os() {
        let image = ImageResponse {
            id: "ubuntu-24.04".into(),
            features: vec!["machine".into()],
            ..ImageResponse::default()
        };
        let by_os = ImageFilter {
            os: Some("ubuntu".into()),
            ..ImageFilter::default()
        };
        let by_feature = ImageFilter {
            feature: Some("firewall".into()),
            ..ImageFilter::default()
        };
        assert!(matches(&ImageFilter::default(), &image));
        assert!(matches(&by_os, &image));
        assert!(!matches(&by_feature, &image));
    }

    #[test]
    fn described_image_reapplies_as_its_conversion() {
        let image = ImageResponse {
            id: "ubuntu-24.04".into(),
            name: Some("Ubuntu 24.04".into()),
            url: "https://images.metal-stack.io/ubuntu/24.04/img.tar.lz4".into(),
            features: vec!["machine".into()],
            classification: Some("supported".into()),
            expiration_date: Some(Utc.with_ymd_and_hms(2027, 1, 31, 0, 0, 0).unwrap()),
            usedby: vec!["m1".into()],
            ..ImageResponse::default()
        };
        let converted = ImageAdapter::new(offline_client()).convert(&image).unwrap();

        assert_eq!(converted.update.url.as_deref(), Some(image.url.as_str()));
        assert_eq!(reread::<ImageCreateRequest>(&image), converted.create);
        assert_eq!(reread::<ImageUpdateRequest>(&image), converted.update);
    }
}
