// Sizes and the two size-scoped entities: image constraints and reservations.

use metal_api::MetalClient;
use metal_api::models::{
    SizeCreateRequest, SizeImageConstraintCreateRequest, SizeImageConstraintResponse,
    SizeImageConstraintUpdateRequest, SizeReservationCreateRequest, SizeReservationFindRequest,
    SizeReservationResponse, SizeReservationUpdateRequest, SizeResponse, SizeUpdateRequest,
};

use crate::adapter::{Converted, EntityAdapter};
use crate::error::CoreError;
use crate::sort::{Sorter, cmp_ord};

// ── Size ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SizeAdapter {
    client: MetalClient,
}

impl SizeAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for SizeAdapter {
    type Response = SizeResponse;
    type CreateRequest = SizeCreateRequest;
    type UpdateRequest = SizeUpdateRequest;
    type Filter = ();

    const KIND: &'static str = "size";

    async fn get(&self, id: &str) -> Result<SizeResponse, CoreError> {
        Ok(self.client.get_size(id).await?)
    }

    async fn list(&self, _: &()) -> Result<Vec<SizeResponse>, CoreError> {
        Ok(self.client.list_sizes().await?)
    }

    async fn create(&self, req: &SizeCreateRequest) -> Result<SizeResponse, CoreError> {
        Ok(self.client.create_size(req).await?)
    }

    async fn update(&self, req: &SizeUpdateRequest) -> Result<SizeResponse, CoreError> {
        Ok(self.client.update_size(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<SizeResponse, CoreError> {
        Ok(self.client.delete_size(id).await?)
    }

    fn id(resp: &SizeResponse) -> String {
        resp.id.clone()
    }

    fn completion_hint(resp: &SizeResponse) -> Option<String> {
        resp.name.clone()
    }

    fn convert(
        &self,
        resp: &SizeResponse,
    ) -> Result<Converted<SizeCreateRequest, SizeUpdateRequest>, CoreError> {
        let req = SizeCreateRequest {
            id: resp.id.clone(),
            name: resp.name.clone(),
            description: resp.description.clone(),
            constraints: resp.constraints.clone(),
            labels: resp.labels.clone(),
        };
        Ok(Converted {
            id: resp.id.clone(),
            create: req.clone(),
            update: req,
        })
    }
}

pub fn size_sorter() -> Sorter<SizeResponse> {
    Sorter::<SizeResponse>::new()
        .str_field("id", |s| s.id.as_str())
        .str_field("name", |s| s.name.as_deref().unwrap_or_default())
        .default_keys(&["id"])
}

// ── Image constraint ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SizeImageConstraintAdapter {
    client: MetalClient,
}

impl SizeImageConstraintAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for SizeImageConstraintAdapter {
    type Response = SizeImageConstraintResponse;
    type CreateRequest = SizeImageConstraintCreateRequest;
    type UpdateRequest = SizeImageConstraintUpdateRequest;
    type Filter = ();

    const KIND: &'static str = "size image constraint";

    async fn get(&self, id: &str) -> Result<SizeImageConstraintResponse, CoreError> {
        Ok(self.client.get_size_image_constraint(id).await?)
    }

    async fn list(&self, _: &()) -> Result<Vec<SizeImageConstraintResponse>, CoreError> {
        Ok(self.client.list_size_image_constraints().await?)
    }

    async fn create(
        &self,
        req: &SizeImageConstraintCreateRequest,
    ) -> Result<SizeImageConstraintResponse, CoreError> {
        Ok(self.client.create_size_image_constraint(req).await?)
    }

    async fn update(
        &self,
        req: &SizeImageConstraintUpdateRequest,
    ) -> Result<SizeImageConstraintResponse, CoreError> {
        Ok(self.client.update_size_image_constraint(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<SizeImageConstraintResponse, CoreError> {
        Ok(self.client.delete_size_image_constraint(id).await?)
    }

    fn id(resp: &SizeImageConstraintResponse) -> String {
        resp.id.clone()
    }

    fn convert(
        &self,
        resp: &SizeImageConstraintResponse,
    ) -> Result<
        Converted<SizeImageConstraintCreateRequest, SizeImageConstraintUpdateRequest>,
        CoreError,
    > {
        let req = SizeImageConstraintCreateRequest {
            id: resp.id.clone(),
            name: resp.name.clone(),
            description: resp.description.clone(),
            constraints: resp.constraints.clone(),
        };
        Ok(Converted {
            id: resp.id.clone(),
            create: req.clone(),
            update: req,
        })
    }
}

pub fn size_image_constraint_sorter() -> Sorter<SizeImageConstraintResponse> {
    Sorter::<SizeImageConstraintResponse>::new()
        .str_field("id", |s| s.id.as_str())
        .str_field("name", |s| s.name.as_deref().unwrap_or_default())
        .default_keys(&["id"])
}

// ── Reservation ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SizeReservationAdapter {
    client: MetalClient,
}

impl SizeReservationAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for SizeReservationAdapter {
    type Response = SizeReservationResponse;
    type CreateRequest = SizeReservationCreateRequest;
    type UpdateRequest = SizeReservationUpdateRequest;
    type Filter = SizeReservationFindRequest;

    const KIND: &'static str = "size reservation";

    async fn get(&self, id: &str) -> Result<SizeReservationResponse, CoreError> {
        Ok(self.client.get_size_reservation(id).await?)
    }

    async fn list(
        &self,
        filter: &SizeReservationFindRequest,
    ) -> Result<Vec<SizeReservationResponse>, CoreError> {
        if *filter == SizeReservationFindRequest::default() {
            Ok(self.client.list_size_reservations().await?)
        } else {
            Ok(self.client.find_size_reservations(filter).await?)
        }
    }

    async fn create(
        &self,
        req: &SizeReservationCreateRequest,
    ) -> Result<SizeReservationResponse, CoreError> {
        Ok(self.client.create_size_reservation(req).await?)
    }

    async fn update(
        &self,
        req: &SizeReservationUpdateRequest,
    ) -> Result<SizeReservationResponse, CoreError> {
        Ok(self.client.update_size_reservation(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<SizeReservationResponse, CoreError> {
        Ok(self.client.delete_size_reservation(id).await?)
    }

    fn id(resp: &SizeReservationResponse) -> String {
        resp.id.clone()
    }

    fn completion_hint(resp: &SizeReservationResponse) -> Option<String> {
        Some(format!("{} in {}", resp.sizeid, resp.projectid))
    }

    fn convert(
        &self,
        resp: &SizeReservationResponse,
    ) -> Result<Converted<SizeReservationCreateRequest, SizeReservationUpdateRequest>, CoreError>
    {
        Ok(Converted {
            id: resp.id.clone(),
            create: SizeReservationCreateRequest {
                id: resp.id.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                sizeid: resp.sizeid.clone(),
                partitionids: resp.partitionids.clone(),
                projectid: resp.projectid.clone(),
                amount: resp.amount,
                labels: resp.labels.clone(),
            },
            update: SizeReservationUpdateRequest {
                id: resp.id.clone(),
                name: resp.name.clone(),
                description: resp.description.clone(),
                partitionids: resp.partitionids.clone(),
                amount: Some(resp.amount),
                labels: resp.labels.clone(),
            },
        })
    }
}

pub fn size_reservation_sorter() -> Sorter<SizeReservationResponse> {
    Sorter::<SizeReservationResponse>::new()
        .str_field("id", |r| r.id.as_str())
        .str_field("size", |r| r.sizeid.as_str())
        .str_field("project", |r| r.projectid.as_str())
        .field("amount", |a, b, d| cmp_ord(&a.amount, &b.amount, d))
        .default_keys(&["size", "project", "id"])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use metal_api::models::{SizeConstraint, SizeImageConstraints};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entities::testing::{offline_client, reread};

    #[test]
    fn described_size_reapplies_as_its_conversion() {
        let size = SizeResponse {
            id: "c1-xlarge-x86".into(),
            name: Some("c1-xlarge-x86".into()),
            constraints: vec![
                SizeConstraint {
                    kind: "cores".into(),
                    min: 28,
                    max: 28,
                    identifier: None,
                },
                SizeConstraint {
                    kind: "gpu".into(),
                    min: 1,
                    max: 1,
                    identifier: Some("AD102GL*".into()),
                },
            ],
            ..SizeResponse::default()
        };
        let converted = SizeAdapter::new(offline_client()).convert(&size).unwrap();

        assert_eq!(converted.create, converted.update);
        assert_eq!(reread::<SizeCreateRequest>(&size), converted.create);
    }

    #[test]
    fn described_image_constraint_reapplies_as_its_conversion() {
        let constraint = SizeImageConstraintResponse {
            id: "g1-medium-x86".into(),
            constraints: SizeImageConstraints {
                images: BTreeMap::from([("ubuntu".to_owned(), ">= 22.04".to_owned())]),
            },
            ..SizeImageConstraintResponse::default()
        };
        let converted = SizeImageConstraintAdapter::new(offline_client())
            .convert(&constraint)
            .unwrap();

        assert_eq!(
            reread::<SizeImageConstraintCreateRequest>(&constraint),
            converted.create
        );
    }

    #[test]
    fn described_reservation_reapplies_as_its_conversion() {
        let reservation = SizeReservationResponse {
            id: "r1".into(),
            sizeid: "c1-xlarge-x86".into(),
            partitionids: vec!["fra-equ01".into()],
            projectid: "p1".into(),
            amount: 3,
            ..SizeReservationResponse::default()
        };
        let converted = SizeReservationAdapter::new(offline_client())
            .convert(&reservation)
            .unwrap();

        assert_eq!(converted.update.amount, Some(3));
        assert_eq!(reread::<SizeReservationCreateRequest>(&reservation), converted.create);
        assert_eq!(reread::<SizeReservationUpdateRequest>(&reservation), converted.update);
    }
}
