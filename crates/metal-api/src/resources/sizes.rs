// Size endpoints, including image constraints and reservations.

use tracing::debug;

use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{
    SizeCreateRequest, SizeImageConstraintCreateRequest, SizeImageConstraintResponse,
    SizeImageConstraintTryRequest, SizeImageConstraintUpdateRequest,
    SizeReservationCreateRequest, SizeReservationFindRequest, SizeReservationResponse,
    SizeReservationUpdateRequest, SizeReservationUsageResponse, SizeResponse,
    SizeSuggestRequest, SizeUpdateRequest,
};

impl MetalClient {
    // ── Sizes ────────────────────────────────────────────────────────

    pub async fn list_sizes(&self) -> Result<Vec<SizeResponse>, Error> {
        self.get("v1/size").await
    }

    pub async fn get_size(&self, id: &str) -> Result<SizeResponse, Error> {
        self.get(&format!("v1/size/{}", segment(id))).await
    }

    pub async fn create_size(&self, req: &SizeCreateRequest) -> Result<SizeResponse, Error> {
        debug!(id = %req.id, "creating size");
        self.put("v1/size", req).await
    }

    pub async fn update_size(&self, req: &SizeUpdateRequest) -> Result<SizeResponse, Error> {
        self.post("v1/size", req).await
    }

    pub async fn delete_size(&self, id: &str) -> Result<SizeResponse, Error> {
        self.delete(&format!("v1/size/{}", segment(id))).await
    }

    /// Derive a size definition from the hardware of an existing machine.
    ///
    /// `POST /v1/size/suggest`
    pub async fn suggest_size(&self, machine_id: &str) -> Result<SizeResponse, Error> {
        let req = SizeSuggestRequest {
            machineid: machine_id.to_owned(),
        };
        self.post("v1/size/suggest", &req).await
    }

    // ── Image constraints ────────────────────────────────────────────

    pub async fn list_size_image_constraints(
        &self,
    ) -> Result<Vec<SizeImageConstraintResponse>, Error> {
        self.get("v1/size-image-constraint").await
    }

    pub async fn get_size_image_constraint(
        &self,
        id: &str,
    ) -> Result<SizeImageConstraintResponse, Error> {
        self.get(&format!("v1/size-image-constraint/{}", segment(id)))
            .await
    }

    pub async fn create_size_image_constraint(
        &self,
        req: &SizeImageConstraintCreateRequest,
    ) -> Result<SizeImageConstraintResponse, Error> {
        self.put("v1/size-image-constraint", req).await
    }

    pub async fn update_size_image_constraint(
        &self,
        req: &SizeImageConstraintUpdateRequest,
    ) -> Result<SizeImageConstraintResponse, Error> {
        self.post("v1/size-image-constraint", req).await
    }

    pub async fn delete_size_image_constraint(
        &self,
        id: &str,
    ) -> Result<SizeImageConstraintResponse, Error> {
        self.delete(&format!("v1/size-image-constraint/{}", segment(id)))
            .await
    }

    /// Check whether an image may be deployed on a size. A rejection comes
    /// back as an API error carrying the reason.
    ///
    /// `POST /v1/size-image-constraint/try`
    pub async fn try_size_image_constraint(
        &self,
        req: &SizeImageConstraintTryRequest,
    ) -> Result<(), Error> {
        let _: serde_json::Value = self.post("v1/size-image-constraint/try", req).await?;
        Ok(())
    }

    // ── Reservations ─────────────────────────────────────────────────

    pub async fn list_size_reservations(&self) -> Result<Vec<SizeReservationResponse>, Error> {
        self.get("v1/size-reservation").await
    }

    pub async fn find_size_reservations(
        &self,
        find: &SizeReservationFindRequest,
    ) -> Result<Vec<SizeReservationResponse>, Error> {
        self.post("v1/size-reservation/find", find).await
    }

    pub async fn get_size_reservation(&self, id: &str) -> Result<SizeReservationResponse, Error> {
        self.get(&format!("v1/size-reservation/{}", segment(id)))
            .await
    }

    pub async fn create_size_reservation(
        &self,
        req: &SizeReservationCreateRequest,
    ) -> Result<SizeReservationResponse, Error> {
        self.put("v1/size-reservation", req).await
    }

    pub async fn update_size_reservation(
        &self,
        req: &SizeReservationUpdateRequest,
    ) -> Result<SizeReservationResponse, Error> {
        self.post("v1/size-reservation", req).await
    }

    pub async fn delete_size_reservation(
        &self,
        id: &str,
    ) -> Result<SizeReservationResponse, Error> {
        self.delete(&format!("v1/size-reservation/{}", segment(id)))
            .await
    }

    /// `POST /v1/size-reservation/usage`
    pub async fn size_reservation_usage(
        &self,
        find: &SizeReservationFindRequest,
    ) -> Result<Vec<SizeReservationUsageResponse>, Error> {
        self.post("v1/size-reservation/usage", find).await
    }
}
