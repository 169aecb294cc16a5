// Audit traces, firmware, health, version and VPN endpoints.

use tracing::debug;

use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{
    AuditFindRequest, AuditResponse, FirmwareFilter, FirmwaresResponse, HealthResponse,
    VersionResponse, VpnAuthKeyRequest, VpnAuthKeyResponse,
};

impl MetalClient {
    // ── Audit ────────────────────────────────────────────────────────

    /// `POST /v1/audit/find`
    pub async fn find_audit_traces(
        &self,
        find: &AuditFindRequest,
    ) -> Result<Vec<AuditResponse>, Error> {
        self.post("v1/audit/find", find).await
    }

    /// Look up a single trace by request id.
    ///
    /// Implemented on top of find, since the API has no direct getter.
    pub async fn get_audit_trace(&self, rqid: &str) -> Result<AuditResponse, Error> {
        let find = AuditFindRequest {
            rqid: Some(rqid.to_owned()),
            ..AuditFindRequest::default()
        };
        self.find_audit_traces(&find)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                message: format!("audit trace with request id {rqid} not found"),
            })
    }

    // ── Firmware ─────────────────────────────────────────────────────

    /// `GET /v1/firmware[?kind=&vendor=&board=]`
    pub async fn list_firmwares(&self, filter: &FirmwareFilter) -> Result<FirmwaresResponse, Error> {
        if let Some(machine) = &filter.machineid {
            return self
                .get(&format!("v1/firmware/{}", segment(machine)))
                .await;
        }
        let params: Vec<(&str, String)> = [
            ("kind", &filter.kind),
            ("vendor", &filter.vendor),
            ("board", &filter.board),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.clone().map(|v| (k, v)))
        .collect();
        self.get_with_params("v1/firmware", &params).await
    }

    /// Upload a firmware binary.
    ///
    /// `PUT /v1/firmware/{kind}/{vendor}/{board}/{revision}` (multipart)
    pub async fn upload_firmware(
        &self,
        kind: &str,
        vendor: &str,
        board: &str,
        revision: &str,
        file_name: String,
        content: Vec<u8>,
    ) -> Result<(), Error> {
        debug!(kind, vendor, board, revision, "uploading firmware");
        let part = reqwest::multipart::Part::bytes(content).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        let _: serde_json::Value = self
            .put_multipart(
                &format!(
                    "v1/firmware/{}/{}/{}/{}",
                    segment(kind),
                    segment(vendor),
                    segment(board),
                    segment(revision)
                ),
                form,
            )
            .await?;
        Ok(())
    }

    /// `DELETE /v1/firmware/{kind}/{vendor}/{board}/{revision}`
    pub async fn remove_firmware(
        &self,
        kind: &str,
        vendor: &str,
        board: &str,
        revision: &str,
    ) -> Result<(), Error> {
        self.delete_empty(&format!(
            "v1/firmware/{}/{}/{}/{}",
            segment(kind),
            segment(vendor),
            segment(board),
            segment(revision)
        ))
        .await
    }

    // ── Health & version ─────────────────────────────────────────────

    /// `GET /v1/health`
    pub async fn health(&self) -> Result<HealthResponse, Error> {
        self.get("v1/health").await
    }

    /// `GET /v1/version`
    pub async fn version(&self) -> Result<VersionResponse, Error> {
        self.get("v1/version").await
    }

    // ── VPN ──────────────────────────────────────────────────────────

    /// `POST /v1/vpn/authkey`
    pub async fn vpn_auth_key(&self, req: &VpnAuthKeyRequest) -> Result<VpnAuthKeyResponse, Error> {
        debug!(project = %req.pid, "requesting vpn auth key");
        self.post("v1/vpn/authkey", req).await
    }
}
