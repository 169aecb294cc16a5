use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub gitsha1: String,
    #[serde(default)]
    pub builddate: String,
    #[serde(default)]
    pub min_client_version: String,
}

// ── VPN ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnAuthKeyRequest {
    pub pid: String,
    #[serde(default)]
    pub ephemeral: bool,
    /// Expiration in nanoseconds, as the API expects a Go duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnAuthKeyResponse {
    pub address: String,
    pub authkey: String,
    #[serde(default)]
    pub ephemeral: bool,
    #[serde(default)]
    pub expires: String,
}
