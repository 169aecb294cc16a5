// ── Projects and tenants ──
//
// Both share the `meta` envelope the API uses for ownership records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Quota>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<Quota>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<Quota>,
}

// ── Project ─────────────────────────────────────────────────────────

/// The project id lives on the top level in JSON so templates can use
/// `{{ .id }}`; the `meta` envelope carries labels and annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotas: Option<QuotaSet>,
}

/// Projects are created and updated with the full shape.
pub type ProjectCreateRequest = ProjectResponse;
pub type ProjectUpdateRequest = ProjectResponse;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFindRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl ProjectFindRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ── Tenant ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_quotas: Option<QuotaSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotas: Option<QuotaSet>,
}

pub type TenantCreateRequest = TenantResponse;
pub type TenantUpdateRequest = TenantResponse;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantFindRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TenantFindRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
