use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootconfig: Option<PartitionBootConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mgmtserviceaddress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privatenetworkprefixlength: Option<u8>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionBootConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imageurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernelurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commandline: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionCreateRequest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootconfig: Option<PartitionBootConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mgmtserviceaddress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privatenetworkprefixlength: Option<u8>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionUpdateRequest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootconfig: Option<PartitionBootConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mgmtserviceaddress: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

// ── Capacity ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionCapacityRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizeid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionCapacity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub servers: Vec<ServerCapacity>,
}

/// Machine counts for one size within a partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCapacity {
    pub size: String,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub free: u32,
    #[serde(default)]
    pub allocated: u32,
    #[serde(default)]
    pub reservations: u32,
    #[serde(default)]
    pub usedreservations: u32,
    #[serde(default)]
    pub faulty: u32,
    #[serde(default)]
    pub other: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faultymachines: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub othermachines: Vec<String>,
}
