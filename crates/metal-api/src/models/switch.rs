use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PartitionResponse;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rack_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionResponse>,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub os: SwitchOs,
    #[serde(default)]
    pub management_ip: String,
    #[serde(default)]
    pub management_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_command: Option<String>,
    #[serde(default)]
    pub nics: Vec<SwitchNic>,
    /// Machine id to the switch ports it is connected to.
    #[serde(default)]
    pub connections: Vec<SwitchConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<SwitchSync>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_error: Option<SwitchSync>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchOs {
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub metal_core_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchNic {
    pub name: String,
    pub mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<SwitchNicFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchNicFilter {
    #[serde(default)]
    pub cidrs: Vec<String>,
    #[serde(default)]
    pub vnis: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConnection {
    #[serde(default)]
    pub machine_id: String,
    #[serde(default)]
    pub nic: SwitchNic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchSync {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// Duration in nanoseconds.
    #[serde(default)]
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchUpdateRequest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_command: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchFindRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchPortToggleRequest {
    pub nic: String,
    /// `UP` or `DOWN`.
    pub status: String,
}
