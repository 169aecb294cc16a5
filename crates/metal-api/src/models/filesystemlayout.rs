use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesystemLayoutResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub filesystems: Vec<Filesystem>,
    #[serde(default)]
    pub disks: Vec<Disk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raid: Vec<Raid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumegroups: Vec<VolumeGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logicalvolumes: Vec<LogicalVolume>,
    #[serde(default)]
    pub constraints: FilesystemLayoutConstraints,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub device: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mountoptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub createoptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub device: String,
    #[serde(default)]
    pub partitions: Vec<DiskPartition>,
    #[serde(default)]
    pub wipeonreinstall: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskPartition {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Size in MiB; zero takes the remaining space.
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpttype: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raid {
    pub arrayname: String,
    pub devices: Vec<String>,
    pub level: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub createoptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spares: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGroup {
    pub name: String,
    pub devices: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalVolume {
    pub name: String,
    pub volumegroup: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub lvmtype: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemLayoutConstraints {
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Image id to semver constraint.
    #[serde(default)]
    pub images: std::collections::BTreeMap<String, String>,
}

/// Filesystem layouts are created and updated with the full shape.
pub type FilesystemLayoutCreateRequest = FilesystemLayoutResponse;
pub type FilesystemLayoutUpdateRequest = FilesystemLayoutResponse;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemLayoutTryRequest {
    pub size: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemLayoutMatchRequest {
    pub machine: String,
    pub filesystemlayout: String,
}
