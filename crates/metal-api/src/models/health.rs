use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregated health of the API and its backing services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy`, `degraded`, `unhealthy` or `unknown`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub services: BTreeMap<String, HealthResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResult {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}
