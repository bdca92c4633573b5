use serde::Serialize;
use utoipa::ToSchema;

/// Whether the data store answered the last ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Backend serving profile queries (`postgrest` or `memory`).
    pub store: String,
    /// Round trip of the store ping.
    pub latency_ms: u64,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}
