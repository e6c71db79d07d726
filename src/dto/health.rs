use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the results push channel is currently connected.
    pub push_connected: bool,
}

impl HealthResponse {
    /// Panel is serving and the push channel is up.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            push_connected: true,
        }
    }

    /// Panel is serving but pushed results cannot currently be received.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            push_connected: false,
        }
    }
}
