use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with the push-channel status.
pub fn health_status(state: &SharedState) -> HealthResponse {
    if state.is_push_connected() {
        HealthResponse::ok()
    } else {
        warn!("results push channel disconnected (degraded mode)");
        HealthResponse::degraded()
    }
}
