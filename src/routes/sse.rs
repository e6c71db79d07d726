use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/panel",
    tag = "sse",
    responses((status = 200, description = "Panel SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream panel state, pushed results and notifications to the view.
pub async fn panel_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (receiver, initial) = sse_service::subscribe_panel(&state).await;
    info!("New panel SSE connection");
    sse_service::to_sse_stream(receiver, initial)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/panel", get(panel_stream))
}
