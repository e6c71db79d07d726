use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{panel::PanelSnapshot, results::ResultsResponse},
    error::AppError,
    services::panel_service,
    state::SharedState,
};

/// Routes exposing the committed banner.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/results", get(get_results))
        .route("/results/clear", post(clear_results))
}

/// Return the result shown on the banner.
#[utoipa::path(
    get,
    path = "/results",
    tag = "results",
    responses((status = 200, description = "Committed results", body = ResultsResponse))
)]
pub async fn get_results(State(state): State<SharedState>) -> Json<ResultsResponse> {
    Json(ResultsResponse {
        results: panel_service::committed(&state).await,
    })
}

/// Clear the results on the backend and the banner.
#[utoipa::path(
    post,
    path = "/results/clear",
    tag = "results",
    responses(
        (status = 200, description = "Results cleared", body = PanelSnapshot),
        (status = 502, description = "Backend refused to clear")
    )
)]
pub async fn clear_results(
    State(state): State<SharedState>,
) -> Result<Json<PanelSnapshot>, AppError> {
    Ok(Json(panel_service::clear_results(&state).await?))
}
