use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::panel::PanelSnapshot, error::AppError, services::panel_service, state::SharedState,
};

/// Routes driving the selection and reveal workflow.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/panel", get(get_panel))
        .route("/panel/start", post(start))
        .route("/panel/select/{horse}", post(select))
        .route("/panel/back", post(go_back))
        .route("/panel/reset", post(reset))
        .route("/panel/finalize", post(finalize))
        .route("/panel/reveal", post(reveal))
        .route("/panel/dismiss", post(dismiss))
}

/// Return the current selection, pending push and committed banner.
#[utoipa::path(
    get,
    path = "/panel",
    tag = "panel",
    responses((status = 200, description = "Current panel state", body = PanelSnapshot))
)]
pub async fn get_panel(State(state): State<SharedState>) -> Json<PanelSnapshot> {
    Json(panel_service::snapshot(&state).await)
}

/// Enter the selection workflow from scratch.
#[utoipa::path(
    post,
    path = "/panel/start",
    tag = "panel",
    responses((status = 200, description = "Workflow started", body = PanelSnapshot))
)]
pub async fn start(State(state): State<SharedState>) -> Result<Json<PanelSnapshot>, AppError> {
    Ok(Json(panel_service::start(&state).await?))
}

/// Assign a horse to the current step.
#[utoipa::path(
    post,
    path = "/panel/select/{horse}",
    tag = "panel",
    params(("horse" = String, Path, description = "Horse number")),
    responses(
        (status = 200, description = "Horse selected", body = PanelSnapshot),
        (status = 400, description = "Horse number missing or out of range"),
        (status = 409, description = "Horse already selected")
    )
)]
pub async fn select(
    State(state): State<SharedState>,
    Path(horse): Path<String>,
) -> Result<Json<PanelSnapshot>, AppError> {
    Ok(Json(panel_service::select_input(&state, &horse).await?))
}

/// Undo the previous step.
#[utoipa::path(
    post,
    path = "/panel/back",
    tag = "panel",
    responses(
        (status = 200, description = "Step undone", body = PanelSnapshot),
        (status = 409, description = "Already at the first step")
    )
)]
pub async fn go_back(State(state): State<SharedState>) -> Result<Json<PanelSnapshot>, AppError> {
    Ok(Json(panel_service::go_back(&state).await?))
}

/// Discard every selection.
#[utoipa::path(
    post,
    path = "/panel/reset",
    tag = "panel",
    responses((status = 200, description = "Selection reset", body = PanelSnapshot))
)]
pub async fn reset(State(state): State<SharedState>) -> Result<Json<PanelSnapshot>, AppError> {
    Ok(Json(panel_service::reset(&state).await?))
}

/// Save the selected results and show them on the banner.
#[utoipa::path(
    post,
    path = "/panel/finalize",
    tag = "panel",
    responses(
        (status = 200, description = "Results saved", body = PanelSnapshot),
        (status = 409, description = "Selection incomplete"),
        (status = 502, description = "Backend refused the results")
    )
)]
pub async fn finalize(State(state): State<SharedState>) -> Result<Json<PanelSnapshot>, AppError> {
    Ok(Json(panel_service::finalize(&state).await?))
}

/// Commit the pending pushed result.
#[utoipa::path(
    post,
    path = "/panel/reveal",
    tag = "panel",
    responses(
        (status = 200, description = "Pushed results revealed", body = PanelSnapshot),
        (status = 409, description = "Nothing to reveal")
    )
)]
pub async fn reveal(State(state): State<SharedState>) -> Result<Json<PanelSnapshot>, AppError> {
    Ok(Json(panel_service::reveal(&state).await?))
}

/// Drop the pending pushed result.
#[utoipa::path(
    post,
    path = "/panel/dismiss",
    tag = "panel",
    responses(
        (status = 200, description = "Pushed results dismissed", body = PanelSnapshot),
        (status = 409, description = "Nothing to dismiss")
    )
)]
pub async fn dismiss(State(state): State<SharedState>) -> Result<Json<PanelSnapshot>, AppError> {
    Ok(Json(panel_service::dismiss(&state).await?))
}
