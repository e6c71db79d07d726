use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::post,
};
use axum_valid::Valid;
use serde_json::Value;

use crate::{
    dto::device::{ActionResponse, CommandRequest, CommandResponse},
    error::AppError,
    services::panel_service,
    state::SharedState,
};

/// Routes talking to the device controller directly.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/animation/{name}", post(trigger_animation))
        .route("/command", post(send_command))
}

/// Start an animation, optionally with JSON parameters.
#[utoipa::path(
    post,
    path = "/animation/{name}",
    tag = "device",
    params(("name" = String, Path, description = "Animation name")),
    request_body(content = Object, description = "Optional animation parameters"),
    responses(
        (status = 200, description = "Animation started", body = ActionResponse),
        (status = 400, description = "Invalid animation name"),
        (status = 502, description = "Device controller refused the animation")
    )
)]
pub async fn trigger_animation(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ActionResponse>, AppError> {
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let value = serde_json::from_slice::<Value>(&body)
            .map_err(|err| AppError::BadRequest(format!("invalid animation parameters: {err}")))?;
        Some(value)
    };
    panel_service::trigger_animation(&state, &name, params).await?;
    Ok(Json(ActionResponse::new(format!("animation `{name}` started"))))
}

/// Send a raw command to the device controller.
#[utoipa::path(
    post,
    path = "/command",
    tag = "device",
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Command accepted", body = CommandResponse),
        (status = 400, description = "Invalid command"),
        (status = 502, description = "Device controller refused the command")
    )
)]
pub async fn send_command(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CommandRequest>>,
) -> Result<Json<CommandResponse>, AppError> {
    let response = panel_service::send_command(&state, &payload.command).await?;
    Ok(Json(CommandResponse { response }))
}
