use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the tote panel.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::panel::get_panel,
        crate::routes::panel::start,
        crate::routes::panel::select,
        crate::routes::panel::go_back,
        crate::routes::panel::reset,
        crate::routes::panel::finalize,
        crate::routes::panel::reveal,
        crate::routes::panel::dismiss,
        crate::routes::results::get_results,
        crate::routes::results::clear_results,
        crate::routes::device::trigger_animation,
        crate::routes::device::send_command,
        crate::routes::sse::panel_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::panel::PanelSnapshot,
            crate::dto::panel::SelectionSnapshot,
            crate::dto::panel::VisibleStep,
            crate::dto::results::RaceResultDto,
            crate::dto::results::ResultOriginDto,
            crate::dto::results::CommittedResultDto,
            crate::dto::results::PendingResultDto,
            crate::dto::results::ResultsResponse,
            crate::dto::device::CommandRequest,
            crate::dto::device::CommandResponse,
            crate::dto::device::ActionResponse,
            crate::dto::sse::NotificationEvent,
            crate::dto::sse::NotificationLevel,
            crate::dto::sse::PushStatusEvent,
            crate::dto::sse::ResultsClearedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "panel", description = "Win/place/show selection and reveal workflow"),
        (name = "results", description = "Committed race results"),
        (name = "device", description = "Direct device controller operations"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
