/// Board animations and the cancellable follow-up.
pub mod animation;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Operator workflow: selection, finalize, reveal and results management.
pub mod panel_service;
/// Results push-channel supervisor.
pub mod reconciler;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Ordered dispatch of board intents.
pub mod sync;
