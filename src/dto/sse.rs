use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug)]
/// Dispatched payload carried across the panel SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Severity of a transient notification.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Serialize, ToSchema, Clone)]
/// Toast shown by the view and dismissed after `ttl_ms`.
pub struct NotificationEvent {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub ttl_ms: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the results push channel connects or drops.
pub struct PushStatusEvent {
    pub connected: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the banner has been cleared.
pub struct ResultsClearedEvent {
    pub cleared: bool,
}
