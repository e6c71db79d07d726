use std::time::Duration;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        panel::PanelSnapshot,
        results::{CommittedResultDto, PendingResultDto},
        sse::{
            NotificationEvent, NotificationLevel, PushStatusEvent, ResultsClearedEvent,
            ServerEvent,
        },
    },
    state::SseHub,
};

pub const EVENT_PANEL_STATE: &str = "panel.state";
pub const EVENT_RESULTS_PENDING: &str = "results.pending";
pub const EVENT_RESULTS_COMMITTED: &str = "results.committed";
pub const EVENT_RESULTS_CLEARED: &str = "results.cleared";
pub const EVENT_NOTIFICATION: &str = "notification";
pub const EVENT_PUSH_STATUS: &str = "push.status";

/// Emits transient notifications onto the panel stream.
#[derive(Clone)]
pub struct Notifier {
    hub: SseHub,
    ttl: Duration,
}

impl Notifier {
    pub fn new(hub: SseHub, ttl: Duration) -> Self {
        Self { hub, ttl }
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationEvent {
        self.notify(NotificationLevel::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationEvent {
        self.notify(NotificationLevel::Success, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationEvent {
        self.notify(NotificationLevel::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationEvent {
        self.notify(NotificationLevel::Error, message)
    }

    /// Broadcast a notification and return it.
    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> NotificationEvent {
        let payload = NotificationEvent {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            ttl_ms: u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX),
        };
        send_event(&self.hub, EVENT_NOTIFICATION, &payload);
        payload
    }
}

/// Build the `panel.state` event without broadcasting it.
pub fn panel_state_event(snapshot: &PanelSnapshot) -> Option<ServerEvent> {
    build_event(EVENT_PANEL_STATE, snapshot)
}

/// Broadcast the whole panel state after a transition.
pub fn broadcast_panel_state(hub: &SseHub, snapshot: &PanelSnapshot) {
    send_event(hub, EVENT_PANEL_STATE, snapshot);
}

/// Broadcast that a pushed result is waiting to be revealed.
pub fn broadcast_results_pending(hub: &SseHub, pending: &PendingResultDto) {
    send_event(hub, EVENT_RESULTS_PENDING, pending);
}

/// Broadcast the result now shown on the banner.
pub fn broadcast_results_committed(hub: &SseHub, committed: &CommittedResultDto) {
    send_event(hub, EVENT_RESULTS_COMMITTED, committed);
}

/// Broadcast that the banner has been cleared.
pub fn broadcast_results_cleared(hub: &SseHub) {
    send_event(hub, EVENT_RESULTS_CLEARED, &ResultsClearedEvent { cleared: true });
}

/// Broadcast a push-channel connection change.
pub fn broadcast_push_status(hub: &SseHub, connected: bool) {
    send_event(hub, EVENT_PUSH_STATUS, &PushStatusEvent { connected });
}

fn build_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize panel SSE payload");
            None
        }
    }
}

fn send_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    if let Some(event) = build_event(event, payload) {
        hub.broadcast(event);
    }
}
