pub mod intents;
pub mod results;
pub mod reveal;
pub mod selection;
mod sse;

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::{
    config::AppConfig,
    remote::DeviceApi,
    services::{animation::AnimationScheduler, sse_events::Notifier, sync::IntentQueue},
};

pub use self::sse::SseHub;
use self::{reveal::RevealState, selection::SelectionMachine};

pub type SharedState = Arc<AppState>;

/// Capacity of the panel SSE broadcast channel.
const PANEL_EVENTS_CAPACITY: usize = 32;

/// Everything the operator manipulates: the selection workflow and the
/// pushed-result reveal state with the committed banner.
pub struct PanelSession {
    pub selection: SelectionMachine,
    pub reveal: RevealState,
}

/// Central application state shared by every route and background task.
pub struct AppState {
    config: AppConfig,
    device: Arc<dyn DeviceApi>,
    operator: Mutex<()>,
    session: Mutex<PanelSession>,
    events: SseHub,
    notifier: Notifier,
    animations: Arc<AnimationScheduler>,
    intents: IntentQueue,
    push_connected: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Spawns the intent dispatch worker, so it must be called from within a
    /// Tokio runtime. The push channel starts disconnected.
    pub fn new(config: AppConfig, device: Arc<dyn DeviceApi>) -> SharedState {
        let events = SseHub::new(PANEL_EVENTS_CAPACITY);
        let notifier = Notifier::new(events.clone(), config.notification_ttl);
        let animations = Arc::new(AnimationScheduler::new(device.clone(), notifier.clone()));
        let intents = IntentQueue::spawn(device.clone(), animations.clone(), notifier.clone());
        let (push_connected, _rx) = watch::channel(false);

        Arc::new(Self {
            operator: Mutex::new(()),
            session: Mutex::new(PanelSession {
                selection: SelectionMachine::new(config.rules),
                reveal: RevealState::new(),
            }),
            config,
            device,
            events,
            notifier,
            animations,
            intents,
            push_connected,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Client of the device controller.
    pub fn device(&self) -> &Arc<dyn DeviceApi> {
        &self.device
    }

    /// Gate serializing operator actions.
    ///
    /// Held for the whole action, network calls included. Reads and pushed
    /// results never take it, so they only wait on [`session`](Self::session).
    pub fn operator(&self) -> &Mutex<()> {
        &self.operator
    }

    /// Operator session. Locked only while state is read or updated, never
    /// across a network call.
    pub fn session(&self) -> &Mutex<PanelSession> {
        &self.session
    }

    /// Broadcast hub feeding the panel SSE stream.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn animations(&self) -> &AnimationScheduler {
        &self.animations
    }

    /// Ordered queue dispatching board intents to the device.
    pub fn intents(&self) -> &IntentQueue {
        &self.intents
    }

    /// Whether the results push channel is currently connected.
    pub fn is_push_connected(&self) -> bool {
        *self.push_connected.borrow()
    }

    /// Subscribe to push-channel connection changes.
    pub fn push_watcher(&self) -> watch::Receiver<bool> {
        self.push_connected.subscribe()
    }

    /// Record the push-channel status, returning `true` when it changed.
    pub fn set_push_connected(&self, connected: bool) -> bool {
        self.push_connected.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        })
    }
}
