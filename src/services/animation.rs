//! Board animations with a single cancellable follow-up.

use std::sync::Arc;

use serde_json::Value;
use tokio::{sync::Mutex, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    remote::{DeviceApi, RemoteResult},
    services::sse_events::Notifier,
    state::intents::FollowUp,
};

/// Handle to a delayed animation. Cancelling it guarantees it never fires.
pub struct ScheduledTask {
    animation: String,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Abort the task if it has not run yet.
    pub fn cancel(self) {
        if !self.handle.is_finished() {
            debug!(animation = %self.animation, "cancelling pending follow-up animation");
        }
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Plays animations on the board. At most one follow-up is pending at a
/// time and every new animation cancels it first.
pub struct AnimationScheduler {
    device: Arc<dyn DeviceApi>,
    notifier: Notifier,
    follow_up: Mutex<Option<ScheduledTask>>,
}

impl AnimationScheduler {
    pub fn new(device: Arc<dyn DeviceApi>, notifier: Notifier) -> Self {
        Self {
            device,
            notifier,
            follow_up: Mutex::new(None),
        }
    }

    /// Cancel the pending follow-up and start `name`.
    pub async fn play(&self, name: &str, params: Option<Value>) -> RemoteResult<()> {
        let mut slot = self.follow_up.lock().await;
        cancel(slot.take());
        self.device.play_animation(name.to_string(), params).await?;
        info!(animation = name, "animation started");
        Ok(())
    }

    /// Cancel the pending follow-up, start `name` and schedule `follow_up`.
    ///
    /// The follow-up is only scheduled when `name` was accepted.
    pub async fn play_with_follow_up(
        &self,
        name: &str,
        params: Option<Value>,
        follow_up: FollowUp,
    ) -> RemoteResult<()> {
        let mut slot = self.follow_up.lock().await;
        cancel(slot.take());
        self.device.play_animation(name.to_string(), params).await?;
        info!(
            animation = name,
            follow_up = %follow_up.animation,
            delay_ms = follow_up.delay.as_millis() as u64,
            "animation started with follow-up"
        );

        let device = Arc::clone(&self.device);
        let notifier = self.notifier.clone();
        let animation = follow_up.animation.clone();
        let handle = tokio::spawn(async move {
            sleep(follow_up.delay).await;
            match device.play_animation(follow_up.animation.clone(), None).await {
                Ok(()) => info!(animation = %follow_up.animation, "follow-up animation started"),
                Err(err) => {
                    warn!(animation = %follow_up.animation, error = %err, "follow-up animation failed");
                    notifier.error(format!(
                        "Failed to start animation `{}`: {err}",
                        follow_up.animation
                    ));
                }
            }
        });
        *slot = Some(ScheduledTask { animation, handle });
        Ok(())
    }

    /// Cancel the pending follow-up without starting anything.
    pub async fn cancel_pending(&self) {
        cancel(self.follow_up.lock().await.take());
    }

    /// Whether a follow-up is scheduled and has not fired yet.
    pub async fn has_pending(&self) -> bool {
        self.follow_up
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

fn cancel(task: Option<ScheduledTask>) {
    if let Some(task) = task {
        task.cancel();
    }
}
