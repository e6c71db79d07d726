//! Ordered dispatch of board intents to the device controller.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::{
    remote::{DeviceApi, RemoteResult},
    services::{animation::AnimationScheduler, sse_events::Notifier},
    state::intents::Intent,
};

enum Job {
    Dispatch(Vec<Intent>),
    Execute(Intent, oneshot::Sender<RemoteResult<()>>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the single worker that sends intents to the device.
///
/// Batches are dispatched in submission order and the intents of a batch in
/// their own order, so the board always sees the effects of consecutive
/// transitions in the order they were applied.
#[derive(Clone)]
pub struct IntentQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl IntentQueue {
    /// Spawn the dispatch worker. It stops once every handle is dropped.
    pub fn spawn(
        device: Arc<dyn DeviceApi>,
        animations: Arc<AnimationScheduler>,
        notifier: Notifier,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let executor = Executor {
            device,
            animations,
            notifier,
        };
        tokio::spawn(run(receiver, executor));
        Self { sender }
    }

    /// Queue the intents of one applied transition. Never blocks.
    pub fn submit(&self, intents: Vec<Intent>) {
        if intents.is_empty() {
            return;
        }
        if self.sender.send(Job::Dispatch(intents)).is_err() {
            warn!("intent worker stopped; dropping board updates");
        }
    }

    /// Run one intent after everything already queued and return its outcome.
    ///
    /// Failures are left to the caller to report. `None` means the worker
    /// has stopped.
    pub async fn execute(&self, intent: Intent) -> Option<RemoteResult<()>> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(Job::Execute(intent, tx)).ok()?;
        rx.await.ok()
    }

    /// Wait until everything submitted so far has been dispatched.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(Job::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

async fn run(mut receiver: mpsc::UnboundedReceiver<Job>, executor: Executor) {
    while let Some(job) = receiver.recv().await {
        match job {
            Job::Dispatch(intents) => {
                let total = intents.len();
                let failures = executor.dispatch(intents).await;
                if failures > 0 {
                    warn!(failures, total, "board batch partially applied");
                }
            }
            Job::Execute(intent, reply) => {
                let _ = reply.send(executor.execute(intent).await);
            }
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("intent worker stopped");
}

/// Sends intents one by one. A failed intent is reported and skipped; the
/// rest of the batch still goes out and nothing is rolled back.
struct Executor {
    device: Arc<dyn DeviceApi>,
    animations: Arc<AnimationScheduler>,
    notifier: Notifier,
}

impl Executor {
    /// Dispatch `intents` in order and return how many failed.
    async fn dispatch(&self, intents: Vec<Intent>) -> usize {
        let mut failures = 0;
        for intent in intents {
            let label = intent.describe();
            match self.execute(intent).await {
                Ok(()) => debug!(intent = %label, "board updated"),
                Err(err) => {
                    failures += 1;
                    warn!(intent = %label, error = %err, "board update failed");
                    self.notifier.error(format!("Failed to {label}: {err}"));
                }
            }
        }
        failures
    }

    async fn execute(&self, intent: Intent) -> RemoteResult<()> {
        match intent {
            Intent::Lock { cup, color } => self.device.lock_cup(cup, color).await,
            Intent::Unlock(target) => self.device.unlock_cup(target).await,
            Intent::Animation {
                name,
                params,
                follow_up: None,
            } => self.animations.play(&name, params).await,
            Intent::Animation {
                name,
                params,
                follow_up: Some(follow_up),
            } => {
                self.animations
                    .play_with_follow_up(&name, params, follow_up)
                    .await
            }
        }
    }
}
