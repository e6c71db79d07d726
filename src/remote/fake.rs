//! In-memory [`DeviceApi`] recording every call, for service-level tests.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures::{future::BoxFuture, stream};
use serde_json::Value;
use tokio::time::{Instant, sleep};

use crate::state::{
    intents::{CupTarget, Rgb},
    results::{HorseId, RaceResult},
};

use super::{DeviceApi, EventStream, RemoteError, RemoteResult, SseEvent};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DeviceCall {
    Lock { cup: HorseId, color: Rgb },
    Unlock(CupTarget),
    Animation { name: String, params: Option<Value> },
    Command(String),
    FetchResults,
    CommitResults(RaceResult),
    ClearResults,
    Subscribe,
}

/// Scripted outcome of one `subscribe_results` call.
pub(crate) enum Subscription {
    Refused,
    /// Deliver these events, then close the stream.
    Events(Vec<SseEvent>),
    /// Deliver these events, then fail the stream.
    EventsThenError(Vec<SseEvent>),
}

#[derive(Default)]
pub(crate) struct RecordingDevice {
    calls: Mutex<Vec<(Instant, DeviceCall)>>,
    fail_cups: AtomicBool,
    fail_commit: AtomicBool,
    commit_delay: Mutex<Option<Duration>>,
    committed: Mutex<Option<RaceResult>>,
    subscriptions: Mutex<VecDeque<Subscription>>,
}

impl RecordingDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_committed(result: RaceResult) -> Self {
        let device = Self::default();
        *device.committed.lock().unwrap() = Some(result);
        device
    }

    pub(crate) fn fail_cups(&self, fail: bool) {
        self.fail_cups.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Make every `commit_results` call take `delay` before answering.
    pub(crate) fn delay_commit(&self, delay: Duration) {
        *self.commit_delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn script_subscription(&self, subscription: Subscription) {
        self.subscriptions.lock().unwrap().push_back(subscription);
    }

    pub(crate) fn calls(&self) -> Vec<DeviceCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub(crate) fn timed_calls(&self) -> Vec<(Instant, DeviceCall)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: DeviceCall) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }

    fn cup_outcome(&self, path: &str) -> RemoteResult<()> {
        if self.fail_cups.load(Ordering::SeqCst) {
            Err(RemoteError::rejected(path, Some("ERROR: cup offline".into())))
        } else {
            Ok(())
        }
    }
}

impl DeviceApi for RecordingDevice {
    fn lock_cup(&self, cup: HorseId, color: Rgb) -> BoxFuture<'static, RemoteResult<()>> {
        self.record(DeviceCall::Lock { cup, color });
        let outcome = self.cup_outcome("/api/cup/lock");
        Box::pin(async move { outcome })
    }

    fn unlock_cup(&self, target: CupTarget) -> BoxFuture<'static, RemoteResult<()>> {
        self.record(DeviceCall::Unlock(target));
        let outcome = self.cup_outcome("/api/cup/unlock");
        Box::pin(async move { outcome })
    }

    fn play_animation(
        &self,
        name: String,
        params: Option<Value>,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        self.record(DeviceCall::Animation { name, params });
        Box::pin(async { Ok(()) })
    }

    fn send_command(&self, command: String) -> BoxFuture<'static, RemoteResult<Option<String>>> {
        self.record(DeviceCall::Command(command));
        Box::pin(async { Ok(Some("OK".to_string())) })
    }

    fn fetch_results(&self) -> BoxFuture<'static, RemoteResult<Option<RaceResult>>> {
        self.record(DeviceCall::FetchResults);
        let committed = *self.committed.lock().unwrap();
        Box::pin(async move { Ok(committed) })
    }

    fn commit_results(&self, result: RaceResult) -> BoxFuture<'static, RemoteResult<()>> {
        self.record(DeviceCall::CommitResults(result));
        let outcome = if self.fail_commit.load(Ordering::SeqCst) {
            Err(RemoteError::rejected("/api/results", Some("backend offline".into())))
        } else {
            *self.committed.lock().unwrap() = Some(result);
            Ok(())
        };
        let delay = *self.commit_delay.lock().unwrap();
        Box::pin(async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            outcome
        })
    }

    fn clear_results(&self) -> BoxFuture<'static, RemoteResult<()>> {
        self.record(DeviceCall::ClearResults);
        self.committed.lock().unwrap().take();
        Box::pin(async { Ok(()) })
    }

    fn subscribe_results(&self) -> BoxFuture<'static, RemoteResult<EventStream>> {
        self.record(DeviceCall::Subscribe);
        let next = self.subscriptions.lock().unwrap().pop_front();
        Box::pin(async move {
            match next {
                Some(Subscription::Refused) => Err(RemoteError::rejected(
                    "/api/results/stream",
                    Some("connection refused".into()),
                )),
                Some(Subscription::Events(events)) => {
                    Ok(Box::pin(stream::iter(events.into_iter().map(Ok))) as EventStream)
                }
                Some(Subscription::EventsThenError(events)) => {
                    let failure = RemoteError::rejected(
                        "/api/results/stream",
                        Some("connection reset".into()),
                    );
                    let items = events
                        .into_iter()
                        .map(Ok)
                        .chain(std::iter::once(Err(failure)));
                    Ok(Box::pin(stream::iter(items)) as EventStream)
                }
                // nothing scripted: behave like a healthy but silent channel
                None => Ok(Box::pin(stream::pending()) as EventStream),
            }
        })
    }
}
