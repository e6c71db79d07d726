//! Client side of the device-controller HTTP API driving the LED board.

pub mod client;
pub mod config;
pub mod error;
pub mod event_stream;
#[cfg(test)]
pub(crate) mod fake;
pub mod models;

use futures::{future::BoxFuture, stream::BoxStream};
use serde_json::Value;

use crate::state::{
    intents::{CupTarget, Rgb},
    results::{HorseId, RaceResult},
};

pub use self::client::DeviceClient;
pub use self::config::DeviceConfig;
pub use self::error::{RemoteError, RemoteResult};
pub use self::event_stream::SseEvent;

/// Events received on the results push channel. The stream ends when the
/// connection drops.
pub type EventStream = BoxStream<'static, RemoteResult<SseEvent>>;

/// Abstraction over the device controller consumed by the panel.
///
/// Every call is a single request/response; none of them retries.
pub trait DeviceApi: Send + Sync {
    /// Bind `cup` to `color`.
    fn lock_cup(&self, cup: HorseId, color: Rgb) -> BoxFuture<'static, RemoteResult<()>>;
    /// Release one cup or all of them.
    fn unlock_cup(&self, target: CupTarget) -> BoxFuture<'static, RemoteResult<()>>;
    /// Start a named display sequence.
    fn play_animation(
        &self,
        name: String,
        params: Option<Value>,
    ) -> BoxFuture<'static, RemoteResult<()>>;
    /// Send a raw command string, returning the controller's reply text.
    fn send_command(&self, command: String) -> BoxFuture<'static, RemoteResult<Option<String>>>;
    /// Fetch the result currently committed on the backend.
    fn fetch_results(&self) -> BoxFuture<'static, RemoteResult<Option<RaceResult>>>;
    /// Commit a new result on the backend.
    fn commit_results(&self, result: RaceResult) -> BoxFuture<'static, RemoteResult<()>>;
    /// Clear the committed result on the backend.
    fn clear_results(&self) -> BoxFuture<'static, RemoteResult<()>>;
    /// Open the results push channel.
    fn subscribe_results(&self) -> BoxFuture<'static, RemoteResult<EventStream>>;
}
