//! Keeps the results push channel open and stages what it announces.

use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    remote::{SseEvent, models::ResultsBody},
    services::{panel_service, sse_events},
    state::{SharedState, results::RaceResult},
};

/// Name of the push-channel event announcing finalized results.
pub const RESULTS_EVENT: &str = "results";

/// Subscribe to the results push channel for the lifetime of the process.
///
/// Whenever the subscription fails or the stream ends, wait the configured
/// delay and subscribe again. The delay never grows.
pub async fn run(state: SharedState) {
    let delay = state.config().reconnect_delay;

    loop {
        match state.device().subscribe_results().await {
            Ok(mut stream) => {
                info!("results push channel connected");
                update_connected(&state, true);

                while let Some(item) = stream.next().await {
                    match item {
                        Ok(event) => handle_event(&state, event).await,
                        Err(err) => {
                            warn!(error = %err, "results push channel failed");
                            break;
                        }
                    }
                }
                drop(stream);

                warn!(delay_ms = delay.as_millis() as u64, "results push channel closed; reconnecting");
                if update_connected(&state, false) {
                    state
                        .notifier()
                        .warning("Results feed disconnected; reconnecting");
                }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "failed to open results push channel; retrying"
                );
                update_connected(&state, false);
            }
        }

        sleep(delay).await;
    }
}

/// Seed the banner with the result already saved on the backend.
pub async fn load_initial(state: SharedState) {
    match state.device().fetch_results().await {
        Ok(Some(result)) => panel_service::load_committed(&state, result).await,
        Ok(None) => info!("no stored results on the backend"),
        Err(err) => {
            warn!(error = %err, "failed to load stored results");
            state
                .notifier()
                .warning(format!("Could not load current results: {err}"));
        }
    }
}

async fn handle_event(state: &SharedState, event: SseEvent) {
    if event.event != RESULTS_EVENT {
        debug!(event = %event.event, "ignoring push-channel event");
        return;
    }

    match decode_results(&event.data) {
        Some(result) => panel_service::stage_pushed_result(state, result).await,
        None => warn!(data = %event.data, "dropping malformed results payload"),
    }
}

fn decode_results(data: &str) -> Option<RaceResult> {
    let body = match serde_json::from_str::<ResultsBody>(data) {
        Ok(body) => body,
        Err(err) => {
            debug!(error = %err, "results payload is not valid JSON");
            return None;
        }
    };
    match RaceResult::try_from(body) {
        Ok(result) => Some(result),
        Err(err) => {
            debug!(error = %err, "results payload out of range");
            None
        }
    }
}

/// Record the connection status and tell the view when it changes.
fn update_connected(state: &SharedState, connected: bool) -> bool {
    let changed = state.set_push_connected(connected);
    if changed {
        sse_events::broadcast_push_status(state.events(), connected);
    }
    changed
}
