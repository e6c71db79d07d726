use std::{sync::Arc, time::Duration};

use futures::{StreamExt, future::BoxFuture};
use reqwest::{Client, Method, header::ACCEPT};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    dto::validation::validate_animation_name,
    state::{
        intents::{CupTarget, Rgb},
        results::{HorseId, RaceResult},
    },
};

use super::{
    DeviceApi, EventStream,
    config::DeviceConfig,
    error::{RemoteError, RemoteResult},
    event_stream::EventDecoder,
    models::{ApiResponse, CommandBody, LockCupBody, ResultsBody, UnlockCupBody},
};

const LOCK_PATH: &str = "/api/cup/lock";
const UNLOCK_PATH: &str = "/api/cup/unlock";
const ANIMATION_PATH: &str = "/api/animation";
const COMMAND_PATH: &str = "/api/command";
const RESULTS_PATH: &str = "/api/results";
const RESULTS_CLEAR_PATH: &str = "/api/results/clear";
const RESULTS_STREAM_PATH: &str = "/api/results/stream";

/// reqwest-backed [`DeviceApi`] talking JSON to the device controller.
#[derive(Clone)]
pub struct DeviceClient {
    client: Client,
    base_url: Arc<str>,
    request_timeout: Duration,
}

impl DeviceClient {
    /// Build a client for the controller described by `config`.
    pub fn new(config: &DeviceConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|source| RemoteError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            request_timeout: config.request_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request and unwrap the `{success, ...}` envelope.
    ///
    /// HTTP status codes are ignored: only `success` decides the outcome.
    async fn call<B>(&self, method: Method, path: &str, body: Option<&B>) -> RemoteResult<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .timeout(self.request_timeout);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                path: path.to_string(),
                source,
            })?;
        let status = response.status();
        let envelope =
            response
                .json::<ApiResponse>()
                .await
                .map_err(|source| RemoteError::Decode {
                    path: path.to_string(),
                    source,
                })?;

        debug!(path, %status, success = envelope.success, "device controller replied");
        if envelope.success {
            Ok(envelope)
        } else {
            Err(RemoteError::rejected(path, envelope.failure_message()))
        }
    }

    async fn open_results_stream(&self) -> RemoteResult<EventStream> {
        let path = RESULTS_STREAM_PATH;
        let response = self
            .client
            .get(self.url(path))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                path: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(RemoteError::StreamStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }

        let mut body = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            let mut decoder = EventDecoder::new();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => match decoder.feed(&bytes) {
                        Ok(events) => {
                            for event in events {
                                yield Ok(event);
                            }
                        }
                        Err(source) => {
                            yield Err(RemoteError::StreamOverflow {
                                path: path.to_string(),
                                source,
                            });
                            break;
                        }
                    },
                    Err(source) => {
                        yield Err(RemoteError::StreamInterrupted {
                            path: path.to_string(),
                            source,
                        });
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

impl DeviceApi for DeviceClient {
    fn lock_cup(&self, cup: HorseId, color: Rgb) -> BoxFuture<'static, RemoteResult<()>> {
        let client = self.clone();
        Box::pin(async move {
            let body = LockCupBody::new(cup, color);
            client.call(Method::POST, LOCK_PATH, Some(&body)).await?;
            Ok(())
        })
    }

    fn unlock_cup(&self, target: CupTarget) -> BoxFuture<'static, RemoteResult<()>> {
        let client = self.clone();
        Box::pin(async move {
            let body = UnlockCupBody { cup: target };
            client.call(Method::POST, UNLOCK_PATH, Some(&body)).await?;
            Ok(())
        })
    }

    fn play_animation(
        &self,
        name: String,
        params: Option<Value>,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        let client = self.clone();
        Box::pin(async move {
            let path = format!("{ANIMATION_PATH}/{name}");
            // the name becomes a path segment and is never escaped
            if let Err(err) = validate_animation_name(&name) {
                return Err(RemoteError::rejected(ANIMATION_PATH, Some(err.to_string())));
            }
            client.call(Method::POST, &path, params.as_ref()).await?;
            Ok(())
        })
    }

    fn send_command(&self, command: String) -> BoxFuture<'static, RemoteResult<Option<String>>> {
        let client = self.clone();
        Box::pin(async move {
            let body = CommandBody { command: &command };
            let envelope = client.call(Method::POST, COMMAND_PATH, Some(&body)).await?;
            Ok(envelope.response)
        })
    }

    fn fetch_results(&self) -> BoxFuture<'static, RemoteResult<Option<RaceResult>>> {
        let client = self.clone();
        Box::pin(async move {
            let envelope = client
                .call::<()>(Method::GET, RESULTS_PATH, None)
                .await?;
            match envelope.results {
                Some(body) => RaceResult::try_from(body)
                    .map(Some)
                    .map_err(|err| RemoteError::rejected(RESULTS_PATH, Some(err.to_string()))),
                None => Ok(None),
            }
        })
    }

    fn commit_results(&self, result: RaceResult) -> BoxFuture<'static, RemoteResult<()>> {
        let client = self.clone();
        Box::pin(async move {
            let body = ResultsBody::from(result);
            client.call(Method::POST, RESULTS_PATH, Some(&body)).await?;
            Ok(())
        })
    }

    fn clear_results(&self) -> BoxFuture<'static, RemoteResult<()>> {
        let client = self.clone();
        Box::pin(async move {
            client
                .call::<()>(Method::POST, RESULTS_CLEAR_PATH, None)
                .await?;
            Ok(())
        })
    }

    fn subscribe_results(&self) -> BoxFuture<'static, RemoteResult<EventStream>> {
        let client = self.clone();
        Box::pin(async move { client.open_results_stream().await })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::{Arc, Mutex},
    };

    use axum::{
        Json, Router,
        extract::{Path, State},
        response::sse::{Event, Sse},
        routing::{get, post},
    };
    use futures::{Stream, stream};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<(String, Value)>>>);

    impl Recorded {
        fn push(&self, call: impl Into<String>, body: Value) {
            self.0.lock().unwrap().push((call.into(), body));
        }

        fn take(&self) -> Vec<(String, Value)> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    async fn lock(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
        rec.push("lock", body);
        Json(json!({ "success": true }))
    }

    async fn unlock(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
        rec.push("unlock", body);
        Json(json!({ "success": true }))
    }

    async fn animation(
        State(rec): State<Recorded>,
        Path(name): Path<String>,
        body: String,
    ) -> Json<Value> {
        let params = serde_json::from_str(&body).unwrap_or(Value::Null);
        rec.push(format!("animation:{name}"), params);
        Json(json!({ "success": name != "broken", "response": "ERROR: unknown animation" }))
    }

    async fn command(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
        rec.push("command", body);
        Json(json!({ "success": true, "response": "OK" }))
    }

    async fn get_results() -> Json<Value> {
        Json(json!({ "success": true, "results": { "win": 7, "place": 3, "show": 12 } }))
    }

    async fn post_results(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
        rec.push("results", body.clone());
        if body["win"] == body["place"] {
            return Json(json!({
                "success": false,
                "error": "Win, Place, and Show must be different cups"
            }));
        }
        Json(json!({ "success": true }))
    }

    async fn clear_results(State(rec): State<Recorded>) -> Json<Value> {
        rec.push("clear", Value::Null);
        Json(json!({ "success": true }))
    }

    async fn results_stream() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        Sse::new(stream::iter(vec![
            Ok(Event::default()
                .event("results")
                .data(r#"{"win":2,"place":5,"show":9}"#)),
            Ok(Event::default().comment("keep-alive")),
            Ok(Event::default()
                .event("results")
                .data(r#"{"win":8,"place":1,"show":4}"#)),
        ]))
    }

    async fn spawn_controller() -> (DeviceClient, Recorded) {
        let recorded = Recorded::default();
        let router = Router::new()
            .route("/api/cup/lock", post(lock))
            .route("/api/cup/unlock", post(unlock))
            .route("/api/animation/{name}", post(animation))
            .route("/api/command", post(command))
            .route("/api/results", get(get_results).post(post_results))
            .route("/api/results/clear", post(clear_results))
            .route("/api/results/stream", get(results_stream))
            .with_state(recorded.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = DeviceClient::new(&DeviceConfig::new(format!("http://{addr}/"))).unwrap();
        (client, recorded)
    }

    #[tokio::test]
    async fn lock_and_unlock_send_documented_bodies() {
        let (client, recorded) = spawn_controller().await;

        client.lock_cup(7, Rgb::GOLD).await.unwrap();
        client.unlock_cup(CupTarget::Cup(7)).await.unwrap();
        client.unlock_cup(CupTarget::All).await.unwrap();

        assert_eq!(
            recorded.take(),
            vec![
                (
                    "lock".to_string(),
                    json!({ "cup": 7, "r": 255, "g": 215, "b": 0 })
                ),
                ("unlock".to_string(), json!({ "cup": 7 })),
                ("unlock".to_string(), json!({ "cup": "ALL" })),
            ]
        );
    }

    #[tokio::test]
    async fn animation_posts_optional_params_and_reports_rejection() {
        let (client, recorded) = spawn_controller().await;

        client
            .play_animation("heartbeat".into(), None)
            .await
            .unwrap();
        client
            .play_animation("finish".into(), Some(json!({ "speed": 2 })))
            .await
            .unwrap();
        let err = client
            .play_animation("broken".into(), None)
            .await
            .unwrap_err();

        match err {
            RemoteError::Rejected { path, message } => {
                assert_eq!(path, "/api/animation/broken");
                assert_eq!(message, "ERROR: unknown animation");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            recorded.take(),
            vec![
                ("animation:heartbeat".to_string(), Value::Null),
                ("animation:finish".to_string(), json!({ "speed": 2 })),
                ("animation:broken".to_string(), Value::Null),
            ]
        );
    }

    #[tokio::test]
    async fn animation_names_that_are_not_path_segments_are_never_sent() {
        let (client, recorded) = spawn_controller().await;

        for name in ["../results/clear", "a b", ""] {
            let err = client.play_animation(name.into(), None).await.unwrap_err();
            assert!(matches!(err, RemoteError::Rejected { .. }), "{name}: {err:?}");
        }
        assert!(recorded.take().is_empty());
    }

    #[tokio::test]
    async fn command_returns_controller_reply() {
        let (client, recorded) = spawn_controller().await;
        let reply = client.send_command("RESET".into()).await.unwrap();

        assert_eq!(reply.as_deref(), Some("OK"));
        assert_eq!(recorded.take()[0].1, json!({ "command": "RESET" }));
    }

    #[tokio::test]
    async fn results_round_trip_through_controller() {
        let (client, recorded) = spawn_controller().await;

        assert_eq!(
            client.fetch_results().await.unwrap(),
            Some(RaceResult {
                win: 7,
                place: 3,
                show: 12
            })
        );

        client
            .commit_results(RaceResult {
                win: 7,
                place: 3,
                show: 12,
            })
            .await
            .unwrap();
        let err = client
            .commit_results(RaceResult {
                win: 4,
                place: 4,
                show: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected { ref message, .. } if message.contains("different cups")));

        client.clear_results().await.unwrap();
        let calls: Vec<String> = recorded.take().into_iter().map(|(call, _)| call).collect();
        assert_eq!(calls, vec!["results", "results", "clear"]);
    }

    #[tokio::test]
    async fn push_channel_yields_named_events_until_the_server_closes() {
        let (client, _recorded) = spawn_controller().await;

        let events: Vec<_> = client
            .subscribe_results()
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.event == "results"));
        assert_eq!(events[1].data, r#"{"win":8,"place":1,"show":4}"#);
    }

    #[tokio::test]
    async fn unreachable_controller_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = DeviceClient::new(&DeviceConfig::new(format!("http://{addr}"))).unwrap();
        assert!(matches!(
            client.lock_cup(1, Rgb::GOLD).await,
            Err(RemoteError::Transport { .. })
        ));
        assert!(matches!(
            client.subscribe_results().await,
            Err(RemoteError::Transport { .. })
        ));
    }
}
