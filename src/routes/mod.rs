use axum::Router;

use crate::state::SharedState;

pub mod device;
pub mod docs;
pub mod health;
pub mod panel;
pub mod results;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(panel::router())
        .merge(results::router())
        .merge(device::router())
        .merge(sse::router())
        .merge(docs::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, sync::Arc};

    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;
    use crate::{
        config::AppConfig,
        remote::fake::{DeviceCall, RecordingDevice},
        services::{panel_service, sse_events::EVENT_NOTIFICATION},
        state::{AppState, intents::Rgb},
    };

    async fn serve() -> (Arc<RecordingDevice>, SharedState, String) {
        let device = Arc::new(RecordingDevice::new());
        let state = AppState::new(AppConfig::default(), device.clone());
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (device, state, format!("http://{addr}"))
    }

    async fn post(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
        let response = client.post(url).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn operator_flow_over_http() {
        let (device, state, base) = serve().await;
        let client = reqwest::Client::new();

        let (status, _) = post(&client, format!("{base}/panel/start")).await;
        assert_eq!(status, StatusCode::OK);
        for horse in [7, 3] {
            let (status, _) = post(&client, format!("{base}/panel/select/{horse}")).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = post(&client, format!("{base}/panel/select/12")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selection"]["step"], "ready_to_confirm");
        assert_eq!(body["selection"]["ready_to_confirm"], true);

        let (status, body) = post(&client, format!("{base}/panel/finalize")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selection"]["step"], "win");
        assert_eq!(body["committed"]["win"], 7);
        assert_eq!(body["committed"]["origin"], "local");

        let results: Value = client
            .get(format!("{base}/results"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            (
                &results["results"]["win"],
                &results["results"]["place"],
                &results["results"]["show"]
            ),
            (&json!(7), &json!(3), &json!(12))
        );

        state.intents().flush().await;
        assert!(device.calls().contains(&DeviceCall::Lock {
            cup: 12,
            color: Rgb::BRONZE
        }));
    }

    #[tokio::test]
    async fn refused_actions_return_json_errors() {
        let (_device, _state, base) = serve().await;
        let client = reqwest::Client::new();

        let (status, body) = post(&client, format!("{base}/panel/back")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("first step"));

        let (status, _) = post(&client, format!("{base}/panel/select/99")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(&client, format!("{base}/panel/reveal")).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unparsable_horse_numbers_get_json_errors_and_notifications() {
        let (device, state, base) = serve().await;
        let client = reqwest::Client::new();
        let mut rx = state.events().subscribe();

        for horse in ["70000", "-3", "seven"] {
            let (status, body) = post(&client, format!("{base}/panel/select/{horse}")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let message = body["message"].as_str().unwrap();
            assert!(message.contains(horse), "{message}");
            assert!(message.contains("1-20"), "{message}");
        }

        let mut notifications = 0;
        while let Ok(event) = rx.try_recv() {
            if event.event.as_deref() == Some(EVENT_NOTIFICATION) {
                let body: Value = serde_json::from_str(&event.data).unwrap();
                assert_eq!(body["level"], "warning");
                notifications += 1;
            }
        }
        assert_eq!(notifications, 3);

        state.intents().flush().await;
        assert!(device.calls().is_empty());
        assert_eq!(panel_service::snapshot(&state).await.selection.win, None);
    }

    #[tokio::test]
    async fn command_and_animation_routes_validate_input() {
        let (device, _state, base) = serve().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/command"))
            .json(&json!({ "command": "" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = client
            .post(format!("{base}/command"))
            .json(&json!({ "command": "status" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["response"], "OK");

        let response = client
            .post(format!("{base}/animation/chase"))
            .json(&json!({ "speed": 2 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = client
            .post(format!("{base}/animation/bad%20name"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::Command("status".into()),
                DeviceCall::Animation {
                    name: "chase".into(),
                    params: Some(json!({ "speed": 2 }))
                },
            ]
        );
    }

    #[tokio::test]
    async fn healthcheck_reports_push_channel() {
        let (_device, state, base) = serve().await;

        let body: Value = reqwest::get(format!("{base}/healthcheck"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "degraded");

        state.set_push_connected(true);
        let body: Value = reqwest::get(format!("{base}/healthcheck"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["push_connected"], true);
    }
}
