//! Integration tests for the funnel REST + countdown WebSocket API.
//!
//! Each test spins up an Axum server on a random port and drives it with
//! reqwest and tokio-tungstenite, exercising the real HTTP contract.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use flourcraft_funnel::analytics::{MemoryAnalytics, events};
use flourcraft_funnel::checkout::MemoryCheckout;
use flourcraft_funnel::funnel::FunnelDeps;
use flourcraft_funnel::funnel::routes::funnel_routes;
use flourcraft_funnel::funnel::sessions::SessionStore;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    base: String,
    client: reqwest::Client,
    analytics: Arc<MemoryAnalytics>,
    checkout: Arc<MemoryCheckout>,
}

/// Start an Axum server on a random port.
async fn start_server() -> Harness {
    let analytics = MemoryAnalytics::new();
    let checkout = MemoryCheckout::new();
    let deps = FunnelDeps::new(analytics.clone(), checkout.clone());
    let store = SessionStore::new(deps, Duration::from_secs(3600));
    let app = funnel_routes(store, None);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    Harness {
        base: format!("127.0.0.1:{port}"),
        client: reqwest::Client::new(),
        analytics,
        checkout,
    }
}

impl Harness {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.base)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn create_session(&self) -> String {
        let (status, body) = self.post("/api/funnel/sessions", json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    /// Answer every step: "30s" where offered, else the first option.
    async fn complete_questionnaire(&self, id: &str, email: &str, name: &str) -> usize {
        let mut offers_entered = 0;
        loop {
            let (_, view) = self.get(&format!("/api/funnel/sessions/{id}")).await;
            if view["stage"] != "step" {
                break;
            }

            if let Some(input) = view["text_input"]["input"].as_str() {
                let value = if input == "email" { email } else { name };
                let (status, _) = self
                    .post(
                        &format!("/api/funnel/sessions/{id}/text"),
                        json!({"value": value}),
                    )
                    .await;
                assert_eq!(status, StatusCode::OK);
            } else if let Some(options) = view["options"].as_array().filter(|o| !o.is_empty()) {
                let labels: Vec<&str> = options
                    .iter()
                    .filter_map(|o| o["label"].as_str())
                    .collect();
                let choice = if labels.contains(&"30s") { "30s" } else { labels[0] };
                let (status, _) = self
                    .post(
                        &format!("/api/funnel/sessions/{id}/select"),
                        json!({"option": choice}),
                    )
                    .await;
                assert_eq!(status, StatusCode::OK);
            }

            let (status, body) = self
                .post(&format!("/api/funnel/sessions/{id}/continue"), json!({}))
                .await;
            assert_eq!(status, StatusCode::OK, "continue failed: {body}");
            if body["result"]["transition"] == "entered_offer" {
                offers_entered += 1;
            }
        }
        offers_entered
    }
}

// ── REST Endpoint Tests ──────────────────────────────────────────────

#[tokio::test]
async fn rest_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (status, body) = server.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "flourcraft-funnel");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_step_catalog() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (status, body) = server.get("/api/funnel/steps").await;
        assert_eq!(status, StatusCode::OK);
        let steps = body.as_array().unwrap();
        assert_eq!(steps.len(), 31);
        assert_eq!(steps[0]["type"], "single");
        assert_eq!(steps[25]["type"], "text");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_create_session_starts_on_selector() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (status, body) = server.post("/api/funnel/sessions", json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["view"]["stage"], "selector");
        assert_eq!(body["view"]["can_continue"], false);
        assert_eq!(server.analytics.count(events::QUIZ_STARTED), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_unknown_session_is_not_found() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (status, body) = server
            .get("/api/funnel/sessions/00000000-0000-4000-8000-000000000000")
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_option_not_offered_is_bad_request() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = server.create_session().await;

        server
            .post(
                &format!("/api/funnel/sessions/{id}/gender"),
                json!({"gender": "female"}),
            )
            .await;
        server
            .post(&format!("/api/funnel/sessions/{id}/continue"), json!({}))
            .await;

        let (status, _) = server
            .post(
                &format!("/api/funnel/sessions/{id}/select"),
                json!({"option": "15s"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = server
            .post(&format!("/api/funnel/sessions/{id}/continue"), json!({}))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_full_funnel_to_purchase() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = server.create_session().await;

        let (status, view) = server
            .post(
                &format!("/api/funnel/sessions/{id}/gender"),
                json!({"gender": "Female"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["can_continue"], true);

        let (status, body) = server
            .post(&format!("/api/funnel/sessions/{id}/continue"), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["transition"], "entered_questionnaire");

        let entered = server.complete_questionnaire(&id, "a@b.com", "Ann").await;
        assert_eq!(entered, 1);

        let (_, view) = server.get(&format!("/api/funnel/sessions/{id}")).await;
        assert_eq!(view["stage"], "offer");
        assert_eq!(view["discount_percent"], 96);

        let (status, record) = server
            .get(&format!("/api/funnel/sessions/{id}/answers"))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["gender"], "Female");
        assert_eq!(record["age"], "30s");
        assert_eq!(record["email"], "a@b.com");
        assert_eq!(record["name"], "Ann");

        for _ in 0..2 {
            let (status, body) = server
                .post(&format!("/api/funnel/sessions/{id}/purchase"), json!({}))
                .await;
            assert_eq!(status, StatusCode::OK);
            assert!(
                body["checkout_url"]
                    .as_str()
                    .unwrap()
                    .starts_with("https://pay.hotmart.com/")
            );
        }
        assert_eq!(server.checkout.opened().len(), 2);
        assert_eq!(server.analytics.count(events::PURCHASE_CLICKED), 2);
        assert_eq!(server.analytics.count(events::OFFER_VIEWED), 1);
        assert_eq!(server.analytics.count(events::QUIZ_COMPLETED), 1);

        let (status, _) = server
            .post(&format!("/api/funnel/sessions/{id}/continue"), json!({}))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_delete_session() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = server.create_session().await;

        let resp = server
            .client
            .delete(server.url(&format!("/api/funnel/sessions/{id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let (status, _) = server.get(&format!("/api/funnel/sessions/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    })
    .await
    .expect("test timed out");
}

// ── Countdown WebSocket Tests ────────────────────────────────────────

/// Parse a WS text frame into a serde_json::Value.
fn parse_ws_json(msg: &Message) -> Value {
    match msg {
        Message::Text(txt) => serde_json::from_str(txt).expect("invalid JSON from server"),
        other => panic!("expected Text frame, got {:?}", other),
    }
}

#[tokio::test]
async fn ws_countdown_rejected_before_offer() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = server.create_session().await;

        let result = connect_async(format!(
            "ws://{}/api/funnel/sessions/{id}/countdown/ws",
            server.base
        ))
        .await;
        assert!(result.is_err());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_countdown_ticks_and_closes_with_session() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = server.create_session().await;
        server
            .post(
                &format!("/api/funnel/sessions/{id}/gender"),
                json!({"gender": "Male"}),
            )
            .await;
        server
            .post(&format!("/api/funnel/sessions/{id}/continue"), json!({}))
            .await;
        server.complete_questionnaire(&id, "m@b.com", "Max").await;

        let (mut ws, _) = connect_async(format!(
            "ws://{}/api/funnel/sessions/{id}/countdown/ws",
            server.base
        ))
        .await
        .expect("WS connect failed");

        let first = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert!(first["countdown"].as_str().unwrap().starts_with("23:4"));
        assert_eq!(first["hours"], 23);

        let second = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_ne!(first["countdown"], second["countdown"]);

        // Dropping the session unmounts the offer and stops the timer.
        server
            .client
            .delete(server.url(&format!("/api/funnel/sessions/{id}")))
            .send()
            .await
            .unwrap();

        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("test timed out");
}
