use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use player_timer::{
    create_router,
    state::{AppState, ManualClock, MemoryStore},
};

fn app_at(millis: i64) -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_millis(millis));
    let state = AppState::with_backends(
        8080,
        "127.0.0.1".to_string(),
        "Player".to_string(),
        Arc::new(MemoryStore::new()),
        clock.clone(),
    );
    (create_router(Arc::new(state)), clock)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    dispatch(app, request).await
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: &'static str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    dispatch(app, request).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn create_with_and_without_name() {
    let (app, _) = app_at(0);

    let (status, body) = send(&app, "POST", "/api/players", Some(json!({ "name": "Alice" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({ "id": 1, "name": "Alice", "elapsedTime": 0, "isRunning": false, "currentTime": 0 })
    );

    let (status, body) = send(&app, "POST", "/api/players", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Player");
    assert_eq!(body["id"], 2);
}

#[tokio::test]
async fn create_rejects_malformed_body() {
    let (app, _) = app_at(0);

    let (status, body) = send_raw(&app, "POST", "/api/players", "{ not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = send_raw(&app, "POST", "/api/players", r#"{ "name": 5 }"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, "GET", "/api/players", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn start_elapsed_stop_over_http() {
    let (app, clock) = app_at(1_000);
    send(&app, "POST", "/api/players", Some(json!({ "name": "Alice" }))).await;

    let (status, body) = send(&app, "POST", "/api/players/1/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isRunning"], true);
    assert_eq!(body["startTime"], 1_000);

    clock.set_millis(1_500);
    let (_, body) = send(&app, "GET", "/api/players/1/elapsed", None).await;
    assert_eq!(body, json!({ "id": 1, "currentTime": 500 }));

    clock.set_millis(2_000);
    let (status, body) = send(&app, "POST", "/api/players/1/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": 1,
            "name": "Alice",
            "elapsedTime": 1_000,
            "isRunning": false,
            "currentTime": 1_000,
        })
    );

    clock.set_millis(90_000);
    let (_, body) = send(&app, "GET", "/api/players/1", None).await;
    assert_eq!(body["currentTime"], 1_000);
}

#[tokio::test]
async fn list_derives_running_time() {
    let (app, clock) = app_at(0);
    send(&app, "POST", "/api/players", None).await;
    send(&app, "POST", "/api/players", None).await;
    send(&app, "POST", "/api/players/2/start", None).await;

    clock.advance_ms(250);
    let (status, body) = send(&app, "GET", "/api/players", None).await;
    assert_eq!(status, StatusCode::OK);
    let times: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["currentTime"].as_u64().unwrap())
        .collect();
    assert_eq!(times, vec![0, 250]);
}

#[tokio::test]
async fn unknown_ids_are_404() {
    let (app, _) = app_at(0);

    for (method, uri) in [
        ("POST", "/api/players/7/start"),
        ("POST", "/api/players/7/stop"),
        ("GET", "/api/players/7"),
        ("GET", "/api/players/7/elapsed"),
        ("DELETE", "/api/players/7"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn delete_then_start_is_404() {
    let (app, _) = app_at(0);
    send(&app, "POST", "/api/players", None).await;

    let (status, body) = send(&app, "DELETE", "/api/players/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, "POST", "/api/players/1/start", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rename_rejects_blank_names() {
    let (app, _) = app_at(0);
    send(&app, "POST", "/api/players", None).await;

    let (status, _) = send(&app, "PATCH", "/api/players/1", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let rename = json!({ "name": "Zed" });
    let (status, body) = send(&app, "PATCH", "/api/players/1", Some(rename)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Zed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_stop_requests_credit_one_session() {
    let (app, clock) = app_at(0);
    send(&app, "POST", "/api/players", None).await;
    send(&app, "POST", "/api/players/1/start", None).await;
    clock.set_millis(600);

    let requests = (0..16).map(|_| {
        let app = app.clone();
        tokio::spawn(async move { send(&app, "POST", "/api/players/1/stop", None).await })
    });
    for handle in futures::future::join_all(requests).await {
        let (status, _) = handle.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, "GET", "/api/players/1", None).await;
    assert_eq!(body["elapsedTime"], 600);
    assert_eq!(body["isRunning"], false);
}

#[tokio::test]
async fn status_and_health() {
    let (app, _) = app_at(0);
    send(&app, "POST", "/api/players", None).await;
    send(&app, "POST", "/api/players/1/start", None).await;

    let (status, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timers"], 1);
    assert_eq!(body["running"], 1);
    assert_eq!(body["last_action"], "start 1");

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
