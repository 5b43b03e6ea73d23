use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use keg_backends::MemoryStore;
use keg_cli::app::build_state;
use keg_cli::http::{AppState, build_router};
use keg_config::Config;
use keg_traits::{KvStore, ManualClock};
use std::sync::Arc;
use tower::ServiceExt;

fn state_with(store: Arc<dyn KvStore>) -> Arc<AppState> {
    let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 17, 17, 0, 0).unwrap());
    Arc::new(build_state(&Config::default(), store, Arc::new(clock)).unwrap())
}

fn state() -> Arc<AppState> {
    state_with(Arc::new(MemoryStore::new()))
}

async fn call(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, bytes::Bytes) {
    let resp = build_router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn post_text(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn push_answers_with_padded_beers_left() {
    let st = state();
    let (code, _) = call(
        &st,
        post_json("/api/scale/active-keg", serde_json::json!({ "keg": 20 })),
    )
    .await;
    assert_eq!(code, StatusCode::NO_CONTENT);

    let (code, body) = call(&st, post_text("/api/scale/push", "push|7|-60.5|20000")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(&body[..], b"  21");

    let snap = st.engine.snapshot();
    assert_eq!(snap.rssi, -60.5);
    assert!(snap.pub_state.is_open);
}

#[tokio::test]
async fn ping_keeps_the_pub_open_without_measuring() {
    let st = state();
    let (code, body) = call(&st, post_text("/api/scale/push", "ping|1|-70|0")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(&body[..], b"   0");
    assert_eq!(st.engine.snapshot().weight, 0.0);
    assert!(st.engine.get_opening().is_open);
}

#[tokio::test]
async fn malformed_push_is_a_client_error() {
    let st = state();
    let (code, body) = call(&st, post_text("/api/scale/push", "push|x")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(v["error"].as_str().unwrap().contains("invalid scale message"));
    // nothing happened
    assert!(!st.engine.get_opening().is_open);
}

#[tokio::test]
async fn unknown_keg_sizes_are_rejected() {
    let st = state();
    let (code, _) = call(
        &st,
        post_json("/api/scale/active-keg", serde_json::json!({ "keg": 25 })),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, _) = call(
        &st,
        post_json(
            "/api/scale/warehouse",
            serde_json::json!({ "keg": 40, "way": "up" }),
        ),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn warehouse_moves_show_up_in_status() {
    let st = state();
    for way in ["up", "up", "down"] {
        let (code, _) = call(
            &st,
            post_json(
                "/api/scale/warehouse",
                serde_json::json!({ "keg": 15, "way": way }),
            ),
        )
        .await;
        assert_eq!(code, StatusCode::NO_CONTENT);
    }

    let (code, body) = call(&st, get("/api/scale/status")).await;
    assert_eq!(code, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["warehouse"][1]["keg"], 15);
    assert_eq!(v["warehouse"][1]["amount"], 1);
    assert_eq!(v["warehouse_beer_left"], 30);
}

#[tokio::test]
async fn opening_events_and_metrics_are_served() {
    let st = state();
    call(&st, post_text("/api/scale/push", "push|1|-50|16400")).await;

    let (code, body) = call(&st, get("/api/scale/opening")).await;
    assert_eq!(code, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["is_open"], true);

    assert!(st.engine.wait_for_events(std::time::Duration::from_secs(2)));
    let (code, body) = call(&st, get("/api/scale/events")).await;
    assert_eq!(code, StatusCode::OK);
    let v: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(v, vec!["pub_open AT 2024-05-17T17:00:00Z".to_string()]);

    let (code, body) = call(&st, get("/api/metrics")).await;
    assert_eq!(code, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["weight"], 16400.0);
    assert_eq!(v["rssi"], -50.0);
    assert_eq!(v["pub_open"], 1);
}

#[tokio::test]
async fn store_failure_on_push_is_a_server_error() {
    let flaky = Arc::new(keg_core::mocks::FlakyKv::new(Arc::new(MemoryStore::new())));
    let st = state_with(flaky.clone());
    flaky.fail_writes(true);

    let (code, _) = call(&st, post_text("/api/scale/push", "push|3|-60|20000")).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    // the reading is still applied in memory
    assert_eq!(st.engine.snapshot().weight, 20000.0);
}
