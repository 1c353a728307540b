//! HTTP surface tests driven through the router without a socket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pow_ledger_node::{
    router, AppState, AppendStrategy, Block, FixedClock, Ledger, LedgerConfig, Miner,
};

fn app(difficulty: u32) -> (Router, AppState) {
    let ledger = Ledger::new(
        LedgerConfig {
            difficulty,
            strategy: AppendStrategy::Serialized,
            ..LedgerConfig::default()
        },
        Arc::new(FixedClock::new("2024-01-01T00:00:00Z")),
    );
    let state = AppState::new(ledger);
    (router(state.clone()), state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_raw(uri, body.to_string())
}

fn post_raw(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_get_returns_genesis_only() {
    let (app, _) = app(0);
    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    let blocks = body.as_array().unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["position"], 0);
    assert_eq!(blocks[0]["prev_digest"], "");
    assert_eq!(blocks[0]["payload"], json!({"genesis": true}));
}

#[tokio::test]
async fn test_post_appends_block() {
    let (app, state) = app(0);
    let checkout = json!({"movie_id": "abc", "viewer": "ann", "checkout_yor": "2024"});
    let (status, body) = send(&app, post_json("/", &checkout)).await;

    assert_eq!(status, StatusCode::CREATED);
    let block: Block = serde_json::from_value(body).unwrap();
    assert_eq!(block.position, 1);
    assert_eq!(block.payload, checkout);
    assert_eq!(block.prev_digest, state.ledger.get(0).unwrap().digest);
    assert!(block.verify());

    let (_, chain) = send(&app, get("/")).await;
    assert_eq!(chain.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_post_mines_with_difficulty() {
    let (app, _) = app(2);
    let (status, body) = send(&app, post_json("/", &json!({"data": 7}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["digest"].as_str().unwrap().starts_with("00"));
    assert_eq!(body["difficulty_target"], 2);
    assert!(body["nonce"].is_u64());
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let (app, state) = app(0);

    let (status, body) = send(&app, post_raw("/", "{not json".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "malformed_input");

    let (status, _) = send(&app, post_raw("/", "null".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing_type = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _) = send(&app, missing_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(state.ledger.block_count(), 1);
}

#[tokio::test]
async fn test_mining_exhausted_is_service_unavailable() {
    let ledger = Ledger::new(
        LedgerConfig {
            difficulty: 64,
            max_attempts: 16,
            strategy: AppendStrategy::Serialized,
        },
        Arc::new(FixedClock::new("t")),
    );
    let app = router(AppState::new(ledger));
    let (status, body) = send(&app, post_json("/", &json!("x"))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "mining_exhausted");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_submit_client_mined_block() {
    let (app, state) = app(1);
    let candidate = Miner::default()
        .mine(&state.ledger.tip(), json!("mine"), 1, &FixedClock::new("t"))
        .unwrap();

    let body = serde_json::to_value(&candidate).unwrap();
    let (status, committed) = send(&app, post_json("/blocks", &body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(committed["digest"], candidate.digest.as_str());

    // Replaying the same block no longer extends the tip.
    let (status, err) = send(&app, post_json("/blocks", &body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "invalid_extension");
    assert_eq!(state.ledger.block_count(), 2);
}

#[tokio::test]
async fn test_submit_off_by_one_block_is_conflict() {
    let (app, state) = app(0);
    let genesis = state.ledger.tip();
    let candidate = Block::seal(2, json!("X"), "t".into(), genesis.digest, 0, None);

    let body = serde_json::to_value(&candidate).unwrap();
    let (status, err) = send(&app, post_json("/blocks", &body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["message"].as_str().unwrap().contains("position mismatch"));
    assert_eq!(state.ledger.block_count(), 1);
}

#[tokio::test]
async fn test_submit_tampered_block_is_unprocessable() {
    let (app, state) = app(0);
    let mut candidate = Block::seal(1, json!("a"), "t".into(), state.ledger.tip().digest, 0, None);
    candidate.payload = json!("b");

    let body = serde_json::to_value(&candidate).unwrap();
    let (status, err) = send(&app, post_json("/blocks", &body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "digest_mismatch");
}

#[tokio::test]
async fn test_get_block_by_position() {
    let (app, _) = app(0);
    send(&app, post_json("/", &json!("first"))).await;

    let (status, body) = send(&app, get("/blocks/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payload"], "first");

    let (status, body) = send(&app, get("/blocks/9")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_validate_endpoint() {
    let (app, _) = app(1);
    for i in 0..3 {
        send(&app, post_json("/", &json!({"i": i}))).await;
    }

    let (status, body) = send(&app, get("/validate")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["length"], 4);
    assert_eq!(body["difficulty"], 1);
    assert_eq!(body["errors"], json!([]));
}

#[tokio::test]
async fn test_register_movie_assigns_id() {
    let (app, _) = app(0);
    let movie = json!({"name": "Stalker", "director": "Tarkovsky", "yor": "1979"});
    let (status, body) = send(&app, post_json("/movies", &movie)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["id"],
        pow_ledger_node::catalog::movie_id("Tarkovsky", "1979").as_str()
    );

    let (status, _) = send(&app, post_json("/movies", &json!({"name": "x"}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_register_movie_legacy_path() {
    let (app, _) = app(0);
    let movie = json!({"name": "Solaris", "director": "Tarkovsky", "yor": "1972"});
    let (status, body) = send(&app, post_json("/new", &movie)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["id"],
        pow_ledger_node::catalog::movie_id("Tarkovsky", "1972").as_str()
    );
}

#[tokio::test]
async fn test_health_and_version() {
    let (app, _) = app(0);
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, body) = send(&app, get("/version")).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_concurrent_posts_form_one_chain() {
    let (app, state) = app(1);
    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { send(&app, post_json("/", &json!({"req": i}))).await })
        })
        .collect();
    for t in tasks {
        let (status, _) = t.await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    let chain = state.ledger.snapshot();
    assert_eq!(chain.len(), 17);
    assert!(state.ledger.audit().is_ok());
}

#[tokio::test]
async fn test_submit_during_mine_does_not_stall_runtime() {
    // Unreachable difficulty: the append mines until its attempt bound.
    let ledger = Ledger::new(
        LedgerConfig {
            difficulty: 64,
            max_attempts: 3_000_000,
            strategy: AppendStrategy::Serialized,
        },
        Arc::new(FixedClock::new("t")),
    );
    let state = AppState::new(ledger);
    let app = router(state.clone());

    let mine = {
        let app = app.clone();
        tokio::spawn(async move { send(&app, post_json("/", &json!("slow"))).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let genesis = state.ledger.tip();
    let candidate = Block::seal(1, json!("late"), "t".into(), genesis.digest, 64, Some(0));
    let submit = {
        let app = app.clone();
        let body = serde_json::to_value(&candidate).unwrap();
        tokio::spawn(async move { send(&app, post_json("/blocks", &body)).await })
    };

    let started = Instant::now();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let (status, _) = send(&app, get("/health")).await;
    let elapsed = started.elapsed();

    assert_eq!(status, StatusCode::OK);
    assert!(
        elapsed < Duration::from_millis(500),
        "health check stalled for {elapsed:?}"
    );

    let (mine_status, _) = mine.await.unwrap();
    assert_eq!(mine_status, StatusCode::SERVICE_UNAVAILABLE);
    let (submit_status, body) = submit.await.unwrap();
    assert_eq!(submit_status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_extension");
    assert_eq!(state.ledger.block_count(), 1);
}
