use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Method, Request, StatusCode, header},
    routing::{get, post},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

use identity_registry::{
    api::v1::extractors::AuthCtxExtractor,
    app::build_router,
    middleware::{auth::access, http::HttpLimits},
    repos::IdentityRegistry,
    services::auth::AuthService,
    state::AppState,
};

const SECRET: &[u8] = b"integration-secret";

fn state() -> AppState {
    state_with_stream_timeout(Duration::from_secs(5))
}

fn state_with_stream_timeout(stream_timeout: Duration) -> AppState {
    AppState::new(
        Arc::new(IdentityRegistry::new()),
        Arc::new(AuthService::new(SECRET, 0).unwrap()),
        stream_timeout,
    )
}

fn sign_with(alg: Algorithm, secret: &[u8], payload: Value) -> String {
    jsonwebtoken::encode(&Header::new(alg), &payload, &EncodingKey::from_secret(secret)).unwrap()
}

fn ann_token() -> String {
    sign_with(
        Algorithm::HS256,
        SECRET,
        json!({"name": "Ann", "email": "ann@x.test"}),
    )
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Bytes) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let res = app
        .clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

fn ndjson_ids(body: &Bytes) -> Vec<String> {
    std::str::from_utf8(body)
        .unwrap()
        .lines()
        .map(|line| {
            let v: Value = serde_json::from_str(line).unwrap();
            v["id"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn add_then_list_with_valid_token() {
    let state = state();
    let app = build_router(state.clone(), HttpLimits::default());
    let token = ann_token();

    let (status, body) = call(&app, Method::POST, "/api/v1/identities", Some(&token)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_slice(&body).unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let (status, body) = call(&app, Method::GET, "/api/v1/identities", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ndjson_ids(&body), vec![id]);
}

#[tokio::test]
async fn list_streams_in_insertion_order() {
    let state = state();
    let app = build_router(state.clone(), HttpLimits::default());
    let token = ann_token();

    let mut added = Vec::new();
    for _ in 0..3 {
        let (_, body) = call(&app, Method::POST, "/api/v1/identities", Some(&token)).await;
        let created: Value = serde_json::from_slice(&body).unwrap();
        added.push(created["id"].as_str().unwrap().to_string());
    }

    let (status, body) = call(&app, Method::GET, "/api/v1/identities", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ndjson_ids(&body), added);
}

#[tokio::test]
async fn list_content_type_is_ndjson() {
    let app = build_router(state(), HttpLimits::default());

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/identities")
                .header(header::AUTHORIZATION, format!("Bearer {}", ann_token()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/x-ndjson"
    );
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn list_past_deadline_ends_with_body_error() {
    let state = state_with_stream_timeout(Duration::from_millis(20));
    for _ in 0..2000 {
        state.registry.add().await;
    }
    let app = build_router(state.clone(), HttpLimits::default());

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/identities")
                .header(header::AUTHORIZATION, format!("Bearer {}", ann_token()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // slow consumer: the producer fills the buffer and hits the deadline
    tokio::time::sleep(Duration::from_millis(100)).await;

    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await;
    assert!(body.is_err(), "truncated stream must not end cleanly");
}

#[tokio::test]
async fn two_adds_yield_distinct_ids() {
    let state = state();
    let app = build_router(state.clone(), HttpLimits::default());
    let token = ann_token();

    let (_, first) = call(&app, Method::POST, "/api/v1/identities", Some(&token)).await;
    let (_, second) = call(&app, Method::POST, "/api/v1/identities", Some(&token)).await;

    let first: Value = serde_json::from_slice(&first).unwrap();
    let second: Value = serde_json::from_slice(&second).unwrap();
    assert_ne!(first["id"], second["id"]);
    assert_eq!(state.registry.len().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_over_http() {
    const N: usize = 50;
    let state = state();
    let app = build_router(state.clone(), HttpLimits::default());
    let token = ann_token();

    let handles: Vec<_> = (0..N)
        .map(|_| {
            let app = app.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let (status, body) =
                    call(&app, Method::POST, "/api/v1/identities", Some(&token)).await;
                assert_eq!(status, StatusCode::CREATED);
                let v: Value = serde_json::from_slice(&body).unwrap();
                v["id"].as_str().unwrap().to_string()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), N);

    let (_, body) = call(&app, Method::GET, "/api/v1/identities", Some(&token)).await;
    let listed: HashSet<_> = ndjson_ids(&body).into_iter().collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn wrong_secret_is_unauthorized_and_registry_untouched() {
    let state = state();
    let app = build_router(state.clone(), HttpLimits::default());
    let token = sign_with(
        Algorithm::HS256,
        b"not-the-secret",
        json!({"name": "Ann", "email": "ann@x.test"}),
    );

    let (status, body) = call(&app, Method::POST, "/api/v1/identities", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"]["code"], "UNAUTHORIZED");
    assert!(state.registry.is_empty().await);
}

#[tokio::test]
async fn missing_authorization_is_unauthorized() {
    let state = state();
    let app = build_router(state.clone(), HttpLimits::default());

    let (status, _) = call(&app, Method::POST, "/api/v1/identities", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/v1/identities", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(state.registry.is_empty().await);
}

#[tokio::test]
async fn all_auth_failures_share_one_response_body() {
    let app = build_router(state(), HttpLimits::default());

    let tokens = [
        "garbage".to_string(),
        sign_with(Algorithm::HS256, b"other", json!({"name": "Ann", "email": "a@x.test"})),
        sign_with(Algorithm::HS512, SECRET, json!({"name": "Ann", "email": "a@x.test"})),
        sign_with(Algorithm::HS256, SECRET, json!({"name": "Ann"})),
    ];

    let (_, reference) = call(&app, Method::GET, "/api/v1/identities", None).await;
    for token in &tokens {
        let (status, body) = call(&app, Method::GET, "/api/v1/identities", Some(token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, reference);
    }
}

#[tokio::test]
async fn health_does_not_require_a_token() {
    let app = build_router(state(), HttpLimits::default());

    let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["status"], "ok");
}

/// Router with a handler that only counts how often it ran.
fn probe_app(state: AppState, hits: Arc<AtomicUsize>) -> Router {
    let probe = Router::new().route(
        "/probe",
        post(move || {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::NO_CONTENT
            }
        }),
    );

    access::apply(probe, state.clone()).with_state(state)
}

#[tokio::test]
async fn handler_not_invoked_for_invalid_claims() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = probe_app(state(), Arc::clone(&hits));

    let payloads = [
        json!({"name": "Ann"}),
        json!({"email": "ann@x.test"}),
        json!({"name": 1, "email": "ann@x.test"}),
        json!({"name": "Ann", "email": false}),
        json!({"name": null, "email": "ann@x.test"}),
    ];
    for payload in payloads {
        let token = sign_with(Algorithm::HS256, SECRET, payload);
        let (status, _) = call(&app, Method::POST, "/probe", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    assert_eq!(hits.load(Ordering::SeqCst), 0);

    // sanity: a good token does reach the handler
    let (status, _) = call(&app, Method::POST, "/probe", Some(&ann_token())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handler_not_invoked_for_substituted_algorithm() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = probe_app(state(), Arc::clone(&hits));

    for alg in [Algorithm::HS384, Algorithm::HS512] {
        let token = sign_with(alg, SECRET, json!({"name": "Ann", "email": "ann@x.test"}));
        let (status, _) = call(&app, Method::POST, "/probe", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // {"alg":"none","typ":"JWT"}.{"name":"Ann","email":"ann@x.test"}.
    let unsigned = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJuYW1lIjoiQW5uIiwiZW1haWwiOiJhbm5AeC50ZXN0In0.";
    let (status, _) = call(&app, Method::POST, "/probe", Some(unsigned)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_without_auth_layer_fails_closed() {
    let state = state();
    let app: Router = Router::new()
        .route(
            "/unguarded",
            get(|AuthCtxExtractor(ctx): AuthCtxExtractor| async move { ctx.name().to_string() }),
        )
        .with_state(state);

    let (status, body) = call(&app, Method::GET, "/unguarded", Some(&ann_token())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"]["code"], "INTERNAL_SERVER_ERROR");
}
