//! HTTP-level integration tests for the caching endpoints
//!
//! Drives the real router in-process via `tower::ServiceExt::oneshot`, with
//! a fresh `AppState` per test. Refresher ticks are driven manually through
//! `SharedItem::tick()` instead of sleeping through real refresh periods.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use cache_header_demo::router::{AppState, create_router};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

fn test_app() -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new());
    let router = create_router(Arc::clone(&state));
    (state, router)
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get_conditional(app: &Router, uri: &str, if_modified_since: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::IF_MODIFIED_SINCE, if_modified_since)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

fn response_header(response: &Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn ping_returns_pong_without_caching_headers() {
    let (_, app) = test_app();
    let response = get(&app, "/ping").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    assert!(response.headers().get(header::EXPIRES).is_none());
    assert!(response.headers().get(header::PRAGMA).is_none());

    let body = body_json(response).await;
    assert_eq!(body["message"], "pong");
    assert!(body.get("random").is_none());
}

#[tokio::test]
async fn expires_header_matches_body_echo() {
    let (_, app) = test_app();
    let response = get(&app, "/5_sec_expires").await;

    assert_eq!(response.status(), StatusCode::OK);
    let expires = response_header(&response, header::EXPIRES).expect("Expires header");
    assert!(expires.ends_with(" GMT"));

    let body = body_json(response).await;
    assert_eq!(body["headers"]["expires"], expires);
    assert!(body["random"].is_i64());
}

#[tokio::test]
async fn pragma_endpoint_sets_no_cache() {
    let (_, app) = test_app();
    let response = get(&app, "/pragma").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_header(&response, header::PRAGMA).as_deref(),
        Some("no-cache")
    );
}

#[tokio::test]
async fn max_age_and_no_store_set_constant_cache_control() {
    let (_, app) = test_app();

    let response = get(&app, "/cache_control_5_sec").await;
    assert_eq!(
        response_header(&response, header::CACHE_CONTROL).as_deref(),
        Some("max-age=5")
    );

    let response = get(&app, "/cache_control_no_store").await;
    assert_eq!(
        response_header(&response, header::CACHE_CONTROL).as_deref(),
        Some("no-store")
    );
}

#[tokio::test]
async fn no_cache_empty_token_on_first_contact_is_not_modified() {
    // The slot's zero value is the empty string, so the very first request
    // without a Token matches it.
    let (_, app) = test_app();
    let response = get(&app, "/cache_control_no_cache").await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    assert!(response.headers().get(header::ETAG).is_none());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn no_cache_token_lifecycle() {
    let (_, app) = test_app();

    // New token: accepted.
    let response = get(&app, "/cache_control_no_cache?Token=abc").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_header(&response, header::CACHE_CONTROL).as_deref(),
        Some("no-cache")
    );
    assert_eq!(response_header(&response, header::ETAG).as_deref(), Some("abc"));
    let body = body_json(response).await;
    assert_eq!(body["token"], "abc");
    assert_eq!(body["headers"]["ETag"], "abc");

    // Same token again: unchanged, empty body.
    let response = get(&app, "/cache_control_no_cache?Token=abc").await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(response).await.is_empty());

    // Different token: accepted again.
    let response = get(&app, "/cache_control_no_cache?Token=xyz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_header(&response, header::ETAG).as_deref(), Some("xyz"));
}

#[tokio::test]
async fn distinct_tokens_each_get_fresh_responses() {
    let (_, app) = test_app();

    for token in ["t1", "t2", "t1"] {
        let uri = format!("/cache_control_no_cache?Token={token}");
        let response = get(&app, &uri).await;
        // Every request flips the slot, so none of these repeat the
        // previously accepted token.
        assert_eq!(response.status(), StatusCode::OK, "token {token}");
    }
}

#[tokio::test]
async fn must_revalidate_carries_exact_headers() {
    let (_, app) = test_app();

    let response = get(&app, "/cache_control_must_revalidate?Token=v1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_header(&response, header::CACHE_CONTROL).as_deref(),
        Some("max-age=5, must-revalidate, private")
    );
    assert_eq!(response_header(&response, header::ETAG).as_deref(), Some("v1"));

    // Its 304 carries no caching headers and no body.
    let response = get(&app, "/cache_control_must_revalidate?Token=v1").await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    assert!(response.headers().get(header::ETAG).is_none());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn validator_slots_are_independent_across_policies() {
    let (_, app) = test_app();

    let response = get(&app, "/cache_control_no_cache?Token=shared").await;
    assert_eq!(response.status(), StatusCode::OK);

    // The same token is new to the must-revalidate policy's slot.
    let response = get(&app, "/cache_control_must_revalidate?Token=shared").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn last_modified_round_trip() {
    let (state, app) = test_app();

    // No validator: fresh body carrying the shared value and its stamp.
    let response = get(&app, "/cache_control_last_modified").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_header(&response, header::CACHE_CONTROL).as_deref(),
        Some("max-age=5, must-revalidate, private")
    );
    let stamp = response_header(&response, header::LAST_MODIFIED).expect("Last-Modified header");
    let body = body_json(response).await;
    assert_eq!(body["random"], state.item.value());
    assert_eq!(body["headers"]["Last-Modified"], stamp);

    // Echoing the stamp back verbatim: unchanged.
    let response = get_conditional(&app, "/cache_control_last_modified", &stamp).await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(response).await.is_empty());

    // A parseable but differently-formatted date is a byte mismatch: fresh.
    let reformatted = stamp.replace(" GMT", " +0000");
    let response = get_conditional(&app, "/cache_control_last_modified", &reformatted).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn last_modified_value_is_stable_within_a_refresh_window() {
    let (_, app) = test_app();

    let first = body_json(get(&app, "/cache_control_last_modified").await).await;
    let second = body_json(get(&app, "/cache_control_last_modified").await).await;

    // No tick happened between the calls, so the shared value is identical.
    assert_eq!(first["random"], second["random"]);
}

#[tokio::test]
async fn last_modified_revalidates_after_manual_tick() {
    let (state, app) = test_app();

    let response = get(&app, "/cache_control_last_modified").await;
    let stamp = response_header(&response, header::LAST_MODIFIED).unwrap();
    let response = get_conditional(&app, "/cache_control_last_modified", &stamp).await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    state.item.tick();

    // A stale validator gets the post-tick stamp, which validates in turn.
    let response = get_conditional(&app, "/cache_control_last_modified", "stale").await;
    assert_eq!(response.status(), StatusCode::OK);
    let new_stamp = response_header(&response, header::LAST_MODIFIED).unwrap();
    let response = get_conditional(&app, "/cache_control_last_modified", &new_stamp).await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn index_serves_html() {
    let (_, app) = test_app();
    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response_header(&response, header::CONTENT_TYPE).unwrap();
    assert!(content_type.starts_with("text/html"));

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("/cache_control_last_modified"));
}
