//! HTTP router and handlers
//!
//! Thin dispatch layer: each handler pulls the request validator out of the
//! query string or headers, calls its policy evaluator, and renders the
//! resulting [`CachingDecision`] without adding or removing anything.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer};
use tracing::warn;

use crate::item::SharedItem;
use crate::policy::{self, CachingDecision, Freshness, ValidatorSlot};

/// Static index page listing the endpoints.
const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared application state
///
/// Owned by the router and injected into handlers, so tests construct a
/// fresh instance per test instead of sharing process-wide globals.
pub struct AppState {
    /// The mutable resource behind the last-modified policy
    pub item: Arc<SharedItem>,
    /// Validator slot for the no-cache policy
    pub no_cache_slot: ValidatorSlot,
    /// Validator slot for the must-revalidate policy
    pub must_revalidate_slot: ValidatorSlot,
}

impl AppState {
    /// Fresh state: newly initialized item, empty validator slots.
    pub fn new() -> Self {
        Self {
            item: Arc::new(SharedItem::new()),
            no_cache_slot: ValidatorSlot::new(),
            must_revalidate_slot: ValidatorSlot::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters for the ETag-validated policies.
#[derive(Debug, Deserialize)]
struct TokenQuery {
    /// Client-supplied validator token; empty when absent.
    #[serde(rename = "Token", default)]
    token: String,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ping", get(ping_handler))
        .route("/5_sec_expires", get(expires_handler))
        .route("/pragma", get(pragma_handler))
        .route("/cache_control_5_sec", get(max_age_handler))
        .route("/cache_control_no_store", get(no_store_handler))
        .route("/cache_control_no_cache", get(no_cache_handler))
        .route("/cache_control_must_revalidate", get(must_revalidate_handler))
        .route("/cache_control_last_modified", get(last_modified_handler))
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - static index page
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /ping
async fn ping_handler() -> Response {
    render(policy::ping())
}

/// GET /5_sec_expires
async fn expires_handler() -> Response {
    render(policy::expires_5_sec())
}

/// GET /pragma
async fn pragma_handler() -> Response {
    render(policy::pragma_no_cache())
}

/// GET /cache_control_5_sec
async fn max_age_handler() -> Response {
    render(policy::max_age_5_sec())
}

/// GET /cache_control_no_store
async fn no_store_handler() -> Response {
    render(policy::no_store())
}

/// GET /cache_control_no_cache?Token=...
async fn no_cache_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    render(policy::no_cache_etag(&state.no_cache_slot, &query.token))
}

/// GET /cache_control_must_revalidate?Token=...
async fn must_revalidate_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    render(policy::must_revalidate_etag(
        &state.must_revalidate_slot,
        &query.token,
    ))
}

/// GET /cache_control_last_modified with optional `If-Modified-Since`
async fn last_modified_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let validator = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    render(policy::last_modified(&state.item, validator))
}

/// Turn a [`CachingDecision`] into an HTTP response.
///
/// `NotModified` becomes a bare 304: no caching headers, no body.
fn render(decision: CachingDecision) -> Response {
    match decision.status {
        Freshness::NotModified => StatusCode::NOT_MODIFIED.into_response(),
        Freshness::Fresh => {
            let mut response = Json(decision.body.unwrap_or(Value::Null)).into_response();
            for (name, value) in decision.headers {
                match HeaderValue::from_str(&value) {
                    Ok(v) => {
                        response
                            .headers_mut()
                            .insert(HeaderName::from_static(name), v);
                    }
                    Err(_) => {
                        // Tokens are client-supplied and may contain bytes
                        // that are not legal in a header value.
                        warn!(header = name, "Skipping header with invalid value");
                    }
                }
            }
            response
        }
    }
}
