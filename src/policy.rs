//! The conditional-caching decision core
//!
//! Each public function evaluates one caching/validation strategy and maps
//! (stored validator state, incoming request validator) to a
//! [`CachingDecision`]: status, response headers, and optional JSON body.
//! The dispatch layer in [`crate::router`] turns a decision into an HTTP
//! response without adding or removing anything.
//!
//! Per-policy state machine (for the policies that hold a validator slot):
//! a request either matches the slot and short-circuits to `NotModified`,
//! or presents a new token which overwrites the slot and becomes the
//! baseline for subsequent comparisons. There is no distinct "initial"
//! state beyond the slot's empty-string zero value, so the very first
//! request with an empty token matches and yields 304. That quirk is
//! deliberate and preserved.

use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::clock::{http_date, random_value};
use crate::item::SharedItem;

/// Freshness window advertised via `Expires` and `max-age`, in seconds.
pub const FRESHNESS_WINDOW_SECS: i64 = 5;

/// `Cache-Control` value for the max-age policy.
pub const CC_MAX_AGE: &str = "max-age=5";
/// `Cache-Control` value for the no-store policy.
pub const CC_NO_STORE: &str = "no-store";
/// `Cache-Control` value for the no-cache policy.
pub const CC_NO_CACHE: &str = "no-cache";
/// `Cache-Control` value for the must-revalidate and last-modified policies.
pub const CC_MUST_REVALIDATE: &str = "max-age=5, must-revalidate, private";

/// Whether the client's cached copy can still be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Return a fresh body with status 200.
    Fresh,
    /// The client's copy is current: status 304, no headers, no body.
    NotModified,
}

/// The output of one policy evaluation. Constructed per-request, never
/// stored. Header order is preserved as inserted.
#[derive(Debug, Clone)]
pub struct CachingDecision {
    /// Fresh (200) or not-modified (304).
    pub status: Freshness,
    /// Response headers to set, in insertion order. Names are lowercase
    /// (HTTP header names are case-insensitive on the wire).
    pub headers: Vec<(&'static str, String)>,
    /// JSON body; present exactly when `status` is `Fresh`.
    pub body: Option<Value>,
}

impl CachingDecision {
    fn not_modified() -> Self {
        Self {
            status: Freshness::NotModified,
            headers: Vec::new(),
            body: None,
        }
    }

    fn fresh(headers: Vec<(&'static str, String)>, body: Value) -> Self {
        Self {
            status: Freshness::Fresh,
            headers,
            body: Some(body),
        }
    }
}

/// Per-policy "last accepted token" memory.
///
/// Holds the token from the most recently accepted (non-304) request to its
/// policy. Starts empty. The compare-then-set is atomic under the mutex;
/// across concurrent requests the last writer wins.
#[derive(Debug, Default)]
pub struct ValidatorSlot {
    token: Mutex<String>,
}

impl ValidatorSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `token` against the slot. Returns `false` when it matches
    /// (the client's copy is current); otherwise stores it and returns
    /// `true`.
    pub fn accept(&self, token: &str) -> bool {
        let mut stored = self.token.lock();
        if *stored == token {
            return false;
        }
        *stored = token.to_string();
        true
    }

    /// The most recently accepted token.
    pub fn last_token(&self) -> String {
        self.token.lock().clone()
    }
}

/// Liveness check. No caching headers at all.
pub fn ping() -> CachingDecision {
    CachingDecision::fresh(Vec::new(), json!({ "message": "pong" }))
}

/// `Expires: now + 5s`, recomputed on every call. This header predates
/// HTTP/1.1; `Cache-Control` supersedes it.
pub fn expires_5_sec() -> CachingDecision {
    let expires = http_date(FRESHNESS_WINDOW_SECS);

    CachingDecision::fresh(
        vec![("expires", expires.clone())],
        json!({
            "message": "Using the `Expires` header to set the expiry of this JSON data blob to 5 seconds. You can see the `random` value change if you request it after 5 seconds.",
            "random": random_value(),
            "headers": { "expires": expires },
        }),
    )
}

/// `Pragma: no-cache`. Pre-HTTP/1.1, deprecated, kept for backward
/// compatibility only.
pub fn pragma_no_cache() -> CachingDecision {
    let pragma = "no-cache";

    CachingDecision::fresh(
        vec![("pragma", pragma.to_string())],
        json!({
            "message": "Using the `Pragma` header to set caching as disabled. You can see the `random` value change every time you make a request.",
            "random": random_value(),
            "headers": { "pragma": pragma },
        }),
    )
}

/// `Cache-Control: max-age=5`.
pub fn max_age_5_sec() -> CachingDecision {
    CachingDecision::fresh(
        vec![("cache-control", CC_MAX_AGE.to_string())],
        json!({
            "message": "Using the `Cache-Control` header to set caching for 5 seconds. You can see the `random` value change if you request it after 5 seconds.",
            "random": random_value(),
            "headers": { "Cache-Control": CC_MAX_AGE },
        }),
    )
}

/// `Cache-Control: no-store` - the client must not cache at all.
pub fn no_store() -> CachingDecision {
    CachingDecision::fresh(
        vec![("cache-control", CC_NO_STORE.to_string())],
        json!({
            "message": "Using the `Cache-Control` header to ensure no caching. You can see the `random` value change every time.",
            "random": random_value(),
            "headers": { "cache-control": CC_NO_STORE },
        }),
    )
}

/// `Cache-Control: no-cache` with an `ETag` echoing the `Token` query
/// parameter. A token matching the slot yields 304; a new token is stored
/// and answered fresh.
pub fn no_cache_etag(slot: &ValidatorSlot, token: &str) -> CachingDecision {
    if !slot.accept(token) {
        return CachingDecision::not_modified();
    }

    CachingDecision::fresh(
        vec![
            ("cache-control", CC_NO_CACHE.to_string()),
            ("etag", token.to_string()),
        ],
        json!({
            "message": "Using the `Cache-Control` and `ETag` headers to ensure the cached value is revalidated with `ETag`. You can see the `random` value change if the `Token` changes.",
            "token": token,
            "random": random_value(),
            "headers": {
                "Cache-Control": CC_NO_CACHE,
                "ETag": token,
            },
        }),
    )
}

/// `Cache-Control: max-age=5, must-revalidate, private` with an `ETag`.
/// Unlike plain `max-age`, a stale entry must not be served when
/// revalidation is impossible (e.g. the client is offline).
pub fn must_revalidate_etag(slot: &ValidatorSlot, token: &str) -> CachingDecision {
    if !slot.accept(token) {
        return CachingDecision::not_modified();
    }

    CachingDecision::fresh(
        vec![
            ("cache-control", CC_MUST_REVALIDATE.to_string()),
            ("etag", token.to_string()),
        ],
        json!({
            "message": "Using the `Cache-Control` and `ETag` headers to revalidate once the cached value is stale. The client revalidates when it regains network after the cache went stale. You can see the `random` value change if the `Token` changes.",
            "token": token,
            "random": random_value(),
            "headers": {
                "Cache-Control": CC_MUST_REVALIDATE,
                "ETag": token,
            },
        }),
    )
}

/// `Last-Modified` validation against the shared item.
///
/// The supplied `If-Modified-Since` value is compared byte-for-byte against
/// the item's stored HTTP-date; no date parsing. A validly-parseable but
/// differently-formatted date therefore counts as stale and yields 200.
/// The body carries the shared item's current value, not a fresh random
/// draw.
pub fn last_modified(item: &SharedItem, if_modified_since: &str) -> CachingDecision {
    let (value, stamp) = item.snapshot();

    if if_modified_since == stamp {
        return CachingDecision::not_modified();
    }

    CachingDecision::fresh(
        vec![
            ("cache-control", CC_MUST_REVALIDATE.to_string()),
            ("last-modified", stamp.clone()),
        ],
        json!({
            "message": "Using the `Cache-Control` and `Last-Modified` headers for caching. The random number changes every 10 seconds, but the client only revalidates after 5 seconds once its local cache is stale.",
            "random": value,
            "headers": {
                "Cache-Control": CC_MUST_REVALIDATE,
                "Last-Modified": stamp,
            },
        }),
    )
}
