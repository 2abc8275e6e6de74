//! Wall-clock and random-value sources
//!
//! Pure utilities shared by the policy evaluators and the background
//! refresher: HTTP-date formatting (second granularity) and the random
//! integers that simulate "fresh data" in response bodies.

use chrono::{Duration, Utc};
use rand::Rng;

/// Upper bound (exclusive) for simulated data values.
pub const RANDOM_CEILING: i64 = 200;

/// Current time plus `offset_secs`, formatted as an HTTP-date
/// (`Sun, 06 Nov 1994 08:49:37 GMT`). Sub-second precision is dropped by
/// the format itself.
pub fn http_date(offset_secs: i64) -> String {
    let t = Utc::now() + Duration::seconds(offset_secs);
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// A fresh random integer in `[0, RANDOM_CEILING)`.
pub fn random_value() -> i64 {
    rand::rng().random_range(0..RANDOM_CEILING)
}
