//! HTTP Caching-Headers Demo Server
//!
//! Demonstrates HTTP caching semantics via a small set of JSON endpoints:
//!
//! - **Freshness headers**: `Expires`, `Pragma`, `Cache-Control`
//! - **Validators**: `ETag`/token-based revalidation and
//!   `Last-Modified`/`If-Modified-Since`
//!
//! Each endpoint returns a JSON payload annotated with the headers that
//! drive client/proxy caching behavior. The conditional endpoints decide
//! between a fresh body (200) and `304 Not Modified` based on a
//! client-supplied validator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod item;
pub mod policy;
pub mod router;
pub mod server;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
