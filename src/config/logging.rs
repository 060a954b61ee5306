//! Logging setup and redaction of SDK secrets
//!
//! The SDK only emits `tracing` events; applications (and the `paradex`
//! binary) install a subscriber once with [`init_logging`]:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | `paradex_sdk=info` | Level filter |
//! | `LOG_FORMAT` | `json` | `json` or `pretty` |
//!
//! Private keys, JWTs and Stark signatures go through the helpers below
//! before they reach a log line.

use std::fmt;
use std::sync::Once;

use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_LEVEL: &str = "paradex_sdk=info";

/// Replacement for redacted header values and fields
pub const REDACTED: &str = "[REDACTED]";

static INIT: Once = Once::new();

/// Install a JSON (or pretty, with `LOG_FORMAT=pretty`) subscriber.
///
/// Only the first call has an effect, and a subscriber installed by the host
/// application is left in place.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| EnvFilter::try_new(level).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL));

        let pretty = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("pretty"))
            .unwrap_or(false);

        let registry = tracing_subscriber::registry().with(filter);
        let _ = if pretty {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_target(true))
                .try_init()
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_current_span(true),
                )
                .try_init()
        };
    });
}

/// Private key (L1 or L2) shown as its `0x` prefix and two hex digits.
#[derive(Clone, Copy)]
pub struct SanitizedValue<'a>(&'a str);

impl<'a> SanitizedValue<'a> {
    pub fn new(value: &'a str) -> Self {
        Self(value)
    }
}

impl fmt::Display for SanitizedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get(..4) {
            Some(prefix) if self.0.len() > 8 => write!(f, "{}...REDACTED", prefix),
            _ => f.write_str("REDACTED"),
        }
    }
}

impl fmt::Debug for SanitizedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SanitizedValue(***)")
    }
}

/// Flattened Stark signature `["<r>","<s>"]` reduced to the head of `r`.
pub fn sanitize_signature(signature: &str) -> String {
    let r = serde_json::from_str::<Vec<String>>(signature)
        .ok()
        .and_then(|parts| parts.into_iter().next());

    match r {
        Some(r) if r.len() > 8 => format!("r={}...", &r[..8]),
        _ => REDACTED.to_string(),
    }
}

/// JWT reduced to the first and last four characters, enough to tell two
/// sessions apart.
pub fn sanitize_jwt(jwt: &str) -> String {
    if jwt.len() < 16 || !jwt.is_ascii() {
        return REDACTED.to_string();
    }
    format!("{}...{}", &jwt[..4], &jwt[jwt.len() - 4..])
}
