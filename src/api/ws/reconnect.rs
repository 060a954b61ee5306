//! Reconnection with exponential backoff and jitter

use std::future::Future;
use std::time::Duration;

use crate::error::{ParadexError, ParadexResult};

#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub max_attempts: u32,
    /// Doubles each attempt
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

impl ReconnectConfig {
    /// Delay before `attempt` (0-based), without jitter
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        backoff_ms(attempt, self.initial_delay_ms, self.max_delay_ms)
    }
}

/// `min(initial * 2^attempt, max)`, saturating
pub(crate) fn backoff_ms(attempt: u32, initial_ms: u64, max_ms: u64) -> u64 {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    initial_ms.saturating_mul(factor).min(max_ms)
}

/// Retry `connect_fn` until it succeeds or attempts run out.
///
/// Each attempt waits `min(initial * 2^n, max)` plus 0-199ms of jitter.
pub async fn reconnect_with_backoff<T, F, Fut>(
    config: &ReconnectConfig,
    name: &str,
    mut connect_fn: F,
) -> ParadexResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ParadexResult<T>>,
{
    let mut last_error: Option<ParadexError> = None;

    for attempt in 0..config.max_attempts {
        let jitter = rand::random::<u64>() % 200;
        let backoff_ms = config.backoff_ms(attempt) + jitter;

        tracing::info!(
            "{}: Reconnect attempt {} of {}, waiting {}ms...",
            name,
            attempt + 1,
            config.max_attempts,
            backoff_ms
        );

        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;

        match connect_fn().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!("{}: Reconnect attempt {} failed: {}", name, attempt + 1, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        ParadexError::ConnectionFailed("Reconnection failed after max attempts".into())
    }))
}
