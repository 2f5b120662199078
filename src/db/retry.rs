//! Bounded retry for transient store failures (busy / locked).

use crate::config::Config;
use crate::errors::AppResult;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_retries: cfg.max_retries,
            initial_backoff: Duration::from_millis(cfg.retry_backoff_ms),
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }
}

/// Run `op`, retrying while it fails transiently. Backoff doubles each
/// attempt. Any other error is returned immediately.
pub fn with_retry<T, F>(policy: RetryPolicy, what: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> AppResult<T>,
{
    let mut attempt = 0;
    let mut backoff = policy.initial_backoff;

    loop {
        match op() {
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                tracing::warn!(what, attempt, error = %e, "transient store error, retrying");
                thread::sleep(backoff);
                backoff = backoff.saturating_mul(2);
            }
            other => return other,
        }
    }
}
