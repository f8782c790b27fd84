//! Bounded-retry connection acquisition.

use std::fmt::Display;
use std::time::Duration;

use crate::{QprofError, QprofResult, RetryConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self::new(cfg.max_attempts, cfg.delay())
    }
}

/// Calls `connector` until it succeeds or the policy is exhausted.
///
/// Each failed attempt is logged and followed by `policy.delay`, except the
/// last one. A policy of zero attempts still tries once.
pub fn connect_with_retry<C, E, F>(policy: RetryPolicy, mut connector: F) -> QprofResult<C>
where
    E: Display,
    F: FnMut() -> Result<C, E>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err = String::new();
    for attempt in 1..=attempts {
        match connector() {
            Ok(conn) => {
                tracing::info!("connected to database on attempt {attempt}");
                return Ok(conn);
            }
            Err(err) => {
                tracing::warn!("unable to connect, attempt {attempt} of {attempts}: {err}");
                last_err = err.to_string();
                if attempt < attempts && !policy.delay.is_zero() {
                    std::thread::sleep(policy.delay);
                }
            }
        }
    }
    Err(QprofError::Connection(format!(
        "gave up after {attempts} attempts: {last_err}"
    )))
}
