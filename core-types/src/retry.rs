// Copyright (c) James Kassemi, SC, US. All rights reserved.

use log::warn;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Jittered exponential backoff for idempotent network reads.
///
/// Mutating store calls must not be run through this policy; a retried
/// append after a timed-out-but-delivered request would double-log a
/// payment.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64, max_delay_ms: u64, jitter_pct: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base_delay_ms.max(1),
            max_delay_ms: max_delay_ms.max(base_delay_ms.max(1)),
            jitter_pct: jitter_pct.clamp(0.0, 1.0),
        }
    }

    pub fn default_network() -> Self {
        Self::new(4, 200, 4_000, 0.25)
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let doubled = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt as u32))
            .min(self.max_delay_ms);
        let jittered = if self.jitter_pct > 0.0 {
            let spread = (doubled as f64 * self.jitter_pct) as u64;
            doubled + rand::thread_rng().gen_range(0..=spread)
        } else {
            doubled
        };
        Duration::from_millis(jittered)
    }

    /// Runs `op` until it succeeds or `max_attempts` is exhausted,
    /// returning the last error.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        for attempt in 0..self.max_attempts {
            match op().await {
                Ok(val) => return Ok(val),
                Err(err) => {
                    if attempt + 1 == self.max_attempts {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        "attempt {}/{} failed ({err}), backing off {delay:?}",
                        attempt + 1,
                        self.max_attempts
                    );
                    sleep(delay).await;
                }
            }
        }
        unreachable!("max_attempts is clamped to at least 1")
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_network()
    }
}
