//! Resilient remote call policy.
//!
//! Every remote request goes through [`ResilientCaller::call`]: it is paced
//! by a fixed minimum delay, and rate-limited failures are retried with
//! capped exponential backoff plus random jitter. Every other error is
//! returned on the spot. The caller keeps no state between calls.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio_retry::strategy::{ExponentialBackoff, FixedInterval};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::defaults::{
    REMOTE_BACKOFF_BASE, REMOTE_BACKOFF_CAP, REMOTE_BACKOFF_JITTER, REMOTE_MAX_ATTEMPTS,
    REMOTE_PACING,
};
use crate::error::{Error, Result};

/// Retry and pacing settings for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub jitter: Duration,
    /// Sleep before every attempt.
    pub pacing: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: REMOTE_MAX_ATTEMPTS,
            backoff_base: REMOTE_BACKOFF_BASE,
            backoff_cap: REMOTE_BACKOFF_CAP,
            jitter: REMOTE_BACKOFF_JITTER,
            pacing: REMOTE_PACING,
        }
    }
}

impl RetryPolicy {
    /// Environment variable overriding the attempt ceiling.
    pub const MAX_ATTEMPTS_ENV: &'static str = "GLEANER_MAX_RETRIES";
    /// Environment variable overriding the pacing delay in milliseconds.
    pub const PACING_ENV: &'static str = "GLEANER_PACING_MS";

    /// Defaults overridden by `GLEANER_MAX_RETRIES` and `GLEANER_PACING_MS`.
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        if let Some(n) = std::env::var(Self::MAX_ATTEMPTS_ENV)
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            policy.max_attempts = n.max(1);
        }
        if let Some(ms) = std::env::var(Self::PACING_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            policy.pacing = Duration::from_millis(ms);
        }
        policy
    }

    /// No pacing, no backoff. Useful for tests.
    pub fn immediate() -> Self {
        Self {
            max_attempts: REMOTE_MAX_ATTEMPTS,
            backoff_base: Duration::ZERO,
            backoff_cap: Duration::ZERO,
            jitter: Duration::ZERO,
            pacing: Duration::ZERO,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_cap = cap;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delays between attempts, one per retry: `min(base * 2^n, cap)`
    /// shifted by up to `jitter` either way.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let jitter = self.jitter;
        // The strategy yields 2^(n+1) * factor; halve it to start at `base`.
        ExponentialBackoff::from_millis(2)
            .factor(self.backoff_base.as_millis() as u64)
            .max_delay(self.backoff_cap.saturating_mul(2))
            .map(|d| d / 2)
            .map(move |d| jittered(d, jitter, rand::thread_rng().gen_range(-1.0..=1.0)))
            .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// `delay` shifted by `jitter * sample`, `sample` clamped to `[-1, 1]`.
/// Never negative.
fn jittered(delay: Duration, jitter: Duration, sample: f64) -> Duration {
    let shift = jitter.as_secs_f64() * sample.clamp(-1.0, 1.0);
    Duration::from_secs_f64((delay.as_secs_f64() + shift).max(0.0))
}

/// Pacing and rate-limit retry decorator for remote calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResilientCaller {
    policy: RetryPolicy,
}

impl ResilientCaller {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `f` under the pacing and retry policy.
    ///
    /// Only [`Error::RateLimited`] is retried; any other error propagates
    /// immediately. After the last attempt the final error is returned.
    pub async fn call<T, F, Fut>(&self, op: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let pacing = self.policy.pacing;
        let max_attempts = self.policy.max_attempts;
        let attempt = AtomicU32::new(0);

        let result = RetryIf::spawn(
            self.policy.delays(),
            || {
                attempt.fetch_add(1, Ordering::Relaxed);
                let request = f();
                async move {
                    if !pacing.is_zero() {
                        tokio::time::sleep(pacing).await;
                    }
                    request.await
                }
            },
            |err: &Error| {
                if !err.is_rate_limited() {
                    return false;
                }
                let attempt = attempt.load(Ordering::Relaxed);
                if attempt < max_attempts {
                    warn!(op, attempt, error = %err, "Rate limited, backing off");
                } else {
                    warn!(op, attempt, error = %err, "Rate limit retries exhausted");
                }
                true
            },
        )
        .await;

        let attempts = attempt.load(Ordering::Relaxed);
        if result.is_ok() && attempts > 1 {
            debug!(op, attempt = attempts, "Remote call succeeded after retry");
        }
        result
    }
}

/// Linear backoff, one delay per retry: `step`, `2 * step`, ...
pub fn linear_delays(step: Duration, retries: u32) -> impl Iterator<Item = Duration> {
    FixedInterval::new(step)
        .zip(1u32..)
        .map(|(d, n)| d.saturating_mul(n))
        .take(retries as usize)
}

/// Retry `f` on transient errors up to `retries` extra times with linear
/// backoff. Used where timeouts must also be absorbed, on top of the
/// rate-limit policy of the underlying client.
pub async fn retry_transient<T, F, Fut>(
    op: &str,
    retries: u32,
    step: Duration,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempt = AtomicU32::new(0);
    RetryIf::spawn(
        linear_delays(step, retries),
        || {
            attempt.fetch_add(1, Ordering::Relaxed);
            f()
        },
        |err: &Error| {
            let transient = err.is_transient();
            let attempt = attempt.load(Ordering::Relaxed);
            if transient && attempt <= retries {
                warn!(op, attempt, error = %err, "Transient failure, retrying");
            }
            transient
        },
    )
    .await
}

/// Convenience for adapters: a remote failure that is never retried.
pub fn permanent(message: impl Into<String>) -> Error {
    Error::Remote {
        status: 0,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_secs(*s)).collect()
    }

    #[test]
    fn test_delays_exponential_and_capped() {
        let policy = RetryPolicy::default().with_jitter(Duration::ZERO);
        assert_eq!(policy.delays().collect::<Vec<_>>(), secs(&[1, 2, 4, 8]));

        let longer = policy.with_max_attempts(8);
        assert_eq!(
            longer.delays().collect::<Vec<_>>(),
            secs(&[1, 2, 4, 8, 10, 10, 10])
        );
    }

    #[test]
    fn test_delays_jitter_stays_in_bounds() {
        let policy = RetryPolicy::default();
        for (delay, base) in policy.delays().zip([1u64, 2, 4, 8]) {
            assert!(delay + Duration::from_secs(1) >= Duration::from_secs(base));
            assert!(delay <= Duration::from_secs(base + 1));
        }
    }

    #[test]
    fn test_jittered_bounds() {
        let one = Duration::from_secs(1);
        assert_eq!(jittered(one, one, 1.0), Duration::from_secs(2));
        assert_eq!(jittered(one, one, -1.0), Duration::ZERO);
        assert_eq!(jittered(Duration::from_secs(10), one, 5.0), Duration::from_secs(11));
    }

    #[test]
    fn test_immediate_policy_has_zero_delays() {
        let delays: Vec<_> = RetryPolicy::immediate().delays().collect();
        assert_eq!(delays, vec![Duration::ZERO; 4]);
    }

    #[test]
    fn test_linear_delays() {
        let delays: Vec<_> = linear_delays(Duration::from_secs(3), 2).collect();
        assert_eq!(delays, secs(&[3, 6]));
    }

    #[test]
    fn test_with_max_attempts_floors_at_one() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_call_success_first_try() {
        let caller = ResilientCaller::new(RetryPolicy::immediate());
        let result = caller.call("op", || async { Ok::<_, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_call_retries_rate_limit_then_succeeds() {
        let caller = ResilientCaller::new(RetryPolicy::immediate());
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = caller
            .call("op", move || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::RateLimited("429".into()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_call_gives_up_after_max_attempts() {
        let caller = ResilientCaller::new(RetryPolicy::immediate());
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<()> = caller
            .call("op", move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(Error::RateLimited("429".into()))
                }
            })
            .await;
        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), REMOTE_MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_call_does_not_retry_other_errors() {
        let caller = ResilientCaller::new(RetryPolicy::immediate());
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<()> = caller
            .call("op", move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(Error::Timeout("slow".into()))
                }
            })
            .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_paces_every_attempt() {
        let policy = RetryPolicy::default().with_jitter(Duration::ZERO);
        let caller = ResilientCaller::new(policy);
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let start = Instant::now();
        let result = caller
            .call("op", move || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Error::RateLimited("429".into()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        assert!(result.is_ok());
        // pacing, 1s backoff, pacing again
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1700), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(1800), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_transient_linear_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let start = Instant::now();
        let result: Result<()> = retry_transient("append", 2, Duration::from_secs(3), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(Error::Timeout("slow".into()))
            }
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(9), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(10), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_retry_transient_skips_permanent() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<()> = retry_transient("append", 2, Duration::ZERO, move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(permanent("validation"))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
