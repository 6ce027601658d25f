//! Wait-for-readiness poller (exponential backoff)
//!
//! Polls a readiness check until it reports the desired state or the
//! deadline derived from the caller's operation timeout passes. Only the
//! readiness condition is retried: an error returned by the check is
//! surfaced immediately.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Backoff settings for readiness polling
#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    /// Delay before the second check (milliseconds)
    pub initial_delay_ms: u64,
    /// Upper bound for a single delay (milliseconds)
    pub max_delay_ms: u64,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 15000,
            multiplier: 2.0,
        }
    }
}

impl WaitConfig {
    /// Fixed-interval polling
    pub fn fixed(interval: Duration) -> Self {
        let ms = interval.as_millis() as u64;
        Self {
            initial_delay_ms: ms,
            max_delay_ms: ms,
            multiplier: 1.0,
        }
    }

    /// Delay to sleep after the given (zero-based) attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        (delay as u64).min(self.max_delay_ms)
    }
}

/// Poll `check` until it yields a value or `timeout` elapses.
///
/// `check` returns `Ok(Some(value))` once ready, `Ok(None)` while not ready
/// yet. `what` names the resource and dependency in the timeout error.
pub async fn wait_until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    config: &WaitConfig,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    // A timeout too large to add to the clock never expires
    let deadline = Instant::now().checked_add(timeout);
    let mut attempt = 0u32;

    loop {
        if let Some(value) = check().await? {
            tracing::debug!("{} after {} attempt(s)", what, attempt + 1);
            return Ok(value);
        }

        let now = Instant::now();
        let remaining = match deadline {
            Some(deadline) if now >= deadline => {
                return Err(CloudError::Timeout(format!(
                    "{} (gave up after {}s)",
                    what,
                    timeout.as_secs()
                )));
            }
            Some(deadline) => deadline - now,
            None => Duration::MAX,
        };

        let delay = Duration::from_millis(config.delay_for_attempt(attempt)).min(remaining);
        tracing::debug!("Still waiting: {} (retry in {:?})", what, delay);
        sleep(delay).await;
        attempt = attempt.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_calculation() {
        let config = WaitConfig {
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(0), 1000);
        assert_eq!(config.delay_for_attempt(1), 2000);
        assert_eq!(config.delay_for_attempt(2), 4000);
        assert_eq!(config.delay_for_attempt(3), 8000);
        assert_eq!(config.delay_for_attempt(4), 10000); // capped at max
    }

    #[test]
    fn test_fixed_interval() {
        let config = WaitConfig::fixed(Duration::from_secs(3));
        assert_eq!(config.delay_for_attempt(0), 3000);
        assert_eq!(config.delay_for_attempt(7), 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready() {
        let calls = AtomicU32::new(0);
        let value = wait_until(
            "disk 100 to become ready",
            Duration::from_secs(60),
            &WaitConfig::default(),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, CloudError>(if n >= 2 { Some(n) } else { None }) }
            },
        )
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_unbounded_timeout() {
        let calls = AtomicU32::new(0);
        let value = wait_until(
            "image private/1 to become available",
            Duration::from_secs(u64::MAX),
            &WaitConfig::default(),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, CloudError>(if n >= 3 { Some(n) } else { None }) }
            },
        )
        .await
        .unwrap();

        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_timeout() {
        let start = Instant::now();
        let result: Result<()> = wait_until(
            "disk 100 on instance 200 to become ready",
            Duration::from_secs(30),
            &WaitConfig::default(),
            || async { Ok::<Option<()>, CloudError>(None) },
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, CloudError::Timeout(_)));
        assert!(err.to_string().contains("disk 100 on instance 200"));
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_surfaces_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = wait_until(
            "volume 1 to become active",
            Duration::from_secs(60),
            &WaitConfig::default(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<Option<()>, _>(CloudError::ApiError(
                        "500 Internal Server Error".to_string(),
                    ))
                }
            },
        )
        .await;

        tokio_test::assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
