//! Waiting for the host to come back after a reload

use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::store::{ActionRequest, Host};
use crate::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub deadline: Duration,
    /// First retry delay; each retry waits one more second up to `max_interval`
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(90),
            min_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(5),
        }
    }
}

impl ReadinessPolicy {
    fn next_interval(&self, current: Duration) -> Duration {
        (current + Duration::from_secs(1)).min(self.max_interval)
    }
}

/// Ping the host until it answers; returns the number of attempts made
pub async fn wait_for_ready(host: &dyn Host, policy: ReadinessPolicy) -> Result<u32> {
    let started = Instant::now();
    let mut interval = policy.min_interval;
    let mut attempts = 0;

    loop {
        attempts += 1;
        match host.ping().await {
            Ok(()) => {
                tracing::debug!(attempts, "host ready");
                return Ok(attempts);
            }
            Err(e) => {
                let elapsed = started.elapsed();
                if elapsed + interval > policy.deadline {
                    tracing::warn!(attempts, error = %e, "host not ready, giving up");
                    return Err(CoreError::NotReady(policy.deadline.as_secs()));
                }
                tracing::debug!(attempts, error = %e, retry_in = ?interval, "host not ready");
                sleep(interval).await;
                interval = policy.next_interval(interval);
            }
        }
    }
}

/// Ask the host to reload its configuration and wait for it to return
pub async fn request_reload(host: &dyn Host, policy: ReadinessPolicy) -> Result<()> {
    wait_for_ready(host, policy).await?;
    host.invoke_action(&ActionRequest::reload()).await?;
    tracing::info!("reload requested");
    wait_for_ready(host, policy).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn quick() -> ReadinessPolicy {
        ReadinessPolicy {
            deadline: Duration::from_millis(500),
            min_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_interval_grows_to_cap() {
        let policy = ReadinessPolicy::default();
        let mut interval = policy.min_interval;
        let mut seen = vec![interval.as_secs()];
        for _ in 0..5 {
            interval = policy.next_interval(interval);
            seen.push(interval.as_secs());
        }
        assert_eq!(seen, vec![2, 3, 4, 5, 5, 5]);
    }

    #[tokio::test]
    async fn test_ready_after_retries() {
        let store = MemoryStore::new();
        store.fail_pings(2);
        assert_eq!(wait_for_ready(&store, quick()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_at_deadline() {
        let store = MemoryStore::new();
        store.fail_pings(u32::MAX);
        let err = wait_for_ready(&store, quick()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_request_reload_invokes_action() {
        let store = MemoryStore::new();
        request_reload(&store, quick()).await.unwrap();
        assert_eq!(store.actions().await, vec![ActionRequest::reload()]);
    }
}
