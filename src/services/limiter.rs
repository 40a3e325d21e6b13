//! Failed-login tracking with temporary per-address lockout.
//!
//! Every address moves through `Clean -> Warning(n) -> LockedOut(until)`.
//! Failures are counted in a fixed window anchored at the first failure;
//! once the configured threshold is reached within that window the address
//! is rejected outright until the lockout expires. A successful login or
//! window expiry returns the address to `Clean`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::AuthThrottleConfig;

/// Outcome of asking whether an address may attempt a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptPermission {
    Allowed,
    /// Rejected; `retry_after` is the remaining lockout.
    LockedOut { retry_after: Duration },
}

/// Boundary for failure tracking. The in-process map below serves
/// single-instance deployments; a shared store can implement the same
/// trait for multi-instance setups without touching callers.
#[async_trait]
pub trait AttemptLimiter: Send + Sync {
    async fn check_allowed(&self, addr: IpAddr) -> AttemptPermission;

    async fn record_failure(&self, addr: IpAddr);

    async fn record_success(&self, addr: IpAddr);
}

#[derive(Debug, Clone)]
struct AttemptEntry {
    failures: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

pub struct InMemoryAttemptLimiter {
    config: AuthThrottleConfig,
    // Single lock over the whole map: login traffic is rare enough that
    // contention is irrelevant, and it makes the increment atomic so two
    // concurrent failures can never collapse into one.
    entries: Mutex<HashMap<IpAddr, AttemptEntry>>,
}

impl InMemoryAttemptLimiter {
    #[must_use]
    pub fn new(config: AuthThrottleConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    fn lockout(&self) -> Duration {
        Duration::from_secs(self.config.lockout_seconds)
    }
}

#[async_trait]
impl AttemptLimiter for InMemoryAttemptLimiter {
    async fn check_allowed(&self, addr: IpAddr) -> AttemptPermission {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(entry) = entries.get(&addr) else {
            return AttemptPermission::Allowed;
        };

        if let Some(until) = entry.locked_until {
            if now < until {
                return AttemptPermission::LockedOut {
                    retry_after: until - now,
                };
            }
            // Lockout served; back to Clean.
            entries.remove(&addr);
            return AttemptPermission::Allowed;
        }

        if now.duration_since(entry.window_start) > self.window() {
            entries.remove(&addr);
        }

        AttemptPermission::Allowed
    }

    async fn record_failure(&self, addr: IpAddr) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(addr).or_insert_with(|| AttemptEntry {
            failures: 0,
            window_start: now,
            locked_until: None,
        });

        // Stale window: this failure starts a fresh count.
        if entry.locked_until.is_none() && now.duration_since(entry.window_start) > self.window() {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;

        debug!(
            %addr,
            failures = entry.failures,
            max_attempts = self.config.max_attempts,
            "Recorded failed login attempt"
        );

        if entry.failures >= self.config.max_attempts {
            entry.locked_until = Some(now + self.lockout());
            warn!(
                %addr,
                lockout_seconds = self.config.lockout_seconds,
                "Address locked out after repeated login failures"
            );
        }
    }

    async fn record_success(&self, addr: IpAddr) {
        let mut entries = self.entries.lock().await;
        if entries.remove(&addr).is_some() {
            debug!(%addr, "Cleared login failure history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_config() -> AuthThrottleConfig {
        AuthThrottleConfig {
            max_attempts: 5,
            window_seconds: 900,
            lockout_seconds: 900,
            trusted_proxy_ips: Vec::new(),
        }
    }

    fn addr(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[tokio::test]
    async fn locks_after_threshold() {
        let limiter = InMemoryAttemptLimiter::new(test_config());

        for _ in 0..4 {
            limiter.record_failure(addr(1)).await;
            assert_eq!(
                limiter.check_allowed(addr(1)).await,
                AttemptPermission::Allowed
            );
        }

        limiter.record_failure(addr(1)).await;
        match limiter.check_allowed(addr(1)).await {
            AttemptPermission::LockedOut { retry_after } => {
                assert!(retry_after <= Duration::from_secs(900));
                assert!(retry_after > Duration::from_secs(890));
            }
            AttemptPermission::Allowed => panic!("expected lockout after 5 failures"),
        }
    }

    #[tokio::test]
    async fn success_resets_counter() {
        let limiter = InMemoryAttemptLimiter::new(test_config());

        for _ in 0..4 {
            limiter.record_failure(addr(2)).await;
        }
        limiter.record_success(addr(2)).await;

        // Four more failures fit in a fresh window without locking.
        for _ in 0..4 {
            limiter.record_failure(addr(2)).await;
        }
        assert_eq!(
            limiter.check_allowed(addr(2)).await,
            AttemptPermission::Allowed
        );
    }

    #[tokio::test]
    async fn addresses_are_independent() {
        let limiter = InMemoryAttemptLimiter::new(test_config());

        for _ in 0..5 {
            limiter.record_failure(addr(3)).await;
        }

        assert!(matches!(
            limiter.check_allowed(addr(3)).await,
            AttemptPermission::LockedOut { .. }
        ));
        assert_eq!(
            limiter.check_allowed(addr(4)).await,
            AttemptPermission::Allowed
        );
    }

    #[tokio::test]
    async fn expired_lockout_allows_again() {
        let config = AuthThrottleConfig {
            max_attempts: 2,
            window_seconds: 1,
            lockout_seconds: 0,
            trusted_proxy_ips: Vec::new(),
        };
        let limiter = InMemoryAttemptLimiter::new(config);

        limiter.record_failure(addr(5)).await;
        limiter.record_failure(addr(5)).await;

        // Zero-length lockout expires immediately.
        assert_eq!(
            limiter.check_allowed(addr(5)).await,
            AttemptPermission::Allowed
        );
    }

    #[tokio::test]
    async fn concurrent_failures_all_count() {
        let limiter = Arc::new(InMemoryAttemptLimiter::new(test_config()));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.record_failure(addr(6)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Exactly 5 failures recorded -> locked.
        assert!(matches!(
            limiter.check_allowed(addr(6)).await,
            AttemptPermission::LockedOut { .. }
        ));
    }
}
