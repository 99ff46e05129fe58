//! Capacity and pacing controls at the orchestration boundary
//!
//! The gate owns one [`RateLimiterState`] per domain and replaces it whole
//! under a lock on every access. It also bounds how many browsers run at once.

use crate::config::{BrowserConfig, RateLimitConfig};
use crate::state::RateLimiterState;
use crate::DistillError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Per-domain states plus how long an idle state must be kept
#[derive(Debug, Default)]
struct DomainSlots {
    states: HashMap<String, RateLimiterState>,
    /// Longest crawl delay seen so far
    retention: Duration,
}

impl DomainSlots {
    /// Drops states that no request could still be made to wait on
    ///
    /// A dropped state is indistinguishable from a fresh one.
    fn prune(&mut self, now: Instant) {
        let retention = self.retention;
        self.states.retain(|_, state| {
            state
                .with_min_interval(retention)
                .time_until_ready(now)
                .is_some()
        });
    }
}

pub struct AccessGate {
    domains: Mutex<DomainSlots>,
    requests_per_minute: u32,
    max_wait: Duration,
    browsers: Arc<Semaphore>,
}

impl AccessGate {
    pub fn new(rate_limit: &RateLimitConfig, browser: &BrowserConfig) -> Self {
        Self {
            domains: Mutex::new(DomainSlots::default()),
            requests_per_minute: rate_limit.requests_per_minute,
            max_wait: Duration::from_secs(rate_limit.max_wait_secs),
            browsers: Arc::new(Semaphore::new(browser.max_concurrent as usize)),
        }
    }

    /// Waits until `domain` may be accessed and records the access
    ///
    /// The slot is claimed while the lock is held, so concurrent requests to
    /// one domain are spaced by the interval. `min_interval` (a crawl delay)
    /// slows only this request; the stored state keeps the configured pace.
    /// Fails with `RateLimited` instead of waiting longer than the configured
    /// maximum in total.
    pub async fn wait_for_domain(
        &self,
        domain: &str,
        min_interval: Option<Duration>,
    ) -> Result<(), DistillError> {
        let mut waited = Duration::ZERO;

        loop {
            let wait = {
                let mut slots = self.domains.lock().await;
                let now = Instant::now();
                if let Some(minimum) = min_interval {
                    slots.retention = slots.retention.max(minimum);
                }
                slots.prune(now);

                let state = slots
                    .states
                    .get(domain)
                    .cloned()
                    .unwrap_or_else(|| RateLimiterState::new(domain, self.requests_per_minute));
                let pacing = match min_interval {
                    Some(minimum) => state.with_min_interval(minimum),
                    None => state.clone(),
                };

                match pacing.time_until_ready(now) {
                    None => {
                        slots
                            .states
                            .insert(domain.to_string(), state.record_access_at(now));
                        return Ok(());
                    }
                    Some(wait) => wait,
                }
            };

            if waited + wait > self.max_wait {
                tracing::warn!(
                    "Rate limit for {} requires waiting {:?}, over the {:?} maximum",
                    domain,
                    waited + wait,
                    self.max_wait
                );
                return Err(DistillError::RateLimited {
                    domain: domain.to_string(),
                    wait: waited + wait,
                });
            }

            tracing::debug!("Rate limiting {}: waiting {:?}", domain, wait);
            tokio::time::sleep(wait).await;
            waited += wait;
        }
    }

    /// Number of domains with pacing state still held
    pub async fn tracked_domains(&self) -> usize {
        self.domains.lock().await.states.len()
    }

    /// Reserves one of the browser slots; the slot frees when the permit drops
    pub async fn acquire_browser(&self) -> Result<OwnedSemaphorePermit, DistillError> {
        self.browsers
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DistillError::Internal(format!("browser pool closed: {}", e)))
    }

    /// Number of browser slots currently free
    pub fn available_browsers(&self) -> usize {
        self.browsers.available_permits()
    }
}
