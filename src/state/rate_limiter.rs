use std::time::{Duration, Instant};

/// Minimum-interval pacing for a single domain
///
/// Immutable: `record_access` returns a new state with the domain and
/// interval unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterState {
    domain: String,
    interval: Duration,
    last_access: Option<Instant>,
}

impl RateLimiterState {
    /// Creates a state allowing `requests_per_minute` accesses per minute
    ///
    /// A value of zero is treated as one request per minute.
    pub fn new(domain: impl Into<String>, requests_per_minute: u32) -> Self {
        let per_minute = requests_per_minute.max(1);
        Self::with_interval(domain, Duration::from_secs(60) / per_minute)
    }

    /// Creates a state with an explicit minimum interval
    pub fn with_interval(domain: impl Into<String>, interval: Duration) -> Self {
        Self {
            domain: domain.into(),
            interval,
            last_access: None,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_access(&self) -> Option<Instant> {
        self.last_access
    }

    /// True if at least `interval` has passed since the last recorded access
    pub fn can_proceed(&self) -> bool {
        self.can_proceed_at(Instant::now())
    }

    pub fn can_proceed_at(&self, now: Instant) -> bool {
        self.time_until_ready(now).is_none()
    }

    /// Returns a copy of this state with the access time set to now
    #[must_use]
    pub fn record_access(&self) -> Self {
        self.record_access_at(Instant::now())
    }

    #[must_use]
    pub fn record_access_at(&self, now: Instant) -> Self {
        Self {
            domain: self.domain.clone(),
            interval: self.interval,
            last_access: Some(now),
        }
    }

    /// Returns a copy whose interval is at least `minimum`
    ///
    /// Used to honor a robots.txt `Crawl-delay` longer than the configured pace.
    #[must_use]
    pub fn with_min_interval(&self, minimum: Duration) -> Self {
        Self {
            domain: self.domain.clone(),
            interval: self.interval.max(minimum),
            last_access: self.last_access,
        }
    }

    /// Time left before the next access is permitted, or None if it is permitted now
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        let last = self.last_access?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.interval {
            Some(self.interval - elapsed)
        } else {
            None
        }
    }
}
