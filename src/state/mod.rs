//! State module for per-domain access pacing
//!
//! The only state kept across requests is rate-limiter state, and it is a
//! plain value: checks are pure and recording an access yields a new value.
//! Whoever stores the values (see `extractor::AccessGate`) guards concurrent access.

mod rate_limiter;

pub use rate_limiter::RateLimiterState;
