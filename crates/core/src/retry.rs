//! Retry policy arithmetic and transient-error classification
//!
//! The shell owns the sleeping; this module only decides how long to wait and
//! whether an error is worth waiting for.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Retry configuration for a single remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts never exceed `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Inclusive lower and exclusive upper bound of the jitter multiplier.
    pub jitter: (f64, f64),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(60_000),
            jitter: (0.5, 1.5),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without ever sleeping.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: (1.0, 1.0),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Unjittered, uncapped-by-history delay for a 0-based retry attempt.
    pub fn raw_delay(&self, attempt: u32, jitter: f64) -> Duration {
        let factor = 2f64.powi(attempt.min(31) as i32) * jitter.max(0.0);
        let millis = self.base_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Clamp a sampled jitter value into the configured band.
    pub fn clamp_jitter(&self, jitter: f64) -> f64 {
        let (lo, hi) = self.jitter;
        jitter.clamp(lo.min(hi), lo.max(hi))
    }
}

/// Per-call retry bookkeeping. Created when the call starts, dropped on
/// success or final failure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RetryState {
    /// Retries performed so far.
    pub attempt: u32,
    /// Delay slept before the latest retry.
    pub delay: Duration,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether another retry is allowed under `policy`.
    pub fn can_retry(&self, policy: &RetryPolicy) -> bool {
        self.attempt < policy.max_retries
    }

    /// Advance to the next retry and return how long to wait before it.
    ///
    /// Delays never decrease between retries and never exceed the ceiling.
    pub fn advance(&mut self, policy: &RetryPolicy, jitter: f64) -> Duration {
        let computed = policy.raw_delay(self.attempt, policy.clamp_jitter(jitter));
        self.delay = computed.max(self.delay).min(policy.max_delay);
        self.attempt += 1;
        self.delay
    }
}

/// HTTP statuses treated as transient rate limiting or brief unavailability.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 503)
}

fn rate_limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)rate[\s_-]?limit|too[\s_-]many[\s_-]requests|overloaded|\b429\b")
            .expect("rate limit pattern is valid")
    })
}

/// Whether a provider error message describes rate limiting.
pub fn looks_rate_limited(message: &str) -> bool {
    rate_limit_pattern().is_match(message)
}
