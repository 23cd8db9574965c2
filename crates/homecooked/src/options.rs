//! Argument groups shared by several tools

use crate::cache::JsonCache;
use crate::prelude::*;
use homecooked_core::dates::DateRange;
use homecooked_core::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Inclusive `--since` / `--until` range.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DateRangeArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<String>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub until: Option<String>,
}

impl DateRangeArgs {
    /// Validate before any network call; inverted ranges are rejected.
    pub fn parse(&self) -> Result<DateRange> {
        Ok(DateRange::parse(self.since.as_deref(), self.until.as_deref())?)
    }
}

/// Backoff settings for remote calls.
#[derive(Debug, Clone, clap::Args)]
pub struct RetryArgs {
    /// Retries after the first attempt on rate limits and 503s
    #[arg(long, env = "HOMECOOKED_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub retry_base_ms: u64,

    /// Backoff ceiling in milliseconds
    #[arg(long, default_value_t = 60_000)]
    pub retry_max_ms: u64,
}

impl Default for RetryArgs {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_ms: 1000,
            retry_max_ms: 60_000,
        }
    }
}

impl RetryArgs {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_ms),
            max_delay: Duration::from_millis(self.retry_max_ms.max(self.retry_base_ms)),
            ..RetryPolicy::default()
        }
    }
}

/// On-disk cache location.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CacheArgs {
    /// Cache directory (defaults to ~/.cache/homecooked/<tool>)
    #[arg(long, env = "HOMECOOKED_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Do not read or write the cache
    #[arg(long)]
    pub no_cache: bool,
}

impl CacheArgs {
    pub fn open(&self, tool: &str) -> Result<Option<JsonCache>> {
        if self.no_cache {
            return Ok(None);
        }
        JsonCache::for_tool(self.cache_dir.clone(), tool).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_rejects_inverted() {
        let args = DateRangeArgs {
            since: Some("2024-03-01".to_string()),
            until: Some("2024-02-01".to_string()),
        };
        let err = args.parse().unwrap_err();
        assert!(err.to_string().contains("before start"));
    }

    #[test]
    fn test_date_range_rejects_bad_literal() {
        let args = DateRangeArgs {
            since: Some("01/02/2024".to_string()),
            until: None,
        };
        assert!(args.parse().is_err());
    }

    #[test]
    fn test_retry_policy() {
        let args = RetryArgs {
            max_retries: 5,
            retry_base_ms: 200,
            retry_max_ms: 100,
        };
        let policy = args.policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_millis(200));
        assert_eq!(policy.jitter, (0.5, 1.5));
    }

    #[test]
    fn test_cache_disabled() {
        let args = CacheArgs {
            cache_dir: None,
            no_cache: true,
        };
        assert!(args.open("zendesk").unwrap().is_none());
    }
}
