//! Retry Config

use std::time::Duration;

use clap::Args;

use crate::retry::RetryPolicy;

/// Retry settings for backend and vision requests.
#[derive(Debug, Args)]
pub struct RetryConfig {
    /// Attempts per request, including the first
    #[arg(long, env = "RETRY_MAX_ATTEMPTS", default_value_t = 3_u32)]
    pub retry_max_attempts: u32,

    /// Backoff base in milliseconds
    #[arg(long, env = "RETRY_BASE_DELAY_MS", default_value_t = 200_u64)]
    pub retry_base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    #[arg(long, env = "RETRY_MAX_DELAY_MS", default_value_t = 2_000_u64)]
    pub retry_max_delay_ms: u64,
}

impl RetryConfig {
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}
