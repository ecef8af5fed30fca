//! Cart & Catalog Config

use std::time::Duration;

use clap::Args;
use jiff::SignedDuration;

use crate::domain::products::ProductCache;

/// Cart and catalog cache settings.
#[derive(Debug, Args)]
pub struct CartConfig {
    /// Minimum milliseconds between two adds of the same product
    #[arg(long, env = "CART_ADD_DEBOUNCE_MS", default_value_t = 500_u64)]
    pub add_debounce_ms: u64,

    /// Seconds a cached product stays fresh
    #[arg(long, env = "PRODUCT_CACHE_TTL_SECONDS", default_value_t = 300_u64)]
    pub product_cache_ttl_seconds: u64,

    /// Most products held in the cache
    #[arg(long, env = "PRODUCT_CACHE_CAPACITY", default_value_t = 512_usize)]
    pub product_cache_capacity: usize,

    /// Bundled catalog used when no backend is configured
    #[arg(long, env = "CATALOG_FIXTURE_SET", default_value = "groceries")]
    pub fixture_set: String,
}

impl CartConfig {
    #[must_use]
    pub fn add_debounce(&self) -> Duration {
        Duration::from_millis(self.add_debounce_ms)
    }

    #[must_use]
    pub fn product_cache(&self) -> ProductCache {
        let ttl = i64::try_from(self.product_cache_ttl_seconds).unwrap_or(i64::MAX);

        ProductCache::new(self.product_cache_capacity, SignedDuration::from_secs(ttl))
    }
}
