//! Product cache.

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::domain::products::{Product, ProductUuid};

/// Products kept by default.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// How long a cached product or catalog snapshot stays fresh by default.
pub const DEFAULT_CACHE_TTL: SignedDuration = SignedDuration::from_mins(5);

#[derive(Debug, Clone)]
struct Entry {
    product: Product,
    stored_at: Timestamp,
}

/// Products by id plus the last full catalog snapshot, each with a
/// time-to-live. Callers pass `now` so expiry is deterministic under test.
#[derive(Debug, Clone)]
pub struct ProductCache {
    entries: FxHashMap<ProductUuid, Entry>,
    snapshot: Option<(Vec<Product>, Timestamp)>,
    capacity: usize,
    ttl: SignedDuration,
}

impl Default for ProductCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}

impl ProductCache {
    #[must_use]
    pub fn new(capacity: usize, ttl: SignedDuration) -> Self {
        Self {
            entries: FxHashMap::default(),
            snapshot: None,
            capacity,
            ttl,
        }
    }

    fn is_fresh(&self, stored_at: Timestamp, now: Timestamp) -> bool {
        now.duration_since(stored_at) < self.ttl
    }

    /// A product cached by id or found in the snapshot, if still fresh.
    #[must_use]
    pub fn get(&self, uuid: ProductUuid, now: Timestamp) -> Option<&Product> {
        if let Some(entry) = self.entries.get(&uuid)
            && self.is_fresh(entry.stored_at, now)
        {
            return Some(&entry.product);
        }

        self.snapshot(now)
            .and_then(|products| products.iter().find(|product| product.uuid == uuid))
    }

    /// A product cached by id or found in the snapshot, however old.
    ///
    /// For showing something while the backend is unreachable; fetches
    /// should go through [`ProductCache::get`].
    #[must_use]
    pub fn get_stale(&self, uuid: ProductUuid) -> Option<&Product> {
        if let Some(entry) = self.entries.get(&uuid) {
            return Some(&entry.product);
        }

        self.snapshot
            .as_ref()
            .and_then(|(products, _)| products.iter().find(|product| product.uuid == uuid))
    }

    /// Remember a product. At capacity the oldest entry makes room.
    pub fn insert(&mut self, product: Product, now: Timestamp) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(&product.uuid) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(uuid, _)| *uuid);

            if let Some(oldest) = oldest {
                trace!(product = %oldest, "evicting cached product");

                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(
            product.uuid,
            Entry {
                product,
                stored_at: now,
            },
        );
    }

    /// The full catalog, if loaded within the TTL.
    #[must_use]
    pub fn snapshot(&self, now: Timestamp) -> Option<&[Product]> {
        self.snapshot
            .as_ref()
            .filter(|(_, stored_at)| self.is_fresh(*stored_at, now))
            .map(|(products, _)| products.as_slice())
    }

    pub fn set_snapshot(&mut self, products: Vec<Product>, now: Timestamp) {
        self.snapshot = Some((products, now));
    }

    /// Drop one product, including the snapshot that may contain it.
    pub fn invalidate(&mut self, uuid: ProductUuid) {
        self.entries.remove(&uuid);

        if self
            .snapshot
            .as_ref()
            .is_some_and(|(products, _)| products.iter().any(|product| product.uuid == uuid))
        {
            self.snapshot = None;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.snapshot = None;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
