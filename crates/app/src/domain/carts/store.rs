//! Local cart mirror.
//!
//! The backend owns cart state. The mirror only lets the last known cart be
//! shown while the backend is unreachable, and is replaced by server data on
//! the next successful load.

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    auth::UserUuid,
    domain::carts::models::{Cart, CartItem, CartSnapshot},
    storage::{KeyValueStore, StorageError},
};

/// What is kept on disk for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCart {
    pub cart: Cart,

    pub items: Vec<CartItem>,

    /// When this state last matched the backend; `None` if it never has.
    #[serde(default)]
    pub last_sync: Option<Timestamp>,
}

impl StoredCart {
    #[must_use]
    pub fn into_snapshot(self) -> CartSnapshot {
        CartSnapshot {
            cart: self.cart,
            items: self.items,
            stale: true,
        }
    }
}

#[derive(Clone)]
pub struct LocalCartStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for LocalCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCartStore").finish_non_exhaustive()
    }
}

fn key(user: UserUuid) -> String {
    format!("cart.{user}")
}

impl LocalCartStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Mirror a snapshot. Pass `synced_at` when it came from the backend;
    /// otherwise the previous sync time is kept.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read or written.
    pub fn save(
        &self,
        user: UserUuid,
        snapshot: &CartSnapshot,
        synced_at: Option<Timestamp>,
    ) -> Result<(), StorageError> {
        let last_sync = match synced_at {
            Some(at) => Some(at),
            None => self.load(user)?.and_then(|stored| stored.last_sync),
        };

        let stored = StoredCart {
            cart: snapshot.cart.clone(),
            items: snapshot.items.clone(),
            last_sync,
        };

        self.store.set(&key(user), &serde_json::to_string(&stored)?)
    }

    /// The mirrored cart, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails or holds corrupt data.
    pub fn load(&self, user: UserUuid) -> Result<Option<StoredCart>, StorageError> {
        self.store
            .get(&key(user))?
            .map(|value| serde_json::from_str(&value))
            .transpose()
            .map_err(StorageError::from)
    }

    /// Forget the mirrored cart.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub fn clear(&self, user: UserUuid) -> Result<(), StorageError> {
        self.store.remove(&key(user))
    }
}
