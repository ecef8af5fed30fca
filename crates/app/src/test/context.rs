//! Test context for service-level tests.

use std::{sync::Arc, time::Duration};

use tempfile::TempDir;

use crate::{
    auth::{Identity, UserUuid},
    domain::{
        carts::{CartManager, LocalCartStore, MemoryCartsBackend},
        products::{CachedProductsService, FixtureProductsRepository, ProductCache},
    },
    storage::FileStore,
};

/// An anonymous session over the in-memory cart backend and the fixture
/// catalog, mirroring carts into a temporary directory. Adds are not
/// debounced.
pub(crate) struct TestContext {
    pub backend: Arc<MemoryCartsBackend>,
    pub products: Arc<CachedProductsService>,
    pub store: LocalCartStore,
    pub carts: CartManager,
    pub user: UserUuid,
    _dir: TempDir,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repository =
            FixtureProductsRepository::from_set("groceries").expect("Failed to load fixtures");

        let backend = Arc::new(MemoryCartsBackend::new());
        let products = Arc::new(CachedProductsService::new(
            Arc::new(repository),
            ProductCache::default(),
        ));
        let store = LocalCartStore::new(Arc::new(FileStore::new(dir.path())));

        let identity = Identity::anonymous();
        let user = identity.user_uuid();

        let carts = CartManager::new(identity, None, backend.clone(), products.clone())
            .with_store(store.clone())
            .with_add_debounce(Duration::ZERO);

        Self {
            backend,
            products,
            store,
            carts,
            user,
            _dir: dir,
        }
    }
}
