//! Products service.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::debug;

use crate::domain::products::{
    Product, ProductCache, ProductUuid, ProductsRepository, ProductsServiceError,
};

/// Catalog lookups through a [`ProductCache`].
#[derive(Clone)]
pub struct CachedProductsService {
    repository: Arc<dyn ProductsRepository>,
    cache: Arc<Mutex<ProductCache>>,
}

impl CachedProductsService {
    #[must_use]
    pub fn new(repository: Arc<dyn ProductsRepository>, cache: ProductCache) -> Self {
        Self {
            repository,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    fn cache(&self) -> MutexGuard<'_, ProductCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember_all(&self, products: &[Product]) {
        let now = Timestamp::now();
        let mut cache = self.cache();

        for product in products {
            cache.insert(product.clone(), now);
        }
    }
}

fn require(value: &str, field: &'static str) -> Result<String, ProductsServiceError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ProductsServiceError::MissingRequiredData(field));
    }

    Ok(trimmed.to_string())
}

#[async_trait]
impl ProductsService for CachedProductsService {
    #[tracing::instrument(
        name = "products.service.list_products",
        skip(self),
        err
    )]
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError> {
        if let Some(snapshot) = self.cache().snapshot(Timestamp::now()) {
            debug!(products = snapshot.len(), "catalog snapshot cache hit");

            return Ok(snapshot.to_vec());
        }

        let products = self.repository.list_products().await?;

        debug!(products = products.len(), "catalog loaded");

        self.cache().set_snapshot(products.clone(), Timestamp::now());

        Ok(products)
    }

    #[tracing::instrument(
        name = "products.service.get_product",
        skip(self),
        err
    )]
    async fn get_product(&self, uuid: ProductUuid) -> Result<Product, ProductsServiceError> {
        if let Some(product) = self.cache().get(uuid, Timestamp::now()).cloned() {
            return Ok(product);
        }

        let product = self
            .repository
            .get_product(uuid)
            .await?
            .ok_or(ProductsServiceError::NotFound)?;

        self.remember(product.clone());

        Ok(product)
    }

    #[tracing::instrument(
        name = "products.service.find_by_barcode",
        skip(self),
        err
    )]
    async fn find_by_barcode(&self, barcode: &str) -> Result<Product, ProductsServiceError> {
        let barcode = require(barcode, "barcode")?;

        let product = self
            .repository
            .find_by_barcode(&barcode)
            .await?
            .ok_or(ProductsServiceError::NotFound)?;

        self.remember(product.clone());

        Ok(product)
    }

    #[tracing::instrument(
        name = "products.service.search_products",
        skip(self),
        err
    )]
    async fn search_products(&self, term: &str) -> Result<Vec<Product>, ProductsServiceError> {
        let term = require(term, "search term")?;
        let products = self.repository.search_products(&term).await?;

        self.remember_all(&products);

        Ok(products)
    }

    #[tracing::instrument(
        name = "products.service.list_by_category",
        skip(self),
        err
    )]
    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, ProductsServiceError> {
        let category = require(category, "category")?;
        let products = self.repository.list_by_category(&category).await?;

        self.remember_all(&products);

        Ok(products)
    }

    fn cached_product(&self, uuid: ProductUuid) -> Option<Product> {
        self.cache().get_stale(uuid).cloned()
    }

    fn remember(&self, product: Product) {
        self.cache().insert(product, Timestamp::now());
    }

    fn invalidate(&self, uuid: ProductUuid) {
        self.cache().invalidate(uuid);
    }

    fn clear_cache(&self) {
        self.cache().clear();
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// The whole catalog in stable order; what label matching runs against.
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, uuid: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Retrieve the product with the given barcode.
    async fn find_by_barcode(&self, barcode: &str) -> Result<Product, ProductsServiceError>;

    /// Products whose name contains `term`, ignoring case.
    async fn search_products(&self, term: &str) -> Result<Vec<Product>, ProductsServiceError>;

    /// Products in the given category, ignoring case.
    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, ProductsServiceError>;

    /// A product from the cache only, without touching the backend. The copy
    /// may be older than the cache TTL.
    fn cached_product(&self, uuid: ProductUuid) -> Option<Product>;

    /// Add a product obtained elsewhere to the cache.
    fn remember(&self, product: Product);

    fn invalidate(&self, uuid: ProductUuid);

    fn clear_cache(&self);
}
