//! App Context

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    auth::{
        AuthService, Identity, IdentityResolver, OfflineAuthService, RestAuthService,
        SessionIdentityResolver, SessionStorage,
    },
    config::AppConfig,
    domain::{
        carts::{
            CartManager, CartsBackend, CartsService, LocalCartStore, MemoryCartsBackend,
            RestCartsBackend,
        },
        products::{
            CachedProductsService, FixtureProductsRepository, ProductsRepository, ProductsService,
            ProductsServiceError, RestProductsRepository,
        },
    },
    recognition::{CandidateLimits, Recognizer, VisionFallback},
    rest::RestClient,
    storage::{FileStore, KeyValueStore},
    vision::{HttpVisionClient, VisionClient},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load the bundled catalog")]
    Catalog(#[source] ProductsServiceError),
}

/// Services for one run of the app, bound to the identity resolved at startup.
#[derive(Clone)]
pub struct AppContext {
    pub identity: Identity,
    pub auth: Arc<dyn AuthService>,
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub vision: Arc<dyn VisionClient>,
    limits: CandidateLimits,
    fallback: VisionFallback,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// Without a configured backend the app runs offline: no sign in, the
    /// bundled catalog, and carts kept only on this device.
    ///
    /// # Errors
    ///
    /// Returns an error when the bundled catalog cannot be loaded.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let retry = config.retry.policy();

        let general: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage.data_dir));
        let secure: Arc<dyn KeyValueStore> =
            Arc::new(FileStore::private(config.storage.secure_dir()));

        let rest = config
            .backend
            .rest_config()
            .map(|rest| RestClient::new(rest, retry));

        let auth: Arc<dyn AuthService> = match &rest {
            Some(rest) => Arc::new(RestAuthService::new(
                rest.clone(),
                SessionStorage::new(secure, general.clone()),
            )),
            None => {
                info!("no backend configured, running offline");

                Arc::new(OfflineAuthService)
            }
        };

        let identity = SessionIdentityResolver::new(auth.clone()).resolve().await;

        // Requests run as the signed-in user when there is one.
        let rest = rest.map(|rest| match identity.access_token() {
            Some(token) => rest.with_access_token(token.clone()),
            None => rest,
        });

        let repository: Arc<dyn ProductsRepository> = match &rest {
            Some(rest) => Arc::new(RestProductsRepository::new(rest.clone())),
            None => Arc::new(
                FixtureProductsRepository::from_set(&config.cart.fixture_set)
                    .map_err(AppInitError::Catalog)?,
            ),
        };

        let products: Arc<dyn ProductsService> = Arc::new(CachedProductsService::new(
            repository,
            config.cart.product_cache(),
        ));

        let store = LocalCartStore::new(general);

        let remote: Option<Arc<dyn CartsBackend>> = rest
            .as_ref()
            .filter(|rest| rest.is_authenticated())
            .map(|rest| Arc::new(RestCartsBackend::new(rest.clone())) as Arc<dyn CartsBackend>);

        let local = local_backend(&store, &identity);

        let carts = CartManager::new(identity.clone(), remote, local, products.clone())
            .with_store(store)
            .with_add_debounce(config.cart.add_debounce());

        let vision: Arc<dyn VisionClient> = Arc::new(HttpVisionClient::new(
            config.vision.vision_endpoint.clone(),
            config.vision.api_key(),
            config.vision.detection_limits(),
            retry,
        ));

        Ok(Self {
            identity,
            auth,
            products,
            carts: Arc::new(carts),
            vision,
            limits: config.vision.candidate_limits(),
            fallback: config.vision.vision_fallback.into(),
        })
    }

    /// A recognizer over the configured vision client.
    #[must_use]
    pub fn recognizer(&self) -> Recognizer {
        self.recognizer_with(self.vision.clone())
    }

    /// A recognizer over another vision client, e.g. the fixed sample.
    #[must_use]
    pub fn recognizer_with(&self, vision: Arc<dyn VisionClient>) -> Recognizer {
        Recognizer::new(vision, self.products.clone())
            .with_limits(self.limits)
            .with_fallback(self.fallback)
    }
}

/// The in-process backend, seeded with the cart left on this device so an
/// offline session picks up where the last one stopped.
fn local_backend(store: &LocalCartStore, identity: &Identity) -> Arc<dyn CartsBackend> {
    match store.load(identity.user_uuid()) {
        Ok(Some(stored)) => Arc::new(MemoryCartsBackend::from_snapshot(stored.into_snapshot())),
        Ok(None) => Arc::new(MemoryCartsBackend::new()),
        Err(error) => {
            warn!("ignoring unreadable local cart: {error}");

            Arc::new(MemoryCartsBackend::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;
    use crate::{domain::carts::CartMode, recognition::RecognizedItem, vision::SampleVisionClient};

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        config: AppConfig,
    }

    fn offline_config(dir: &std::path::Path) -> TestResult<AppConfig> {
        let data_dir = dir.to_str().ok_or("utf-8 temp dir")?;

        let harness = Harness::try_parse_from([
            "scancart",
            "--backend-url",
            "",
            "--anon-key",
            "",
            "--data-dir",
            data_dir,
            "--add-debounce-ms",
            "0",
        ])?;

        Ok(harness.config)
    }

    #[tokio::test]
    async fn offline_context_uses_fixture_catalog_and_local_carts() -> TestResult {
        let dir = tempfile::tempdir()?;
        let context = AppContext::from_config(&offline_config(dir.path())?).await?;

        assert!(!context.identity.is_authenticated());
        assert_eq!(context.carts.mode().await, CartMode::Local);

        let banana = context
            .products
            .search_products("banana")
            .await?
            .into_iter()
            .next()
            .ok_or("fixture catalog has a banana")?;

        let cart = context.carts.add_item(banana, 2).await?;

        assert_eq!(cart.item_count(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn offline_cart_survives_a_restart() -> TestResult {
        let dir = tempfile::tempdir()?;

        {
            let context = AppContext::from_config(&offline_config(dir.path())?).await?;
            let apple = context
                .products
                .search_products("granny")
                .await?
                .into_iter()
                .next()
                .ok_or("fixture catalog has a granny smith")?;

            context.carts.add_item(apple, 1).await?;
        }

        let context = AppContext::from_config(&offline_config(dir.path())?).await?;
        let cart = context.carts.get_active_cart().await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].display_name(), "Granny Smith Apple");

        Ok(())
    }

    #[tokio::test]
    async fn sample_recognizer_matches_the_fixture_catalog() -> TestResult {
        let dir = tempfile::tempdir()?;
        let context = AppContext::from_config(&offline_config(dir.path())?).await?;

        let recognition = context
            .recognizer_with(Arc::new(SampleVisionClient))
            .recognize("")
            .await?;

        assert!(matches!(recognition.item(), RecognizedItem::Matched(_)));
        assert_eq!(recognition.item().display_name(), "Banana");

        Ok(())
    }
}
