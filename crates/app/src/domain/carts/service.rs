//! Carts service.
//!
//! [`CartManager`] owns the session's cart. Writes are applied optimistically
//! to the in-memory snapshot and the local mirror, sent to the backend, and
//! then replaced by a fresh server read. The server always wins ("last write
//! wins"); concurrent edits from another device are not merged.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    auth::{Identity, UserUuid},
    domain::{
        carts::{
            CartsServiceError,
            backend::CartsBackend,
            models::{
                CartCompletion, CartItem, CartItemUuid, CartSnapshot, CartStatus, CartUuid,
                NewCart, NewCartItem, NewPayment, PaymentStatus, PaymentUuid, Receipt,
            },
            store::LocalCartStore,
            sync::{SyncEvent, SyncState},
        },
        products::{Product, ProductUuid, ProductsService},
    },
};

/// Minimum time between two adds of the same product.
pub const DEFAULT_ADD_DEBOUNCE: Duration = Duration::from_millis(500);

/// Which backend cart operations currently go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMode {
    /// The hosted backend, as the signed-in user.
    Remote,

    /// The in-process backend. Used for anonymous sessions and, after the
    /// backend has denied access, for the rest of the session.
    Local,
}

/// The resolved change a write makes to the cart.
#[derive(Debug, Clone)]
enum CartChange {
    Insert(NewCartItem),
    SetQuantity(CartItemUuid, u32),
    Delete(CartItemUuid),
}

#[derive(Debug)]
struct CartSession {
    mode: CartMode,
    sync: SyncState,
    snapshot: Option<CartSnapshot>,
    recent_adds: FxHashMap<ProductUuid, Instant>,
}

pub struct CartManager {
    identity: Identity,
    remote: Option<Arc<dyn CartsBackend>>,
    local: Arc<dyn CartsBackend>,
    products: Arc<dyn ProductsService>,
    store: Option<LocalCartStore>,
    add_debounce: Duration,
    session: Mutex<CartSession>,
}

impl CartManager {
    /// Build the manager for a session. Authenticated identities use `remote`
    /// when one is given; everything else uses `local`.
    #[must_use]
    pub fn new(
        identity: Identity,
        remote: Option<Arc<dyn CartsBackend>>,
        local: Arc<dyn CartsBackend>,
        products: Arc<dyn ProductsService>,
    ) -> Self {
        let mode = if identity.is_authenticated() && remote.is_some() {
            CartMode::Remote
        } else {
            CartMode::Local
        };

        Self {
            identity,
            remote,
            local,
            products,
            store: None,
            add_debounce: DEFAULT_ADD_DEBOUNCE,
            session: Mutex::new(CartSession {
                mode,
                sync: SyncState::Idle,
                snapshot: None,
                recent_adds: FxHashMap::default(),
            }),
        }
    }

    /// Mirror every known cart state to `store`.
    #[must_use]
    pub fn with_store(mut self, store: LocalCartStore) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_add_debounce(mut self, add_debounce: Duration) -> Self {
        self.add_debounce = add_debounce;
        self
    }

    fn user(&self) -> UserUuid {
        self.identity.user_uuid()
    }

    fn backend(&self, mode: CartMode) -> &Arc<dyn CartsBackend> {
        match (mode, &self.remote) {
            (CartMode::Remote, Some(remote)) => remote,
            _ => &self.local,
        }
    }

    /// Switch to local mode when the remote backend denied access. Returns
    /// whether the failed operation should be retried.
    fn fall_back_on_denial<T>(
        &self,
        session: &mut CartSession,
        result: &Result<T, CartsServiceError>,
    ) -> bool {
        if !matches!(result, Err(CartsServiceError::AccessDenied)) || session.mode != CartMode::Remote
        {
            return false;
        }

        warn!(
            user = %self.user(),
            "backend denied access, using local demo cart for the rest of this session"
        );

        session.mode = CartMode::Local;
        session.sync = SyncState::Idle;
        session.snapshot = None;

        true
    }

    fn mirror(&self, snapshot: &CartSnapshot, synced_at: Option<Timestamp>) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(error) = store.save(self.user(), snapshot, synced_at) {
            warn!("could not mirror cart locally: {error}");
        }
    }

    fn stored_snapshot(&self) -> Option<CartSnapshot> {
        let store = self.store.as_ref()?;

        match store.load(self.user()) {
            Ok(stored) => stored.map(|stored| stored.into_snapshot()),
            Err(error) => {
                warn!("could not read local cart: {error}");

                None
            }
        }
    }

    /// Fill in items whose product the backend join did not return: fetch it by
    /// id, else use a cached copy, else leave it unresolved.
    async fn resolve_products(&self, items: &mut [CartItem]) {
        for item in items.iter_mut().filter(|item| item.product.is_none()) {
            match self.products.get_product(item.product_uuid).await {
                Ok(product) => {
                    debug!(product = %item.product_uuid, "resolved missing product by id");

                    item.product = Some(product);
                }
                Err(error) => {
                    item.product = self.products.cached_product(item.product_uuid);

                    warn!(
                        item = %item.uuid,
                        product = %item.product_uuid,
                        cached = item.product.is_some(),
                        "product missing from cart items: {error}"
                    );
                }
            }
        }
    }

    /// Read the user's active cart from the current backend, creating it when
    /// there is none.
    async fn fetch(&self, mode: CartMode) -> Result<CartSnapshot, CartsServiceError> {
        let backend = self.backend(mode);
        let user = self.user();

        let cart = match backend.find_active_cart(user).await? {
            Some(cart) => cart,
            None => match backend.create_cart(NewCart::active(user)).await {
                Ok(cart) => {
                    info!(cart = %cart.uuid, %user, "created active cart");

                    cart
                }
                Err(CartsServiceError::AlreadyExists) => backend
                    .find_active_cart(user)
                    .await?
                    .ok_or(CartsServiceError::NotFound)?,
                Err(error) => return Err(error),
            },
        };

        let mut items = backend.list_items(cart.uuid).await?;

        self.resolve_products(&mut items).await;

        Ok(CartSnapshot::new(cart, items))
    }

    async fn reload(&self, session: &mut CartSession) -> Result<CartSnapshot, CartsServiceError> {
        let snapshot = self.fetch(session.mode).await?;

        self.mirror(&snapshot, Some(Timestamp::now()));

        session.snapshot = Some(snapshot.clone());

        Ok(snapshot)
    }

    async fn current(&self, session: &mut CartSession) -> Result<CartSnapshot, CartsServiceError> {
        if !session.sync.is_idle() {
            warn!(state = ?session.sync, "previous cart operation did not finish, reloading");

            session.sync = SyncState::Idle;
            session.snapshot = None;
        }

        match &session.snapshot {
            Some(snapshot) => Ok(snapshot.clone()),
            None => self.reload(session).await,
        }
    }

    /// Load for display, falling back to the local mirror when the backend
    /// cannot be reached.
    async fn load(
        &self,
        session: &mut CartSession,
        force: bool,
    ) -> Result<CartSnapshot, CartsServiceError> {
        if force {
            session.snapshot = None;
        }

        match self.current(session).await {
            Err(error) if !matches!(error, CartsServiceError::AccessDenied) => {
                match self.stored_snapshot() {
                    Some(stored) => {
                        warn!("cart load failed, showing last known cart: {error}");

                        Ok(stored)
                    }
                    None => Err(error),
                }
            }
            result => result,
        }
    }

    fn resolve_add(
        snapshot: &CartSnapshot,
        product: &Product,
        quantity: u32,
    ) -> Result<CartChange, CartsServiceError> {
        match snapshot.item_for_product(product.uuid) {
            Some(existing) => existing
                .quantity
                .checked_add(quantity)
                .map(|total| CartChange::SetQuantity(existing.uuid, total))
                .ok_or(CartsServiceError::InvalidQuantity),
            None => Ok(CartChange::Insert(NewCartItem {
                uuid: CartItemUuid::new(),
                cart_uuid: snapshot.cart.uuid,
                product: product.clone(),
                quantity,
            })),
        }
    }

    fn resolve_set_quantity(
        snapshot: &CartSnapshot,
        item: CartItemUuid,
        quantity: i64,
    ) -> Result<CartChange, CartsServiceError> {
        if snapshot.item(item).is_none() {
            return Err(CartsServiceError::ItemNotFound);
        }

        if quantity <= 0 {
            return Ok(CartChange::Delete(item));
        }

        u32::try_from(quantity)
            .map(|quantity| CartChange::SetQuantity(item, quantity))
            .map_err(|_| CartsServiceError::InvalidQuantity)
    }

    fn apply_optimistic(snapshot: &mut CartSnapshot, change: &CartChange) {
        match change {
            CartChange::Insert(item) => snapshot.items.push(CartItem {
                uuid: item.uuid,
                cart_uuid: item.cart_uuid,
                product_uuid: item.product.uuid,
                quantity: item.quantity,
                created_at: None,
                updated_at: None,
                product: Some(item.product.clone()),
            }),
            CartChange::SetQuantity(uuid, quantity) => {
                if let Some(existing) = snapshot.items.iter_mut().find(|i| i.uuid == *uuid) {
                    existing.quantity = *quantity;
                }
            }
            CartChange::Delete(uuid) => snapshot.items.retain(|i| i.uuid != *uuid),
        }
    }

    async fn send(&self, mode: CartMode, change: CartChange) -> Result<(), CartsServiceError> {
        let backend = self.backend(mode);

        match change {
            CartChange::Insert(item) => backend.insert_item(item).await.map(drop),
            CartChange::SetQuantity(uuid, quantity) => backend
                .update_item_quantity(uuid, quantity)
                .await
                .map(drop),
            CartChange::Delete(uuid) => backend.delete_item(uuid).await,
        }
    }

    /// Run one write through the sync state machine.
    async fn write(
        &self,
        session: &mut CartSession,
        resolve: impl Fn(&CartSnapshot) -> Result<CartChange, CartsServiceError>,
    ) -> Result<CartSnapshot, CartsServiceError> {
        let before = self.current(session).await?;
        let change = resolve(&before)?;

        session.sync = session.sync.transition(SyncEvent::Mutate)?;

        let mut optimistic = before.clone();

        Self::apply_optimistic(&mut optimistic, &change);

        self.mirror(&optimistic, None);

        session.snapshot = Some(optimistic.clone());

        debug!(?change, cart = %before.cart.uuid, "sending cart change");

        if let Err(error) = self.send(session.mode, change).await {
            session.sync = session.sync.transition(SyncEvent::Fail)?;
            session.snapshot = Some(before.clone());
            self.mirror(&before, None);

            if !matches!(error, CartsServiceError::AccessDenied)
                && let Err(reload_error) = self.reload(session).await
            {
                warn!("could not reload cart after failed change: {reload_error}");
            }

            return Err(error);
        }

        session.sync = session.sync.transition(SyncEvent::Reconcile)?;

        match self.reload(session).await {
            Ok(server) => {
                session.sync = session.sync.transition(SyncEvent::Settle)?;

                info!(
                    cart = %server.cart.uuid,
                    items = server.items.len(),
                    "cart reconciled with backend"
                );

                Ok(server)
            }
            Err(error) => {
                session.sync = session.sync.transition(SyncEvent::Fail)?;

                warn!("change accepted but cart reload failed: {error}");

                optimistic.stale = true;

                Ok(optimistic)
            }
        }
    }

    async fn complete(
        &self,
        session: &mut CartSession,
        cart: CartUuid,
        payment_method: &str,
    ) -> Result<Receipt, CartsServiceError> {
        session.snapshot = None;

        let snapshot = self.current(session).await?;

        if snapshot.cart.uuid != cart {
            return Err(CartsServiceError::NotFound);
        }

        if snapshot.cart.status != CartStatus::Active {
            return Err(CartsServiceError::NotActive);
        }

        if snapshot.items.is_empty() {
            return Err(CartsServiceError::EmptyCart);
        }

        let backend = self.backend(session.mode);

        session.sync = session.sync.transition(SyncEvent::Mutate)?;

        let result = async {
            let amount = backend.cart_total(cart).await?;

            // The payment exists before the cart completes. Until then the
            // cart stays active.
            let pending = backend
                .insert_payment(NewPayment {
                    uuid: PaymentUuid::new(),
                    cart_uuid: cart,
                    amount,
                    status: PaymentStatus::Pending,
                    payment_method: payment_method.to_string(),
                    transaction_reference: None,
                })
                .await?;

            let completion = CartCompletion {
                payment_method: payment_method.to_string(),
                completed_at: Timestamp::now(),
            };

            let completed = match backend.complete_cart(cart, completion).await {
                Ok(completed) => completed,
                Err(error) => {
                    if let Err(mark) = backend
                        .update_payment_status(pending.uuid, PaymentStatus::Failed)
                        .await
                    {
                        warn!(
                            payment = %pending.uuid,
                            "could not mark payment failed: {mark}"
                        );
                    }

                    return Err(error);
                }
            };

            let payment = match backend
                .update_payment_status(pending.uuid, PaymentStatus::Completed)
                .await
            {
                Ok(payment) => payment,
                Err(error) => {
                    warn!(
                        payment = %pending.uuid,
                        "cart completed but payment left pending: {error}"
                    );

                    pending
                }
            };

            Ok::<_, CartsServiceError>((completed, payment))
        }
        .await;

        let (completed, payment) = match result {
            Ok(done) => done,
            Err(error) => {
                session.sync = session.sync.transition(SyncEvent::Fail)?;
                session.snapshot = None;

                return Err(error);
            }
        };

        session.sync = session
            .sync
            .transition(SyncEvent::Reconcile)?
            .transition(SyncEvent::Settle)?;
        session.snapshot = None;

        if let Some(store) = &self.store
            && let Err(error) = store.clear(self.user())
        {
            warn!("could not clear local cart after checkout: {error}");
        }

        info!(
            %cart,
            amount = %payment.amount,
            method = payment_method,
            "checked out"
        );

        Ok(Receipt {
            cart: completed,
            items: snapshot.items,
            payment,
        })
    }
}

#[async_trait]
impl CartsService for CartManager {
    #[tracing::instrument(
        name = "carts.service.get_active_cart",
        skip(self),
        err
    )]
    async fn get_active_cart(&self) -> Result<CartSnapshot, CartsServiceError> {
        let mut session = self.session.lock().await;

        let result = self.load(&mut session, false).await;

        if self.fall_back_on_denial(&mut session, &result) {
            return self.load(&mut session, false).await;
        }

        result
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, product),
        err
    )]
    async fn add_item(
        &self,
        product: Product,
        quantity: u32,
    ) -> Result<CartSnapshot, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut session = self.session.lock().await;
        let now = Instant::now();

        let too_soon = session
            .recent_adds
            .get(&product.uuid)
            .is_some_and(|last| now.duration_since(*last) < self.add_debounce);

        if too_soon {
            debug!("ignoring repeated add");

            return Err(CartsServiceError::TooFrequent);
        }

        let debounce = self.add_debounce;

        session
            .recent_adds
            .retain(|_, last| now.duration_since(*last) < debounce);

        let resolve = |snapshot: &CartSnapshot| Self::resolve_add(snapshot, &product, quantity);
        let mut result = self.write(&mut session, resolve).await;

        if self.fall_back_on_denial(&mut session, &result) {
            result = self.write(&mut session, resolve).await;
        }

        // Only accepted adds count towards the debounce.
        if result.is_ok() {
            session.recent_adds.insert(product.uuid, now);
        }

        result
    }

    #[tracing::instrument(
        name = "carts.service.update_quantity",
        skip(self),
        err
    )]
    async fn update_quantity(
        &self,
        item: CartItemUuid,
        quantity: i64,
    ) -> Result<CartSnapshot, CartsServiceError> {
        let mut session = self.session.lock().await;

        let resolve =
            |snapshot: &CartSnapshot| Self::resolve_set_quantity(snapshot, item, quantity);
        let result = self.write(&mut session, resolve).await;

        if self.fall_back_on_denial(&mut session, &result) {
            return self.write(&mut session, resolve).await;
        }

        result
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self),
        err
    )]
    async fn remove_item(&self, item: CartItemUuid) -> Result<CartSnapshot, CartsServiceError> {
        self.update_quantity(item, 0).await
    }

    #[tracing::instrument(
        name = "carts.service.checkout",
        skip(self),
        err
    )]
    async fn checkout(
        &self,
        cart: CartUuid,
        payment_method: &str,
    ) -> Result<Receipt, CartsServiceError> {
        let payment_method = payment_method.trim();

        if payment_method.is_empty() {
            return Err(CartsServiceError::MissingRequiredData("payment method"));
        }

        let mut session = self.session.lock().await;

        let result = self.complete(&mut session, cart, payment_method).await;

        if self.fall_back_on_denial(&mut session, &result) {
            // The demo cart is a different cart, so there is nothing to retry.
            return Err(CartsServiceError::AccessDenied);
        }

        result
    }

    #[tracing::instrument(
        name = "carts.service.refresh",
        skip(self),
        err
    )]
    async fn refresh(&self) -> Result<CartSnapshot, CartsServiceError> {
        let mut session = self.session.lock().await;

        let result = self.load(&mut session, true).await;

        if self.fall_back_on_denial(&mut session, &result) {
            return self.load(&mut session, true).await;
        }

        result
    }

    async fn cached_cart(&self) -> Option<CartSnapshot> {
        let session = self.session.lock().await;

        session
            .snapshot
            .clone()
            .or_else(|| self.stored_snapshot())
    }

    async fn mode(&self) -> CartMode {
        self.session.lock().await.mode
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The session user's active cart, created if they have none.
    async fn get_active_cart(&self) -> Result<CartSnapshot, CartsServiceError>;

    /// Add `quantity` of a product, merging with an existing line for it.
    async fn add_item(
        &self,
        product: Product,
        quantity: u32,
    ) -> Result<CartSnapshot, CartsServiceError>;

    /// Set an item's quantity. Zero or less removes the item.
    async fn update_quantity(
        &self,
        item: CartItemUuid,
        quantity: i64,
    ) -> Result<CartSnapshot, CartsServiceError>;

    async fn remove_item(&self, item: CartItemUuid) -> Result<CartSnapshot, CartsServiceError>;

    /// Complete the cart and record its payment.
    async fn checkout(
        &self,
        cart: CartUuid,
        payment_method: &str,
    ) -> Result<Receipt, CartsServiceError>;

    /// Discard the in-memory snapshot and reload from the backend.
    async fn refresh(&self) -> Result<CartSnapshot, CartsServiceError>;

    /// The last known cart without contacting the backend.
    async fn cached_cart(&self) -> Option<CartSnapshot>;

    async fn mode(&self) -> CartMode;
}
