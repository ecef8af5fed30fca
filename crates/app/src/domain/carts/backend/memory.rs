//! Carts held in memory, for anonymous and demo sessions.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    auth::UserUuid,
    domain::carts::{
        CartsServiceError,
        backend::CartsBackend,
        models::{
            Cart, CartCompletion, CartItem, CartItemUuid, CartSnapshot, CartStatus, CartUuid,
            NewCart, NewCartItem, NewPayment, Payment, PaymentStatus, PaymentUuid,
        },
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    carts: Vec<Cart>,
    items: Vec<CartItem>,
    payments: Vec<Payment>,
}

/// A backend that never leaves the process. Identifiers are generated on the
/// client and totals are computed from the embedded product prices.
#[derive(Debug, Default)]
pub struct MemoryCartsBackend {
    state: Mutex<MemoryState>,
}

impl MemoryCartsBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously saved cart.
    #[must_use]
    pub fn from_snapshot(snapshot: CartSnapshot) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                carts: vec![snapshot.cart],
                items: snapshot.items,
                payments: Vec::new(),
            }),
        }
    }

    /// Payments recorded so far.
    #[must_use]
    pub fn payments(&self) -> Vec<Payment> {
        self.state().payments.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CartsBackend for MemoryCartsBackend {
    async fn find_active_cart(&self, user: UserUuid) -> Result<Option<Cart>, CartsServiceError> {
        Ok(self
            .state()
            .carts
            .iter()
            .rev()
            .find(|cart| cart.user_uuid == user && cart.status == CartStatus::Active)
            .cloned())
    }

    async fn create_cart(&self, cart: NewCart) -> Result<Cart, CartsServiceError> {
        let mut state = self.state();

        if state.carts.iter().any(|existing| existing.uuid == cart.uuid) {
            return Err(CartsServiceError::AlreadyExists);
        }

        let now = Timestamp::now();
        let created = Cart {
            uuid: cart.uuid,
            user_uuid: cart.user_uuid,
            status: cart.status,
            created_at: Some(now),
            updated_at: Some(now),
            completed_at: None,
            payment_method: None,
        };

        state.carts.push(created.clone());

        Ok(created)
    }

    async fn list_items(&self, cart: CartUuid) -> Result<Vec<CartItem>, CartsServiceError> {
        Ok(self
            .state()
            .items
            .iter()
            .filter(|item| item.cart_uuid == cart)
            .cloned()
            .collect())
    }

    async fn insert_item(&self, item: NewCartItem) -> Result<CartItem, CartsServiceError> {
        if item.quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut state = self.state();

        if !state.carts.iter().any(|cart| cart.uuid == item.cart_uuid) {
            return Err(CartsServiceError::InvalidReference);
        }

        let duplicate = state.items.iter().any(|existing| {
            existing.uuid == item.uuid
                || (existing.cart_uuid == item.cart_uuid
                    && existing.product_uuid == item.product.uuid)
        });

        if duplicate {
            return Err(CartsServiceError::AlreadyExists);
        }

        let now = Timestamp::now();
        let inserted = CartItem {
            uuid: item.uuid,
            cart_uuid: item.cart_uuid,
            product_uuid: item.product.uuid,
            quantity: item.quantity,
            created_at: Some(now),
            updated_at: Some(now),
            product: Some(item.product),
        };

        state.items.push(inserted.clone());

        Ok(inserted)
    }

    async fn update_item_quantity(
        &self,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItem, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut state = self.state();

        let existing = state
            .items
            .iter_mut()
            .find(|existing| existing.uuid == item)
            .ok_or(CartsServiceError::ItemNotFound)?;

        existing.quantity = quantity;
        existing.updated_at = Some(Timestamp::now());

        Ok(existing.clone())
    }

    async fn delete_item(&self, item: CartItemUuid) -> Result<(), CartsServiceError> {
        let mut state = self.state();
        let before = state.items.len();

        state.items.retain(|existing| existing.uuid != item);

        if state.items.len() == before {
            return Err(CartsServiceError::ItemNotFound);
        }

        Ok(())
    }

    async fn complete_cart(
        &self,
        cart: CartUuid,
        completion: CartCompletion,
    ) -> Result<Cart, CartsServiceError> {
        let mut state = self.state();

        let existing = state
            .carts
            .iter_mut()
            .find(|existing| existing.uuid == cart)
            .ok_or(CartsServiceError::NotFound)?;

        if existing.status != CartStatus::Active {
            return Err(CartsServiceError::NotActive);
        }

        existing.status = CartStatus::Completed;
        existing.completed_at = Some(completion.completed_at);
        existing.updated_at = Some(completion.completed_at);
        existing.payment_method = Some(completion.payment_method);

        Ok(existing.clone())
    }

    async fn cart_total(&self, cart: CartUuid) -> Result<Decimal, CartsServiceError> {
        Ok(self
            .state()
            .items
            .iter()
            .filter(|item| item.cart_uuid == cart)
            .map(CartItem::line_total)
            .sum())
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, CartsServiceError> {
        let mut state = self.state();

        if !state.carts.iter().any(|cart| cart.uuid == payment.cart_uuid) {
            return Err(CartsServiceError::InvalidReference);
        }

        let recorded = Payment {
            uuid: payment.uuid,
            cart_uuid: payment.cart_uuid,
            amount: payment.amount,
            status: payment.status,
            payment_method: payment.payment_method,
            transaction_reference: payment.transaction_reference,
            created_at: Some(Timestamp::now()),
        };

        state.payments.push(recorded.clone());

        Ok(recorded)
    }

    async fn update_payment_status(
        &self,
        payment: PaymentUuid,
        status: PaymentStatus,
    ) -> Result<Payment, CartsServiceError> {
        let mut state = self.state();

        let existing = state
            .payments
            .iter_mut()
            .find(|existing| existing.uuid == payment)
            .ok_or(CartsServiceError::NotFound)?;

        existing.status = status;

        Ok(existing.clone())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::domain::products::Product;

    #[tokio::test]
    async fn duplicate_product_in_cart_is_rejected() -> TestResult {
        let backend = MemoryCartsBackend::new();
        let cart = backend.create_cart(NewCart::active(UserUuid::new())).await?;
        let apple = Product::new("Apple", Decimal::new(89, 2), Some("Fruit"));

        let item = |product: &Product| NewCartItem {
            uuid: CartItemUuid::new(),
            cart_uuid: cart.uuid,
            product: product.clone(),
            quantity: 1,
        };

        backend.insert_item(item(&apple)).await?;

        let result = backend.insert_item(item(&apple)).await;

        assert!(
            matches!(result, Err(CartsServiceError::AlreadyExists)),
            "got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn completed_cart_is_no_longer_active() -> TestResult {
        let user = UserUuid::new();
        let backend = MemoryCartsBackend::new();
        let cart = backend.create_cart(NewCart::active(user)).await?;

        backend
            .complete_cart(
                cart.uuid,
                CartCompletion {
                    payment_method: "card".to_string(),
                    completed_at: Timestamp::now(),
                },
            )
            .await?;

        assert!(backend.find_active_cart(user).await?.is_none());

        let again = backend
            .complete_cart(
                cart.uuid,
                CartCompletion {
                    payment_method: "card".to_string(),
                    completed_at: Timestamp::now(),
                },
            )
            .await;

        assert!(matches!(again, Err(CartsServiceError::NotActive)));

        Ok(())
    }
}
