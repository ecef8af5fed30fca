//! Where carts are persisted.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;

use crate::{
    auth::UserUuid,
    domain::carts::{
        CartsServiceError,
        models::{
            Cart, CartCompletion, CartItem, CartItemUuid, CartUuid, NewCart, NewCartItem,
            NewPayment, Payment, PaymentStatus, PaymentUuid,
        },
    },
};

mod memory;
mod rest;

pub use memory::MemoryCartsBackend;
pub use rest::RestCartsBackend;

#[automock]
#[async_trait]
pub trait CartsBackend: Send + Sync {
    /// The user's most recently created active cart.
    async fn find_active_cart(&self, user: UserUuid) -> Result<Option<Cart>, CartsServiceError>;

    async fn create_cart(&self, cart: NewCart) -> Result<Cart, CartsServiceError>;

    /// Items in insertion order, with product details where the join found them.
    async fn list_items(&self, cart: CartUuid) -> Result<Vec<CartItem>, CartsServiceError>;

    async fn insert_item(&self, item: NewCartItem) -> Result<CartItem, CartsServiceError>;

    async fn update_item_quantity(
        &self,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItem, CartsServiceError>;

    async fn delete_item(&self, item: CartItemUuid) -> Result<(), CartsServiceError>;

    /// Mark an active cart completed.
    async fn complete_cart(
        &self,
        cart: CartUuid,
        completion: CartCompletion,
    ) -> Result<Cart, CartsServiceError>;

    /// The total the backend computes for the cart.
    async fn cart_total(&self, cart: CartUuid) -> Result<Decimal, CartsServiceError>;

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, CartsServiceError>;

    async fn update_payment_status(
        &self,
        payment: PaymentUuid,
        status: PaymentStatus,
    ) -> Result<Payment, CartsServiceError>;
}
