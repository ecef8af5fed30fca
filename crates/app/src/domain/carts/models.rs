//! Cart Models

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use scancart::uuids::TypedUuid;
use serde::{Deserialize, Serialize};

use crate::{
    auth::UserUuid,
    domain::products::{Product, ProductUuid},
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItem>;

/// Payment UUID
pub type PaymentUuid = TypedUuid<Payment>;

/// Cart lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Active,
    Completed,
    #[serde(alias = "cancelled")]
    Abandoned,
}

impl CartStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cart Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(rename = "id")]
    pub uuid: CartUuid,

    #[serde(rename = "user_id")]
    pub user_uuid: UserUuid,

    pub status: CartStatus,

    #[serde(default)]
    pub created_at: Option<Timestamp>,

    #[serde(default)]
    pub updated_at: Option<Timestamp>,

    #[serde(default)]
    pub completed_at: Option<Timestamp>,

    #[serde(default)]
    pub payment_method: Option<String>,
}

/// New Cart Model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCart {
    #[serde(rename = "id")]
    pub uuid: CartUuid,

    #[serde(rename = "user_id")]
    pub user_uuid: UserUuid,

    pub status: CartStatus,
}

impl NewCart {
    #[must_use]
    pub fn active(user_uuid: UserUuid) -> Self {
        Self {
            uuid: CartUuid::new(),
            user_uuid,
            status: CartStatus::Active,
        }
    }
}

/// CartItem Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "id")]
    pub uuid: CartItemUuid,

    #[serde(rename = "cart_id")]
    pub cart_uuid: CartUuid,

    #[serde(rename = "product_id")]
    pub product_uuid: ProductUuid,

    pub quantity: u32,

    #[serde(default)]
    pub created_at: Option<Timestamp>,

    #[serde(default)]
    pub updated_at: Option<Timestamp>,

    /// Product details, `None` when they could not be resolved.
    #[serde(default)]
    pub product: Option<Product>,
}

impl CartItem {
    /// Price times quantity, zero when the product is unknown.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .as_ref()
            .map_or(Decimal::ZERO, |product| product.price * Decimal::from(self.quantity))
    }

    /// Name to show for the item.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.product
            .as_ref()
            .map_or("Unknown product", |product| product.name.as_str())
    }
}

/// New CartItem Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub cart_uuid: CartUuid,
    pub product: Product,
    pub quantity: u32,
}

/// Fields set on a cart at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CartCompletion {
    pub payment_method: String,
    pub completed_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Payment Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "id")]
    pub uuid: PaymentUuid,

    #[serde(rename = "cart_id")]
    pub cart_uuid: CartUuid,

    pub amount: Decimal,

    pub status: PaymentStatus,

    pub payment_method: String,

    #[serde(default)]
    pub transaction_reference: Option<String>,

    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// New Payment Model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPayment {
    #[serde(rename = "id")]
    pub uuid: PaymentUuid,

    #[serde(rename = "cart_id")]
    pub cart_uuid: CartUuid,

    pub amount: Decimal,

    pub status: PaymentStatus,

    pub payment_method: String,

    pub transaction_reference: Option<String>,
}

/// A cart with its items, as last loaded or optimistically modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub cart: Cart,

    pub items: Vec<CartItem>,

    /// Set when the snapshot came from the local mirror because the backend
    /// could not be reached.
    #[serde(default)]
    pub stale: bool,
}

impl CartSnapshot {
    #[must_use]
    pub fn new(cart: Cart, items: Vec<CartItem>) -> Self {
        Self {
            cart,
            items,
            stale: false,
        }
    }

    /// Client-side total, for display only. Checkout uses the backend's total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn item(&self, uuid: CartItemUuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.uuid == uuid)
    }

    #[must_use]
    pub fn item_for_product(&self, product: ProductUuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_uuid == product)
    }
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub cart: Cart,
    pub items: Vec<CartItem>,
    pub payment: Payment,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn cancelled_reads_as_abandoned() -> TestResult {
        let cart: Cart = serde_json::from_str(
            r#"{
                "id": "0190f5a4-7c3e-7b7a-8f4e-2b9d6c1a0e11",
                "user_id": "00000000-0000-4000-8000-000000000001",
                "status": "cancelled",
                "created_at": "2025-03-01T10:00:00.123456+00:00"
            }"#,
        )?;

        assert_eq!(cart.status, CartStatus::Abandoned);
        assert!(cart.completed_at.is_none());

        Ok(())
    }

    #[test]
    fn snapshot_total_skips_unknown_products() {
        let cart_uuid = CartUuid::new();
        let tomato = Product::new("Tomato", Decimal::new(129, 2), Some("Vegetable"));

        let item = |product: Option<Product>, quantity| CartItem {
            uuid: CartItemUuid::new(),
            cart_uuid,
            product_uuid: product.as_ref().map_or_else(ProductUuid::new, |p| p.uuid),
            quantity,
            created_at: None,
            updated_at: None,
            product,
        };

        let snapshot = CartSnapshot::new(
            Cart {
                uuid: cart_uuid,
                user_uuid: UserUuid::new(),
                status: CartStatus::Active,
                created_at: None,
                updated_at: None,
                completed_at: None,
                payment_method: None,
            },
            vec![item(Some(tomato), 3), item(None, 2)],
        );

        assert_eq!(snapshot.total(), Decimal::new(387, 2));
        assert_eq!(snapshot.item_count(), 5);
    }
}
