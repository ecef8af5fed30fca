//! Carts persisted in the backend's REST tables.

use async_trait::async_trait;
use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    auth::UserUuid,
    domain::{
        carts::{
            CartsServiceError,
            backend::CartsBackend,
            models::{
                Cart, CartCompletion, CartItem, CartItemUuid, CartStatus, CartUuid, NewCart,
                NewCartItem, NewPayment, Payment, PaymentStatus, PaymentUuid,
            },
        },
        products::{Product, ProductUuid},
    },
    rest::RestClient,
};

const CARTS_TABLE: &str = "carts";
const CART_ITEMS_TABLE: &str = "cart_items";
const CART_ITEMS_VIEW: &str = "cart_items_with_products";
const CART_TOTALS_VIEW: &str = "cart_totals";
const PAYMENTS_TABLE: &str = "payments";

#[derive(Debug, Clone)]
pub struct RestCartsBackend {
    rest: RestClient,
}

impl RestCartsBackend {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[derive(Debug, Serialize)]
struct CartItemInsert {
    id: CartItemUuid,
    cart_id: CartUuid,
    product_id: ProductUuid,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct QuantityUpdate {
    quantity: u32,
    updated_at: Timestamp,
}

#[derive(Debug, Serialize)]
struct CompletionUpdate<'a> {
    status: CartStatus,
    completed_at: Timestamp,
    updated_at: Timestamp,
    payment_method: &'a str,
}

#[derive(Debug, Serialize)]
struct PaymentStatusUpdate {
    status: PaymentStatus,
}

/// A row of the items view: the item's columns plus the left-joined product's,
/// which are all null when the product row is missing.
#[derive(Debug, Deserialize)]
struct CartItemRow {
    id: CartItemUuid,
    cart_id: CartUuid,
    product_id: ProductUuid,
    quantity: u32,
    #[serde(default)]
    created_at: Option<Timestamp>,
    #[serde(default)]
    updated_at: Option<Timestamp>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    product_price: Option<Decimal>,
    #[serde(default)]
    product_description: Option<String>,
    #[serde(default)]
    product_image_url: Option<String>,
    #[serde(default)]
    product_barcode: Option<String>,
    #[serde(default)]
    product_category: Option<String>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        let product = match (row.product_name, row.product_price) {
            (Some(name), Some(price)) => Some(Product {
                uuid: row.product_id,
                name,
                description: row.product_description,
                price,
                image_url: row.product_image_url,
                barcode: row.product_barcode,
                category: row.product_category,
                created_at: None,
                updated_at: None,
            }),
            _ => None,
        };

        Self {
            uuid: row.id,
            cart_uuid: row.cart_id,
            product_uuid: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
            product,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CartTotalRow {
    #[serde(default)]
    total: Option<Decimal>,
}

fn first<T>(rows: Vec<T>, missing: CartsServiceError) -> Result<T, CartsServiceError> {
    rows.into_iter().next().ok_or(missing)
}

#[async_trait]
impl CartsBackend for RestCartsBackend {
    async fn find_active_cart(&self, user: UserUuid) -> Result<Option<Cart>, CartsServiceError> {
        let carts: Vec<Cart> = self
            .rest
            .select(
                CARTS_TABLE,
                &[
                    ("select", "*".to_string()),
                    ("user_id", format!("eq.{user}")),
                    ("status", format!("eq.{}", CartStatus::Active)),
                    ("order", "created_at.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(carts.into_iter().next())
    }

    async fn create_cart(&self, cart: NewCart) -> Result<Cart, CartsServiceError> {
        let rows = self.rest.insert(CARTS_TABLE, &cart).await?;

        debug!(cart = %cart.uuid, "created cart");

        first(rows, CartsServiceError::NotFound)
    }

    async fn list_items(&self, cart: CartUuid) -> Result<Vec<CartItem>, CartsServiceError> {
        let rows: Vec<CartItemRow> = self
            .rest
            .select(
                CART_ITEMS_VIEW,
                &[
                    ("select", "*".to_string()),
                    ("cart_id", format!("eq.{cart}")),
                    ("order", "created_at.asc,id.asc".to_string()),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    async fn insert_item(&self, item: NewCartItem) -> Result<CartItem, CartsServiceError> {
        let rows: Vec<CartItem> = self
            .rest
            .insert(
                CART_ITEMS_TABLE,
                &CartItemInsert {
                    id: item.uuid,
                    cart_id: item.cart_uuid,
                    product_id: item.product.uuid,
                    quantity: item.quantity,
                },
            )
            .await?;

        let mut inserted = first(rows, CartsServiceError::ItemNotFound)?;

        inserted.product = Some(item.product);

        Ok(inserted)
    }

    async fn update_item_quantity(
        &self,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItem, CartsServiceError> {
        let rows = self
            .rest
            .update(
                CART_ITEMS_TABLE,
                &[("id", format!("eq.{item}"))],
                &QuantityUpdate {
                    quantity,
                    updated_at: Timestamp::now(),
                },
            )
            .await?;

        first(rows, CartsServiceError::ItemNotFound)
    }

    async fn delete_item(&self, item: CartItemUuid) -> Result<(), CartsServiceError> {
        let deleted = self
            .rest
            .delete(CART_ITEMS_TABLE, &[("id", format!("eq.{item}"))])
            .await?;

        if deleted == 0 {
            return Err(CartsServiceError::ItemNotFound);
        }

        Ok(())
    }

    async fn complete_cart(
        &self,
        cart: CartUuid,
        completion: CartCompletion,
    ) -> Result<Cart, CartsServiceError> {
        let rows = self
            .rest
            .update(
                CARTS_TABLE,
                &[
                    ("id", format!("eq.{cart}")),
                    ("status", format!("eq.{}", CartStatus::Active)),
                ],
                &CompletionUpdate {
                    status: CartStatus::Completed,
                    completed_at: completion.completed_at,
                    updated_at: completion.completed_at,
                    payment_method: &completion.payment_method,
                },
            )
            .await?;

        first(rows, CartsServiceError::NotActive)
    }

    async fn cart_total(&self, cart: CartUuid) -> Result<Decimal, CartsServiceError> {
        let rows: Vec<CartTotalRow> = self
            .rest
            .select(
                CART_TOTALS_VIEW,
                &[
                    ("select", "total".to_string()),
                    ("cart_id", format!("eq.{cart}")),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.total)
            .unwrap_or(Decimal::ZERO))
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, CartsServiceError> {
        let rows = self.rest.insert(PAYMENTS_TABLE, &payment).await?;

        first(rows, CartsServiceError::NotFound)
    }

    async fn update_payment_status(
        &self,
        payment: PaymentUuid,
        status: PaymentStatus,
    ) -> Result<Payment, CartsServiceError> {
        let rows = self
            .rest
            .update(
                PAYMENTS_TABLE,
                &[("id", format!("eq.{payment}"))],
                &PaymentStatusUpdate { status },
            )
            .await?;

        first(rows, CartsServiceError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn view_row_without_product_keeps_the_item() -> TestResult {
        let row: CartItemRow = serde_json::from_str(
            r#"{
                "id": "0190f5a4-7c3e-7b7a-8f4e-2b9d6c1a0e11",
                "cart_id": "0190f5a4-7c3e-7b7a-8f4e-2b9d6c1a0e12",
                "product_id": "0190f5a4-7c3e-7b7a-8f4e-2b9d6c1a0e13",
                "quantity": 2,
                "product_name": null,
                "product_price": null
            }"#,
        )?;

        let item = CartItem::from(row);

        assert_eq!(item.quantity, 2);
        assert!(item.product.is_none());

        Ok(())
    }

    #[test]
    fn view_row_with_product_is_joined() -> TestResult {
        let row: CartItemRow = serde_json::from_str(
            r#"{
                "id": "0190f5a4-7c3e-7b7a-8f4e-2b9d6c1a0e11",
                "cart_id": "0190f5a4-7c3e-7b7a-8f4e-2b9d6c1a0e12",
                "product_id": "0190f5a4-7c3e-7b7a-8f4e-2b9d6c1a0e13",
                "quantity": 1,
                "product_name": "Tomato",
                "product_price": 1.29,
                "product_category": "Vegetable"
            }"#,
        )?;

        let item = CartItem::from(row);

        assert_eq!(
            item.product.as_ref().map(|p| (p.name.as_str(), p.price)),
            Some(("Tomato", Decimal::new(129, 2)))
        );
        assert_eq!(item.product.map(|p| p.uuid), Some(item.product_uuid));

        Ok(())
    }
}
