//! Products

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Catalog product, as stored in the backend `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    #[serde(rename = "id")]
    pub uuid: ProductUuid,

    /// Display name, also the key used for label matching
    pub name: String,

    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,

    /// Unit price, never negative
    pub price: Decimal,

    /// Image reference
    #[serde(default)]
    pub image_url: Option<String>,

    /// Unique barcode, when the product has one
    #[serde(default)]
    pub barcode: Option<String>,

    /// Category name, e.g. "Fruit" or "Vegetable"
    #[serde(default)]
    pub category: Option<String>,

    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,

    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Product {
    /// Build a product with only the fields the matcher looks at.
    pub fn new(name: impl Into<String>, price: Decimal, category: Option<&str>) -> Self {
        Self {
            uuid: ProductUuid::new(),
            name: name.into(),
            description: None,
            price,
            image_url: None,
            barcode: None,
            category: category.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }
}
