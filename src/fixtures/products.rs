//! Product Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    fixtures::FixtureError,
    products::{Product, ProductUuid},
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Products in catalog order
    pub products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Product price (e.g., "1.29")
    pub price: String,

    /// Product category
    #[serde(default)]
    pub category: Option<String>,

    /// Product barcode
    #[serde(default)]
    pub barcode: Option<String>,

    /// Product description
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<ProductFixture> for Product {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let price = parse_price(&fixture.price)?;

        // Ids derive from the name so a product keeps its id across loads.
        let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, fixture.name.as_bytes());
        let mut product = Product::new(fixture.name, price, fixture.category.as_deref());

        product.uuid = ProductUuid::from_uuid(uuid);

        product.barcode = fixture.barcode;
        product.description = fixture.description;

        Ok(product)
    }
}

/// Parse a non-negative decimal price string.
///
/// # Errors
///
/// Returns an error if the string is not a decimal number or is negative.
pub fn parse_price(s: &str) -> Result<Decimal, FixtureError> {
    let price = s
        .trim()
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    if price.is_sign_negative() {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_accepts_decimals() {
        assert_eq!(parse_price("1.29").ok(), Some(Decimal::new(129, 2)));
        assert_eq!(parse_price(" 3 ").ok(), Some(Decimal::new(3, 0)));
    }

    #[test]
    fn parse_price_rejects_negative_and_garbage() {
        assert!(matches!(
            parse_price("-0.50"),
            Err(FixtureError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("1.29 GBP"),
            Err(FixtureError::InvalidPrice(_))
        ));
    }

    #[test]
    fn product_ids_are_stable_across_loads() -> Result<(), FixtureError> {
        let fixture = || ProductFixture {
            name: "Banana".to_string(),
            price: "0.59".to_string(),
            category: None,
            barcode: None,
            description: None,
        };

        let first = Product::try_from(fixture())?;
        let second = Product::try_from(fixture())?;

        assert_eq!(first.uuid, second.uuid);

        Ok(())
    }
}
