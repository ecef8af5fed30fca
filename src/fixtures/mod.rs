//! Fixtures
//!
//! YAML catalog snapshots used by tests and by the offline tooling in place of
//! a live backend.

use std::{fs, path::PathBuf};

use thiserror::Error;

use crate::products::Product;

pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Products in the order they were declared
    products: Vec<Product>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture rooted at the crate's `fixtures` directory
    pub fn new() -> Self {
        Self::with_base_path(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: Vec::new(),
        }
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a price is invalid.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("products").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        self.extend_from_yaml(&contents)?;

        Ok(self)
    }

    /// Append products parsed from a YAML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or a price is invalid.
    pub fn extend_from_yaml(&mut self, contents: &str) -> Result<&mut Self, FixtureError> {
        let fixture: products::ProductsFixture = serde_norway::from_str(contents)?;

        for product_fixture in fixture.products {
            self.products.push(product_fixture.try_into()?);
        }

        Ok(self)
    }

    /// Load a named catalog set
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture file cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_products(name)?;

        Ok(fixture)
    }

    /// Get a product by name (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, name: &str) -> Result<&Product, FixtureError> {
        self.products
            .iter()
            .find(|product| product.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| FixtureError::ProductNotFound(name.to_string()))
    }

    /// All loaded products, in declaration order
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Consume the fixture, returning the catalog snapshot
    pub fn into_products(self) -> Vec<Product> {
        self.products
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn loads_groceries_set_in_declaration_order() -> TestResult {
        let fixture = Fixture::from_set("groceries")?;

        let first = fixture.products().first().map(|p| p.name.as_str());

        assert_eq!(first, Some("Banana"));
        assert_eq!(fixture.product("tomato")?.category.as_deref(), Some("Vegetable"));

        Ok(())
    }

    #[test]
    fn unknown_product_is_an_error() -> TestResult {
        let fixture = Fixture::from_set("groceries")?;

        assert!(matches!(
            fixture.product("Durian"),
            Err(FixtureError::ProductNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn missing_set_is_an_io_error() {
        let result = Fixture::from_set("does-not-exist");

        assert!(matches!(result, Err(FixtureError::Io(_))));
    }
}
