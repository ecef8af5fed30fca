//! Products Repository

use async_trait::async_trait;
use mockall::automock;
use scancart::{classifier::normalize_label, fixtures::Fixture};

use crate::{
    domain::products::{Product, ProductUuid, ProductsServiceError},
    rest::RestClient,
};

const PRODUCTS_TABLE: &str = "products";

/// Stable catalog order, so "first product" means the same thing on every load.
const CATALOG_ORDER: &str = "created_at.asc,id.asc";

/// Where catalog products come from.
#[automock]
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError>;

    async fn get_product(&self, uuid: ProductUuid) -> Result<Option<Product>, ProductsServiceError>;

    async fn find_by_barcode(&self, barcode: &str)
    -> Result<Option<Product>, ProductsServiceError>;

    async fn search_products(&self, term: &str) -> Result<Vec<Product>, ProductsServiceError>;

    async fn list_by_category(&self, category: &str)
    -> Result<Vec<Product>, ProductsServiceError>;
}

/// Reads the backend `products` table.
#[derive(Debug, Clone)]
pub struct RestProductsRepository {
    rest: RestClient,
}

impl RestProductsRepository {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    async fn select(&self, filters: &[(&str, String)]) -> Result<Vec<Product>, ProductsServiceError> {
        let mut query = vec![("select", "*".to_string())];

        query.extend(filters.iter().cloned());
        query.push(("order", CATALOG_ORDER.to_string()));

        Ok(self.rest.select(PRODUCTS_TABLE, &query).await?)
    }

    async fn select_one(
        &self,
        filter: (&str, String),
    ) -> Result<Option<Product>, ProductsServiceError> {
        let products = self.select(&[filter, ("limit", "1".to_string())]).await?;

        Ok(products.into_iter().next())
    }
}

/// Strip characters that carry meaning inside a PostgREST `ilike` pattern.
fn ilike_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, '*' | '%' | ',' | '(' | ')'))
        .collect()
}

#[async_trait]
impl ProductsRepository for RestProductsRepository {
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError> {
        self.select(&[]).await
    }

    async fn get_product(&self, uuid: ProductUuid) -> Result<Option<Product>, ProductsServiceError> {
        self.select_one(("id", format!("eq.{uuid}"))).await
    }

    async fn find_by_barcode(
        &self,
        barcode: &str,
    ) -> Result<Option<Product>, ProductsServiceError> {
        self.select_one(("barcode", format!("eq.{barcode}"))).await
    }

    async fn search_products(&self, term: &str) -> Result<Vec<Product>, ProductsServiceError> {
        self.select(&[("name", format!("ilike.*{}*", ilike_term(term)))])
            .await
    }

    async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Product>, ProductsServiceError> {
        self.select(&[("category", format!("ilike.{}", ilike_term(category)))])
            .await
    }
}

/// An in-memory catalog loaded from YAML fixtures, used when no backend is
/// configured.
#[derive(Debug, Clone, Default)]
pub struct FixtureProductsRepository {
    products: Vec<Product>,
}

impl FixtureProductsRepository {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Load the named fixture set.
    ///
    /// # Errors
    ///
    /// Returns an error when the fixture file is missing or invalid.
    pub fn from_set(name: &str) -> Result<Self, ProductsServiceError> {
        Ok(Self::new(Fixture::from_set(name)?.into_products()))
    }

    fn filtered(&self, predicate: impl Fn(&Product) -> bool) -> Vec<Product> {
        self.products
            .iter()
            .filter(|product| predicate(product))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProductsRepository for FixtureProductsRepository {
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError> {
        Ok(self.products.clone())
    }

    async fn get_product(&self, uuid: ProductUuid) -> Result<Option<Product>, ProductsServiceError> {
        Ok(self.products.iter().find(|p| p.uuid == uuid).cloned())
    }

    async fn find_by_barcode(
        &self,
        barcode: &str,
    ) -> Result<Option<Product>, ProductsServiceError> {
        Ok(self
            .products
            .iter()
            .find(|p| p.barcode.as_deref() == Some(barcode))
            .cloned())
    }

    async fn search_products(&self, term: &str) -> Result<Vec<Product>, ProductsServiceError> {
        let term = term.to_lowercase();

        Ok(self.filtered(|p| p.name.to_lowercase().contains(&term)))
    }

    async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Product>, ProductsServiceError> {
        let category = normalize_label(category);

        Ok(self.filtered(|p| {
            p.category
                .as_deref()
                .is_some_and(|c| normalize_label(c) == category)
        }))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn ilike_term_drops_pattern_syntax() {
        assert_eq!(ilike_term("ap*ple, (green)%"), "apple green");
    }

    #[tokio::test]
    async fn fixture_search_is_case_insensitive() -> TestResult {
        let repository = FixtureProductsRepository::from_set("groceries")?;

        let names: Vec<_> = repository
            .search_products("APPLE")
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, ["Apple", "Granny Smith Apple"]);

        Ok(())
    }

    #[tokio::test]
    async fn fixture_category_ignores_case_and_plural() -> TestResult {
        let repository = FixtureProductsRepository::from_set("groceries")?;

        let vegetables = repository.list_by_category("vegetables").await?;

        assert!(!vegetables.is_empty());
        assert!(
            vegetables
                .iter()
                .all(|p| p.category.as_deref() == Some("Vegetable")),
            "got {vegetables:?}"
        );

        Ok(())
    }
}
