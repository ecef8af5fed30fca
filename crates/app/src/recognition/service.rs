//! Recognition service.

use std::sync::Arc;

use mockall::automock;
use scancart::{
    classifier::is_food,
    matcher::{MatchStrategy, find_match},
};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::{
    domain::products::{Product, ProductsService},
    recognition::{
        Candidate, CandidateLimits, MatchedItem, Recognition, RecognitionError, RecognizedItem,
        candidates,
    },
    vision::{VisionClient, sample_response},
};

/// What to do when the vision API call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisionFallback {
    /// Return the error.
    #[default]
    Propagate,

    /// Continue with the fixed sample annotations.
    Sample,
}

/// Resolves one label against a catalog snapshot.
#[automock]
pub trait LabelMatcher: Send + Sync {
    fn find_match(&self, label: &str, catalog: &[Product]) -> Option<(Product, MatchStrategy)>;
}

/// The catalog matching heuristics of [`scancart::matcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogMatcher;

impl LabelMatcher for CatalogMatcher {
    fn find_match(&self, label: &str, catalog: &[Product]) -> Option<(Product, MatchStrategy)> {
        find_match(label, catalog).map(|found| (found.product.clone(), found.strategy))
    }
}

pub struct Recognizer {
    vision: Arc<dyn VisionClient>,
    products: Arc<dyn ProductsService>,
    matcher: Arc<dyn LabelMatcher>,
    limits: CandidateLimits,
    fallback: VisionFallback,
}

impl Recognizer {
    #[must_use]
    pub fn new(vision: Arc<dyn VisionClient>, products: Arc<dyn ProductsService>) -> Self {
        Self {
            vision,
            products,
            matcher: Arc::new(CatalogMatcher),
            limits: CandidateLimits::default(),
            fallback: VisionFallback::default(),
        }
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn LabelMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: CandidateLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: VisionFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Recognize the product in a base64-encoded image.
    ///
    /// # Errors
    ///
    /// Returns an error when the vision call fails (and no fallback is
    /// configured) or the catalog cannot be loaded.
    #[tracing::instrument(name = "recognition.service.recognize", skip_all, err)]
    pub async fn recognize(&self, image_base64: &str) -> Result<Recognition, RecognitionError> {
        let (response, used_sample) = match self.vision.annotate(image_base64).await {
            Ok(response) => (response, false),
            Err(error) if self.fallback == VisionFallback::Sample => {
                warn!("vision request failed, using sample annotations: {error}");

                (sample_response(), true)
            }
            Err(error) => return Err(error.into()),
        };

        let candidates = candidates(&response, self.limits);
        let item = self.resolve(&candidates).await?;

        Ok(Recognition {
            items: vec![item],
            candidates,
            used_sample,
        })
    }

    /// The first food candidate that resolves against the catalog.
    async fn resolve(&self, candidates: &[Candidate]) -> Result<RecognizedItem, RecognitionError> {
        let food: SmallVec<[&Candidate; 8]> = candidates
            .iter()
            .filter(|candidate| {
                let food = is_food(&candidate.label);

                if !food {
                    debug!(label = %candidate.label, "skipping non-food label");
                }

                food
            })
            .collect();

        if food.is_empty() {
            info!(candidates = candidates.len(), "no food labels in image");

            return Ok(RecognizedItem::NotInDatabase);
        }

        let catalog = self.products.list_products().await?;

        let matched = food.into_iter().find_map(|candidate| {
            let (product, strategy) = self.matcher.find_match(&candidate.label, &catalog)?;

            Some(MatchedItem {
                product,
                label: candidate.label.clone(),
                source: candidate.source,
                strategy,
                confidence: candidate.confidence,
            })
        });

        match matched {
            Some(item) => {
                info!(
                    label = %item.label,
                    product = %item.product.name,
                    strategy = %item.strategy,
                    "label matched catalog product"
                );

                Ok(RecognizedItem::Matched(item))
            }
            None => {
                info!(candidates = candidates.len(), "no label matched the catalog");

                Ok(RecognizedItem::NotInDatabase)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::products::MockProductsService,
        recognition::CandidateSource,
        vision::{
            AnnotateImageResponse, BestGuessLabel, LabelAnnotation, MockVisionClient,
            VisionError, WebDetection, WebEntity,
        },
    };

    fn vision_returning(response: AnnotateImageResponse) -> MockVisionClient {
        let mut vision = MockVisionClient::new();

        vision
            .expect_annotate()
            .once()
            .return_once(move |_| Ok(response));

        vision
    }

    fn catalog_of(products: Vec<Product>) -> MockProductsService {
        let mut service = MockProductsService::new();

        service
            .expect_list_products()
            .returning(move || Ok(products.clone()));

        service
    }

    fn grocery_catalog() -> Vec<Product> {
        vec![
            Product::new("Banana", Decimal::new(59, 2), Some("Fruit")),
            Product::new("Tomato", Decimal::new(129, 2), Some("Vegetable")),
        ]
    }

    #[tokio::test]
    async fn best_guess_tomato_resolves_exactly() -> TestResult {
        let response = AnnotateImageResponse {
            label_annotations: vec![LabelAnnotation::new("Vegetable", 0.97)],
            web_detection: Some(WebDetection {
                web_entities: Vec::new(),
                best_guess_labels: vec![BestGuessLabel {
                    label: "Tomato".to_string(),
                }],
            }),
            error: None,
        };

        let recognizer = Recognizer::new(
            Arc::new(vision_returning(response)),
            Arc::new(catalog_of(grocery_catalog())),
        );

        let recognition = recognizer.recognize("aGk=").await?;

        assert_eq!(recognition.items.len(), 1);

        let RecognizedItem::Matched(item) = recognition.item() else {
            return Err(format!("expected a match, got {:?}", recognition.item()).into());
        };

        assert_eq!(item.product.name, "Tomato");
        assert_eq!(item.product.price, Decimal::new(129, 2));
        assert_eq!(item.strategy, MatchStrategy::Exact, "no fallback strategy");
        assert_eq!(item.source, CandidateSource::BestGuess);
        assert!(!recognition.used_sample);

        Ok(())
    }

    #[tokio::test]
    async fn no_food_labels_is_not_in_database() -> TestResult {
        let response = AnnotateImageResponse {
            label_annotations: vec![
                LabelAnnotation::new("Furniture", 0.95),
                LabelAnnotation::new("Wood", 0.9),
            ],
            web_detection: Some(WebDetection {
                web_entities: vec![WebEntity {
                    description: "Chair".to_string(),
                    score: 0.8,
                }],
                best_guess_labels: vec![BestGuessLabel {
                    label: "wooden chair".to_string(),
                }],
            }),
            error: None,
        };

        let mut matcher = MockLabelMatcher::new();

        matcher.expect_find_match().times(0);

        let mut products = MockProductsService::new();

        products.expect_list_products().times(0);

        let recognizer = Recognizer::new(Arc::new(vision_returning(response)), Arc::new(products))
            .with_matcher(Arc::new(matcher));

        let recognition = recognizer.recognize("aGk=").await?;

        assert_eq!(recognition.items, [RecognizedItem::NotInDatabase]);
        assert_eq!(recognition.item().display_name(), "Not in database");

        let labels: Vec<&str> = recognition
            .candidates
            .iter()
            .map(|candidate| candidate.label.as_str())
            .collect();

        assert!(labels.contains(&"wooden chair"), "candidates kept: {labels:?}");
        assert!(labels.contains(&"Furniture"), "candidates kept: {labels:?}");

        Ok(())
    }

    #[tokio::test]
    async fn only_food_labels_reach_the_matcher() -> TestResult {
        let response = AnnotateImageResponse {
            label_annotations: vec![
                LabelAnnotation::new("Tableware", 0.99),
                LabelAnnotation::new("Cheese", 0.9),
            ],
            web_detection: None,
            error: None,
        };

        let mut matcher = MockLabelMatcher::new();

        matcher
            .expect_find_match()
            .withf(|label, _| label == "Cheese")
            .once()
            .returning(|_, _| None);

        let recognizer = Recognizer::new(
            Arc::new(vision_returning(response)),
            Arc::new(catalog_of(grocery_catalog())),
        )
        .with_matcher(Arc::new(matcher));

        let recognition = recognizer.recognize("aGk=").await?;

        assert_eq!(recognition.item(), &RecognizedItem::NotInDatabase);

        Ok(())
    }

    #[tokio::test]
    async fn first_resolving_candidate_wins() -> TestResult {
        let response = AnnotateImageResponse {
            label_annotations: vec![
                LabelAnnotation::new("Dragon fruit", 0.95),
                LabelAnnotation::new("Banana", 0.9),
            ],
            web_detection: None,
            error: None,
        };

        let recognizer = Recognizer::new(
            Arc::new(vision_returning(response)),
            Arc::new(catalog_of(grocery_catalog())),
        );

        let recognition = recognizer.recognize("aGk=").await?;

        // "Dragon fruit" reaches the category fallback before "Banana" is tried.
        let RecognizedItem::Matched(item) = recognition.item() else {
            return Err("expected a match".into());
        };

        assert_eq!(item.label, "Dragon fruit");
        assert_eq!(item.strategy, MatchStrategy::Category);
        assert_eq!(item.product.name, "Banana");
        assert!((item.confidence - 0.95).abs() < f32::EPSILON);

        Ok(())
    }

    #[tokio::test]
    async fn vision_failure_propagates_by_default() -> TestResult {
        let mut vision = MockVisionClient::new();

        vision
            .expect_annotate()
            .once()
            .returning(|_| Err(VisionError::EmptyResponse));

        let recognizer = Recognizer::new(Arc::new(vision), Arc::new(MockProductsService::new()));

        let result = recognizer.recognize("aGk=").await;

        assert!(
            matches!(result, Err(RecognitionError::Vision(VisionError::EmptyResponse))),
            "got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn vision_failure_uses_sample_when_configured() -> TestResult {
        let mut vision = MockVisionClient::new();

        vision.expect_annotate().once().returning(|_| {
            Err(VisionError::Status {
                status: 503,
                message: "unavailable".to_string(),
            })
        });

        let recognizer = Recognizer::new(
            Arc::new(vision),
            Arc::new(catalog_of(grocery_catalog())),
        )
        .with_fallback(VisionFallback::Sample);

        let recognition = recognizer.recognize("aGk=").await?;

        assert!(recognition.used_sample);
        assert_eq!(recognition.item().display_name(), "Banana");

        Ok(())
    }
}
