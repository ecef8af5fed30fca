//! Candidate labels from an annotation, in the order they are tried.

use rustc_hash::FxHashSet;
use scancart::classifier::normalize_label;

use crate::vision::AnnotateImageResponse;

/// Where a candidate label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    BestGuess,
    Label,
    WebEntity,
}

/// A label to try against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub source: CandidateSource,

    /// Internal score in `[0, 1]`; never shown to users.
    pub confidence: f32,
}

/// How many label annotations and web entities become candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateLimits {
    labels: usize,
    web_entities: usize,
}

impl Default for CandidateLimits {
    fn default() -> Self {
        Self {
            labels: Self::MAX_LABELS,
            web_entities: 3,
        }
    }
}

impl CandidateLimits {
    pub const MIN_LABELS: usize = 3;
    pub const MAX_LABELS: usize = 5;

    /// Label cap is clamped to `3..=5`.
    #[must_use]
    pub fn new(labels: usize, web_entities: usize) -> Self {
        Self {
            labels: labels.clamp(Self::MIN_LABELS, Self::MAX_LABELS),
            web_entities,
        }
    }

    #[must_use]
    pub fn labels(&self) -> usize {
        self.labels
    }

    #[must_use]
    pub fn web_entities(&self) -> usize {
        self.web_entities
    }
}

/// Best guess first, then the top labels by descending score, then the top web
/// entities. Blank labels are skipped and a label that normalizes to one
/// already seen keeps only its earlier position.
#[must_use]
pub fn candidates(response: &AnnotateImageResponse, limits: CandidateLimits) -> Vec<Candidate> {
    let web = response.web_detection.as_ref();

    let best_guess = web
        .and_then(|web| {
            web.best_guess_labels
                .iter()
                .find(|guess| !guess.label.trim().is_empty())
        })
        .map(|guess| Candidate {
            label: guess.label.trim().to_string(),
            source: CandidateSource::BestGuess,
            confidence: 1.0,
        });

    let mut labels: Vec<_> = response
        .label_annotations
        .iter()
        .filter(|label| !label.description.trim().is_empty())
        .collect();

    labels.sort_by(|a, b| b.score.total_cmp(&a.score));

    let labels = labels.into_iter().take(limits.labels).map(|label| Candidate {
        label: label.description.trim().to_string(),
        source: CandidateSource::Label,
        confidence: label.score.clamp(0.0, 1.0),
    });

    let mut entities: Vec<_> = web
        .map(|web| web.web_entities.iter().collect())
        .unwrap_or_default();

    entities.retain(|entity| !entity.description.trim().is_empty());
    entities.sort_by(|a, b| b.score.total_cmp(&a.score));

    let entities = entities
        .into_iter()
        .take(limits.web_entities)
        .map(|entity| Candidate {
            label: entity.description.trim().to_string(),
            source: CandidateSource::WebEntity,
            confidence: entity.score.clamp(0.0, 1.0),
        });

    let mut seen = FxHashSet::default();

    best_guess
        .into_iter()
        .chain(labels)
        .chain(entities)
        .filter(|candidate| seen.insert(normalize_label(&candidate.label)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{BestGuessLabel, LabelAnnotation, WebDetection, WebEntity};

    fn entity(description: &str, score: f32) -> WebEntity {
        WebEntity {
            description: description.to_string(),
            score,
        }
    }

    fn labels(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn priority_order_and_caps() {
        let response = AnnotateImageResponse {
            label_annotations: vec![
                LabelAnnotation::new("Plant", 0.70),
                LabelAnnotation::new("Vegetable", 0.96),
                LabelAnnotation::new("Natural foods", 0.91),
                LabelAnnotation::new("Produce", 0.88),
                LabelAnnotation::new("Local food", 0.80),
                LabelAnnotation::new("Superfood", 0.75),
            ],
            web_detection: Some(WebDetection {
                web_entities: vec![
                    entity("Cherry tomato", 0.9),
                    entity("Bush tomato", 1.4),
                    entity("Food", 0.5),
                    entity("Garden", 0.3),
                ],
                best_guess_labels: vec![BestGuessLabel {
                    label: "tomato".to_string(),
                }],
            }),
            error: None,
        };

        let candidates = candidates(&response, CandidateLimits::default());

        assert_eq!(
            labels(&candidates),
            [
                "tomato",
                "Vegetable",
                "Natural foods",
                "Produce",
                "Local food",
                "Superfood",
                "Bush tomato",
                "Cherry tomato",
                "Food",
            ]
        );

        let first = candidates.first().map(|c| (c.source, c.confidence));
        assert_eq!(first, Some((CandidateSource::BestGuess, 1.0)));

        let bush = candidates.iter().find(|c| c.label == "Bush tomato");
        assert_eq!(bush.map(|c| c.confidence), Some(1.0), "web scores are clamped");
    }

    #[test]
    fn duplicates_keep_first_position_and_blanks_are_skipped() {
        let response = AnnotateImageResponse {
            label_annotations: vec![
                LabelAnnotation::new("TOMATO", 0.9),
                LabelAnnotation::new("  ", 0.99),
            ],
            web_detection: Some(WebDetection {
                web_entities: vec![entity("tomato ", 0.8), entity("", 0.9)],
                best_guess_labels: vec![BestGuessLabel {
                    label: "Tomato".to_string(),
                }],
            }),
            error: None,
        };

        let candidates = candidates(&response, CandidateLimits::default());

        assert_eq!(labels(&candidates), ["Tomato"]);
    }

    #[test]
    fn label_cap_is_clamped() {
        assert_eq!(CandidateLimits::new(1, 3).labels(), 3);
        assert_eq!(CandidateLimits::new(9, 3).labels(), 5);
        assert_eq!(CandidateLimits::new(4, 3).labels(), 4);
    }
}
