//! Vision API request and response shapes.

use serde::{Deserialize, Serialize};

/// How many results to request per detection feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionLimits {
    pub label_max_results: u32,
    pub web_max_results: u32,
}

impl Default for DetectionLimits {
    fn default() -> Self {
        Self {
            label_max_results: 15,
            web_max_results: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

impl AnnotateRequest {
    /// One image with label and web detection.
    #[must_use]
    pub fn labels_and_web(content: String, limits: DetectionLimits) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: Image { content },
                features: vec![
                    Feature {
                        kind: FeatureType::LabelDetection,
                        max_results: limits.label_max_results,
                    },
                    Feature {
                        kind: FeatureType::WebDetection,
                        max_results: limits.web_max_results,
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotateImageRequest {
    pub image: Image,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Image {
    /// Base64-encoded image bytes.
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub max_results: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    LabelDetection,
    WebDetection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

/// Annotations for one image. Every part is optional in the wire format.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub label_annotations: Vec<LabelAnnotation>,

    #[serde(default)]
    pub web_detection: Option<WebDetection>,

    /// Set instead of annotations when this image failed.
    #[serde(default)]
    pub error: Option<ApiStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LabelAnnotation {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub score: f32,

    #[serde(default)]
    pub topicality: f32,
}

impl LabelAnnotation {
    #[must_use]
    pub fn new(description: &str, score: f32) -> Self {
        Self {
            description: description.to_string(),
            score,
            topicality: score,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDetection {
    #[serde(default)]
    pub web_entities: Vec<WebEntity>,

    #[serde(default)]
    pub best_guess_labels: Vec<BestGuessLabel>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WebEntity {
    #[serde(default)]
    pub description: String,

    /// Relevance; not bounded to `[0, 1]`.
    #[serde(default)]
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BestGuessLabel {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub code: i32,

    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn request_uses_wire_names() -> TestResult {
        let request = AnnotateRequest::labels_and_web("aGk=".to_string(), DetectionLimits::default());

        let json = serde_json::to_value(&request)?;

        assert_eq!(
            json,
            serde_json::json!({
                "requests": [{
                    "image": { "content": "aGk=" },
                    "features": [
                        { "type": "LABEL_DETECTION", "maxResults": 15 },
                        { "type": "WEB_DETECTION", "maxResults": 10 }
                    ]
                }]
            })
        );

        Ok(())
    }

    #[test]
    fn sparse_response_parses() -> TestResult {
        let response: AnnotateResponse = serde_json::from_str(
            r#"{"responses":[{"webDetection":{"bestGuessLabels":[{"label":"tomato","languageCode":"en"}]}}]}"#,
        )?;

        let image = response.responses.first().ok_or("no response")?;

        assert!(image.label_annotations.is_empty());
        assert_eq!(
            image
                .web_detection
                .as_ref()
                .and_then(|web| web.best_guess_labels.first())
                .map(|guess| guess.label.as_str()),
            Some("tomato")
        );

        Ok(())
    }
}
