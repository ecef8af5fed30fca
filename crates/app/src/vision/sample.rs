//! Fixed sample annotations.
//!
//! Used for manual runs without an API key, and as the substitute result when
//! the vision API fails and the sample fallback is enabled.

use async_trait::async_trait;

use crate::vision::{AnnotateImageResponse, LabelAnnotation, VisionClient, VisionError};

/// Labels for a photo of fruit: `Banana`, `Apple`, `Fruit`.
#[must_use]
pub fn sample_response() -> AnnotateImageResponse {
    AnnotateImageResponse {
        label_annotations: vec![
            LabelAnnotation::new("Banana", 0.95),
            LabelAnnotation::new("Apple", 0.89),
            LabelAnnotation::new("Fruit", 0.85),
        ],
        web_detection: None,
        error: None,
    }
}

/// A vision client that ignores the image and returns [`sample_response`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleVisionClient;

#[async_trait]
impl VisionClient for SampleVisionClient {
    async fn annotate(&self, _image_base64: &str) -> Result<AnnotateImageResponse, VisionError> {
        Ok(sample_response())
    }
}
