//! Vision API client.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use mockall::automock;
use reqwest::Client;
use tracing::{debug, trace};

use crate::{
    auth::SecretToken,
    retry::RetryPolicy,
    vision::{
        AnnotateImageResponse, AnnotateRequest, AnnotateResponse, DetectionLimits, VisionError,
    },
};

/// Default vision API base URL.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

/// Base64-encode raw image bytes for an annotate request.
#[must_use]
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Image annotation.
#[automock]
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Run label and web detection on one base64-encoded image.
    async fn annotate(&self, image_base64: &str) -> Result<AnnotateImageResponse, VisionError>;
}

#[derive(Debug, Clone)]
pub struct HttpVisionClient {
    endpoint: String,
    api_key: SecretToken,
    limits: DetectionLimits,
    http: Client,
    retry: RetryPolicy,
}

impl HttpVisionClient {
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        api_key: SecretToken,
        limits: DetectionLimits,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            limits,
            http: Client::new(),
            retry,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/images:annotate",
            self.endpoint.trim_end_matches('/')
        )
    }

    async fn send(&self, request: &AnnotateRequest) -> Result<AnnotateResponse, VisionError> {
        let response = self
            .http
            .post(self.url())
            .query(&[("key", self.api_key.expose())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(VisionError::Status {
                status: status.as_u16(),
                message: text.trim().to_string(),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl VisionClient for HttpVisionClient {
    #[tracing::instrument(name = "vision.client.annotate", skip_all, err)]
    async fn annotate(&self, image_base64: &str) -> Result<AnnotateImageResponse, VisionError> {
        if self.api_key.is_empty() {
            return Err(VisionError::MissingApiKey);
        }

        let request = AnnotateRequest::labels_and_web(image_base64.to_string(), self.limits);
        let request = &request;

        trace!(bytes = image_base64.len(), "sending annotate request");

        let response = self
            .retry
            .run(move || async move { self.send(request).await })
            .await?;

        let image = response
            .responses
            .into_iter()
            .next()
            .ok_or(VisionError::EmptyResponse)?;

        if let Some(error) = image.error {
            return Err(VisionError::Api {
                code: error.code,
                message: error.message,
            });
        }

        debug!(
            labels = image.label_annotations.len(),
            web = image.web_detection.is_some(),
            "image annotated"
        );

        Ok(image)
    }
}
