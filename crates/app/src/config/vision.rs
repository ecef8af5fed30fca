//! Vision Config

use clap::Args;

use crate::{
    auth::SecretToken,
    recognition::{CandidateLimits, VisionFallback},
    vision::{DEFAULT_VISION_ENDPOINT, DetectionLimits},
};

/// Behaviour when the vision request fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum FallbackMode {
    /// Report the failure.
    Propagate,

    /// Continue with the fixed sample annotations.
    Sample,
}

impl From<FallbackMode> for VisionFallback {
    fn from(mode: FallbackMode) -> Self {
        match mode {
            FallbackMode::Propagate => Self::Propagate,
            FallbackMode::Sample => Self::Sample,
        }
    }
}

/// Vision API settings.
#[derive(Debug, Args)]
pub struct VisionConfig {
    /// Vision API key
    #[arg(long, env = "VISION_API_KEY", hide_env_values = true)]
    pub vision_api_key: Option<String>,

    /// Vision API base URL
    #[arg(long, env = "VISION_ENDPOINT", default_value = DEFAULT_VISION_ENDPOINT)]
    pub vision_endpoint: String,

    /// Label annotations requested per image
    #[arg(long, env = "VISION_LABEL_MAX_RESULTS", default_value_t = 15_u32)]
    pub label_max_results: u32,

    /// Web entities requested per image
    #[arg(long, env = "VISION_WEB_MAX_RESULTS", default_value_t = 10_u32)]
    pub web_max_results: u32,

    /// Label annotations tried against the catalog (3 to 5)
    #[arg(long, env = "VISION_LABEL_CANDIDATES", default_value_t = 5_usize)]
    pub label_candidates: usize,

    /// Web entities tried against the catalog
    #[arg(long, env = "VISION_WEB_CANDIDATES", default_value_t = 3_usize)]
    pub web_candidates: usize,

    /// What to do when the vision request fails
    #[arg(
        long,
        env = "VISION_FALLBACK",
        value_enum,
        default_value_t = FallbackMode::Propagate
    )]
    pub vision_fallback: FallbackMode,
}

impl VisionConfig {
    /// The API key, empty when unset.
    #[must_use]
    pub fn api_key(&self) -> SecretToken {
        SecretToken::new(self.vision_api_key.as_deref().map_or("", str::trim))
    }

    #[must_use]
    pub fn detection_limits(&self) -> DetectionLimits {
        DetectionLimits {
            label_max_results: self.label_max_results,
            web_max_results: self.web_max_results,
        }
    }

    #[must_use]
    pub fn candidate_limits(&self) -> CandidateLimits {
        CandidateLimits::new(self.label_candidates, self.web_candidates)
    }
}
