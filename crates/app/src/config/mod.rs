//! Application configuration

use clap::Args;

pub mod backend;
pub mod cart;
pub mod observability;
pub mod retry;
pub mod storage;
pub mod vision;

pub use backend::BackendConfig;
pub use cart::CartConfig;
pub use observability::{LogFormat, LoggingConfig};
pub use retry::RetryConfig;
pub use storage::StorageConfig;
pub use vision::{FallbackMode, VisionConfig};

/// Everything needed to build an [`AppContext`](crate::context::AppContext).
///
/// Every value can come from the environment, and a `.env` file in the working
/// directory is loaded first.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Hosted backend settings.
    #[command(flatten)]
    pub backend: BackendConfig,

    /// Vision API settings.
    #[command(flatten)]
    pub vision: VisionConfig,

    /// On-device storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Cart and catalog cache settings.
    #[command(flatten)]
    pub cart: CartConfig,

    /// Outbound retry settings.
    #[command(flatten)]
    pub retry: RetryConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Load `.env` if present.
pub fn load_dotenv() {
    _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        config: AppConfig,
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let harness = Harness::try_parse_from([
            "scancart",
            "--backend-url",
            "https://abc.example.co",
            "--anon-key",
            "anon",
            "--data-dir",
            "/tmp/scancart",
            "--add-debounce-ms",
            "250",
            "--label-candidates",
            "9",
            "--vision-fallback",
            "sample",
            "--log-format",
            "json",
        ])?;

        let config = harness.config;

        let rest = config.backend.rest_config().ok_or("backend configured")?;

        assert_eq!(rest.url, "https://abc.example.co");
        assert_eq!(rest.anon_key.expose(), "anon");
        assert_eq!(config.storage.data_dir, Path::new("/tmp/scancart"));
        assert_eq!(config.cart.add_debounce(), Duration::from_millis(250));
        assert_eq!(config.vision.candidate_limits().labels(), 5);
        assert_eq!(config.vision.vision_fallback, FallbackMode::Sample);
        assert!(matches!(config.logging.log_format, LogFormat::Json));

        Ok(())
    }

    #[test]
    fn backend_needs_url_and_key() {
        let backend = BackendConfig {
            backend_url: Some("https://abc.example.co".to_string()),
            anon_key: None,
        };

        assert!(backend.rest_config().is_none());

        let backend = BackendConfig {
            backend_url: Some("  ".to_string()),
            anon_key: Some("anon".to_string()),
        };

        assert!(backend.rest_config().is_none());
    }
}
