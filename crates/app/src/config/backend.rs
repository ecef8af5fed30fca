//! Backend Config

use clap::Args;

use crate::{auth::SecretToken, rest::RestConfig};

/// Hosted backend settings. Without both values the app runs offline against
/// the bundled catalog.
#[derive(Debug, Args)]
pub struct BackendConfig {
    /// Backend project URL
    #[arg(long, env = "SCANCART_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Backend anonymous API key
    #[arg(long, env = "SCANCART_ANON_KEY", hide_env_values = true)]
    pub anon_key: Option<String>,
}

impl BackendConfig {
    /// REST client configuration, or `None` when the backend is not configured.
    #[must_use]
    pub fn rest_config(&self) -> Option<RestConfig> {
        let url = self.backend_url.as_deref().map(str::trim)?;
        let anon_key = self.anon_key.as_deref().map(str::trim)?;

        if url.is_empty() || anon_key.is_empty() {
            return None;
        }

        Some(RestConfig {
            url: url.trim_end_matches('/').to_string(),
            anon_key: SecretToken::new(anon_key),
        })
    }
}
