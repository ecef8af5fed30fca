//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// On-device storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory for the session and the local cart mirror
    #[arg(long, env = "SCANCART_DATA_DIR", default_value = ".scancart")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Where credentials are kept; readable only by the current user.
    #[must_use]
    pub fn secure_dir(&self) -> PathBuf {
        self.data_dir.join("secure")
    }
}
