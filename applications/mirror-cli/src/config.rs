/// Command line configuration
use mirror_sync::SyncOptions;
use mirror_tumblr::TumblrConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "mirror.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MirrorConfig {
    #[serde(default)]
    pub tumblr: TumblrConfig,

    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncSettings {
    /// Slots in each result channel; 1 keeps the engine in lockstep with the consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl MirrorConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `mirror.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables, e.g. MIRROR_TUMBLR__API_KEY
        settings = settings.add_source(
            config::Environment::with_prefix("MIRROR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tumblr.api_key.is_empty() {
            return Err(ConfigError::Invalid(
                "Tumblr API key is required (set MIRROR_TUMBLR__API_KEY)".to_string(),
            ));
        }

        if self.sync.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "sync.channel_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::default().with_channel_capacity(self.sync.channel_capacity)
    }
}

fn default_channel_capacity() -> usize {
    1
}
