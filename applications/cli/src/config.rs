/// CLI configuration
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tandem_playback::{PlaybackConfig, RepeatMode};
use tandem_server_client::{ServerConfig, DEFAULT_SERVER_URL};

/// File read when no `--config` is given, if it exists
pub const DEFAULT_CONFIG_FILE: &str = "tandem.toml";

/// Prefix of environment overrides (`TANDEM_SERVER_URL`, `TANDEM_PLAYBACK_VOLUME`, ...)
pub const ENV_PREFIX: &str = "TANDEM";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_url")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default)]
    pub repeat: RepeatMode,

    #[serde(default)]
    pub shuffle: bool,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `tandem.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            path,
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("_")
                .try_parsing(true),
        )
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Environment beats the file
        settings = settings.add_source(env);

        let config = settings.build().context("failed to read configuration")?;
        config
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, server: Option<String>, volume: Option<f32>) {
        if let Some(url) = server {
            self.server.url = url;
        }
        if let Some(volume) = volume {
            self.playback.volume = volume;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let volume = self.playback.volume;
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            bail!("volume must be between 0.0 and 1.0, got {}", volume);
        }

        self.server_config()
            .base_url()
            .with_context(|| format!("invalid server URL '{}'", self.server.url))?;

        Ok(())
    }

    /// Settings for the HTTP client and stream URLs
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.server.url.clone())
    }

    /// Settings for the queue and engines
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            volume: self.playback.volume,
            shuffle: self.playback.shuffle,
            repeat: self.playback.repeat,
        }
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings { url: default_url() }
}

fn default_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        volume: default_volume(),
        repeat: RepeatMode::Off,
        shuffle: false,
    }
}

fn default_volume() -> f32 {
    1.0
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            playback: default_playback(),
        }
    }
}
