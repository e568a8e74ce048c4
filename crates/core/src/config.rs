//! Layered application configuration.
//!
//! Values come from built-in defaults, then `config.toml` under the user's
//! config directory, then `SHELFSYNC__*` environment variables
//! (e.g. `SHELFSYNC__METADATA__CLIENT_ID`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artwork::DEFAULT_PLACEHOLDER_URL;

/// Directory under the platform config/data dirs used by the application.
pub const APP_DIR: &str = "shelfsync";

const DEFAULT_CONFIG: &str = r#"# shelfsync configuration
#
# Every key is optional. Environment variables override this file, using
# the SHELFSYNC__ prefix and "__" between sections, for example
# SHELFSYNC__METADATA__CLIENT_SECRET.

# library_path = "/path/to/library.json"
# snapshot_path = "/path/to/games_export.json"

[metadata]
# client_id = ""
# client_secret = ""
token_url = "https://id.twitch.tv/oauth2/token"
search_url = "https://api.igdb.com/v4/games"
timeout_secs = 30

[artwork]
placeholder_url = "https://placehold.co/60x60.svg"
"#;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Library dump read by [`crate::library::JsonLibrary`].
    pub library_path: PathBuf,
    /// Destination of the exported snapshot.
    pub snapshot_path: PathBuf,
    /// Metadata service settings.
    pub metadata: MetadataConfig,
    /// Artwork fallback settings.
    pub artwork: ArtworkConfig,
}

/// Metadata service endpoints and client credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// OAuth client id; lookups are disabled when unset.
    pub client_id: Option<String>,
    /// OAuth client secret; lookups are disabled when unset.
    pub client_secret: Option<String>,
    /// Client-credentials token endpoint.
    pub token_url: String,
    /// Game search endpoint.
    pub search_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

/// Artwork fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkConfig {
    /// URL used when no artwork can be resolved.
    pub placeholder_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_root = data_root();
        Self {
            library_path: data_root.join("library.json"),
            snapshot_path: data_root.join("games_export.json"),
            metadata: MetadataConfig::default(),
            artwork: ArtworkConfig::default(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: "https://id.twitch.tv/oauth2/token".to_string(),
            search_url: "https://api.igdb.com/v4/games".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            placeholder_url: DEFAULT_PLACEHOLDER_URL.to_string(),
        }
    }
}

impl MetadataConfig {
    /// Whether both client credentials are set.
    pub fn has_credentials(&self) -> bool {
        let filled = |value: &Option<String>| {
            value
                .as_deref()
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
        };
        filled(&self.client_id) && filled(&self.client_secret)
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path`, which may be absent.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("SHELFSYNC").separator("__"))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }
}

/// Default configuration file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a commented default configuration if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    ensure_config_at(&path)?;
    Ok(path)
}

fn ensure_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}
