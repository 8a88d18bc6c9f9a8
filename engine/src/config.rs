//! TOML configuration.
//!
//! Loaded from `$BACKDESK_CONFIG` when set, otherwise from
//! `<config dir>/backdesk/config.toml`. A missing file yields the default
//! configuration; a malformed file is an error, not a silent fallback.
//!
//! ```toml
//! [api]
//! base_url = "https://accounts-api.example.com:8443/api/company"
//! api_key = "pk_live_..."
//!
//! [app]
//! page_size = 20
//! ascii_only = false
//! ```

use std::{env, fs, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Default, Deserialize)]
pub struct BackdeskConfig {
    pub api: Option<ApiConfig>,
    pub app: Option<AppConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid api.base_url {value:?}: {source}")]
    BaseUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("config is missing the [api] section (base_url and api_key are required)")]
    MissingApi,
}

#[derive(Default, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

// Manual Debug impl to prevent leaking the application key in logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    "[REDACTED]"
                } else {
                    "None"
                },
            )
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Rows per page for list screens. Defaults to 20.
    pub page_size: Option<u32>,
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Override the data directory used for session files.
    pub data_dir: Option<PathBuf>,
}

/// The validated settings the rest of the app consumes.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub api_key: String,
    pub page_size: u32,
    pub ascii_only: bool,
    pub high_contrast: bool,
    pub data_dir: Option<PathBuf>,
}

impl BackdeskConfig {
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var("BACKDESK_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("backdesk")
            .join("config.toml")
    }

    /// Load the config file, treating absence as defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.clone(),
                    source: e,
                })
            }
        };
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })
    }

    /// Validate into [`Settings`]. `BACKDESK_API_URL` / `BACKDESK_API_KEY`
    /// override the file for one-off runs.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let api = self.api.unwrap_or_default();
        let app = self.app.unwrap_or_default();

        let base_url = env::var("BACKDESK_API_URL")
            .ok()
            .or(api.base_url)
            .ok_or(ConfigError::MissingApi)?;
        let api_key = env::var("BACKDESK_API_KEY")
            .ok()
            .or(api.api_key)
            .ok_or(ConfigError::MissingApi)?;

        let base_url = Url::parse(&base_url).map_err(|e| ConfigError::BaseUrl {
            value: base_url,
            source: e,
        })?;

        Ok(Settings {
            base_url,
            api_key,
            page_size: app
                .page_size
                .unwrap_or(backdesk_types::PageRequest::DEFAULT_PAGE_SIZE),
            ascii_only: app.ascii_only,
            high_contrast: app.high_contrast,
            data_dir: app.data_dir,
        })
    }
}
