//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, auth and upload sections. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.auth.enabled && self.auth.api_key.as_deref().map_or(true, str::is_empty) {
            warnings.push("auth is enabled but no api_key is set; every request will be rejected".into());
        }

        if !self.auth.enabled {
            warnings.push("auth is disabled; the admin API is open to anyone".into());
        }

        if self.uploads.target_width == 0 {
            warnings.push("uploads.target_width is 0; uploads cannot be resized".into());
        }

        if !(1..=100).contains(&self.uploads.jpeg_quality) {
            warnings.push(format!(
                "uploads.jpeg_quality {} is outside 1..=100",
                self.uploads.jpeg_quality
            ));
        }

        if self.uploads.name_length < 8 {
            warnings.push(format!(
                "uploads.name_length {} is too short to avoid collisions",
                self.uploads.name_length
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("./data/banners.db"),
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
        }
    }
}

/// Upload processing and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory the normalized files are written to.
    pub dir: PathBuf,
    /// Public path prefix under which `dir` is served.
    pub public_base: String,
    /// Width every stored image is normalized to.
    pub target_width: u32,
    /// Quality used when re-encoding to JPEG.
    pub jpeg_quality: u8,
    /// Largest accepted upload, in bytes.
    pub max_bytes: u64,
    /// Length of the random part of stored filenames.
    pub name_length: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static/upload"),
            public_base: "static/upload".into(),
            target_width: 200,
            jpeg_quality: 98,
            max_bytes: 10_000_000,
            name_length: 20,
        }
    }
}

impl UploadConfig {
    /// Public path of a stored file: `<public_base>/<file>`.
    pub fn public_path(&self, file: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), file)
    }
}
