//! Tool configuration.
//!
//! Handles loading and validating `posterflow.toml`. Config files are
//! sparse — override just the values you want; everything else falls back
//! to a documented default. Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [oauth]
//! client_id = ""                  # Google OAuth client id (required for auth)
//! client_secret = ""              # or set GOOGLE_CLIENT_SECRET in the environment
//! redirect_uri = "http://127.0.0.1:5001/callback"
//! auth_url = "https://accounts.google.com/o/oauth2/auth"
//! token_url = "https://oauth2.googleapis.com/token"
//! tokeninfo_url = "https://oauth2.googleapis.com/tokeninfo"
//! userinfo_url = "https://www.googleapis.com/oauth2/v2/userinfo"
//! scopes = [... profile, email, openid, drive.file ...]
//!
//! [drive]
//! folder_id = ""                  # Destination folder (required for upload)
//! upload_url = "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart"
//!
//! [openai]
//! api_key = ""                    # or set OPENAI_API_KEY in the environment
//! base_url = "https://api.openai.com/v1"
//! text_model = "gpt-4o-mini"
//! image_model = "dall-e-3"
//!
//! [storage]
//! db_path = "users.db"            # Credential store location
//! state_path = "oauth_state.txt"  # Anti-forgery state file for the helper
//!
//! [http]
//! timeout_secs = 10               # Applied to every remote call
//!
//! [print]
//! quality = 95                    # JPEG quality for print variants
//!
//! [[print.targets]]               # Override to change the export set
//! name = "Large"
//! width = 3508
//! height = 4961
//! # ... Medium 2480x3508, Small 1748x2480
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::imaging::{PrintTarget, default_targets};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing configuration: {0}")]
    Missing(String),
}

/// Top-level configuration loaded from `posterflow.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub oauth: OAuthConfig,
    pub drive: DriveConfig,
    pub openai: OpenAiConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub print: PrintConfig,
}

/// OAuth client identity and endpoint set.
///
/// Client id/secret are process-wide static configuration, not per-user
/// state — every stored identity shares them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub tokeninfo_url: String,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://127.0.0.1:5001/callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            scopes: vec![
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
                "openid".to_string(),
                "https://www.googleapis.com/auth/drive.file".to_string(),
            ],
        }
    }
}

impl OAuthConfig {
    /// Client secret with environment override (`GOOGLE_CLIENT_SECRET`).
    pub fn resolved_client_secret(&self) -> String {
        std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_else(|_| self.client_secret.clone())
    }
}

/// Google Drive upload destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriveConfig {
    /// Destination folder id. Empty = uploads fail fast before any network I/O.
    pub folder_id: String,
    pub upload_url: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            folder_id: String::new(),
            upload_url: "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart"
                .to_string(),
        }
    }
}

/// Hosted text/image generation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            text_model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
        }
    }
}

impl OpenAiConfig {
    /// API key with environment override (`OPENAI_API_KEY`).
    pub fn resolved_api_key(&self) -> Result<String, ConfigError> {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                return Ok(key);
            }
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing(
                "openai.api_key (or the OPENAI_API_KEY environment variable)".to_string(),
            ));
        }
        Ok(self.api_key.clone())
    }
}

/// Local state locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("users.db"),
            state_path: PathBuf::from("oauth_state.txt"),
        }
    }
}

/// HTTP client behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Explicit timeout on every remote call. Required hardening — the
    /// default client timeout is not relied on.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Print export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrintConfig {
    /// JPEG quality for print variants (1-100).
    pub quality: u8,
    /// Fixed target set, walked in order at export time.
    pub targets: Vec<PrintTarget>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            targets: default_targets(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from `posterflow.toml` in the working
    /// directory if present, else stock defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Path::new("posterflow.toml");
        if default_path.exists() {
            return Self::load(default_path);
        }
        Ok(Self::default())
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.print.quality == 0 || self.print.quality > 100 {
            return Err(ConfigError::Validation(
                "print.quality must be 1-100".into(),
            ));
        }
        if self.print.targets.is_empty() {
            return Err(ConfigError::Validation(
                "print.targets must not be empty".into(),
            ));
        }
        for target in &self.print.targets {
            if target.width == 0 || target.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "print target '{}' has a zero dimension",
                    target.name
                )));
            }
        }
        let mut names: Vec<&str> = self.print.targets.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.print.targets.len() {
            return Err(ConfigError::Validation(
                "print target names must be unique".into(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// The OAuth client identity, failing fast when unconfigured.
    pub fn require_oauth_client(&self) -> Result<(), ConfigError> {
        if self.oauth.client_id.is_empty() {
            return Err(ConfigError::Missing("oauth.client_id".to_string()));
        }
        if self.oauth.resolved_client_secret().is_empty() {
            return Err(ConfigError::Missing(
                "oauth.client_secret (or GOOGLE_CLIENT_SECRET)".to_string(),
            ));
        }
        Ok(())
    }
}

/// A documented stock `posterflow.toml`, printed by `posterflow gen-config`.
pub fn stock_config_toml() -> String {
    let stock = AppConfig::default();
    // Serialization of the defaults is the single source of truth; the
    // header comment explains the sparse-override model.
    let body = toml::to_string_pretty(&stock).unwrap_or_default();
    format!(
        "# posterflow configuration\n\
         #\n\
         # Every key is optional; this file shows the stock defaults.\n\
         # Delete anything you don't want to override.\n\
         #\n\
         # Secrets may come from the environment instead:\n\
         #   GOOGLE_CLIENT_SECRET overrides oauth.client_secret\n\
         #   OPENAI_API_KEY overrides openai.api_key\n\n{body}"
    )
}
