//! Application settings.
//!
//! The settings file lives at `~/.config/gameshelf/settings.toml` unless a
//! path is given explicitly. Every field has a default, so a missing file
//! or a partial one is fine. A few environment variables override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest JWT signing secret accepted at startup.
pub const MIN_JWT_SECRET_LEN: usize = 32;
/// RAWG rejects larger pages.
pub const MAX_PAGE_SIZE: u32 = 40;
/// Longest token lifetime accepted: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Canonical path to the settings file: `~/.config/gameshelf/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("gameshelf").join("settings.toml")
}

fn default_database_path() -> PathBuf {
    let data = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    data.join("gameshelf").join("gameshelf.db")
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub catalog: CatalogSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    /// Browser origins allowed to call the API (CORS).
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Page size used when a search request does not name one.
    pub page_size: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: gameshelf_catalog::DEFAULT_BASE_URL.to_string(),
            timeout_secs: gameshelf_catalog::DEFAULT_TIMEOUT.as_secs(),
            page_size: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24 * 7,
        }
    }
}

impl Settings {
    /// Load settings from `explicit`, or from [`settings_path`] when `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let path = explicit.map(Path::to_path_buf).unwrap_or_else(settings_path);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if explicit.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        toml::from_str(&contents).map_err(|source| SettingsError::Parse { path, source })
    }

    /// Apply `GAMESHELF_BIND`, `GAMESHELF_DATABASE`, `ALLOWED_ORIGINS`
    /// (comma-separated) and `JWT_SECRET`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(bind) = lookup("GAMESHELF_BIND") {
            self.server.bind = bind;
        }
        if let Some(path) = lookup("GAMESHELF_DATABASE") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
    }

    /// Check values that would otherwise fail later at runtime.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.jwt_secret()?;
        if self.catalog.timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "catalog.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.catalog.page_size) {
            return Err(SettingsError::Invalid(format!(
                "catalog.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(SettingsError::Invalid(format!(
                "auth.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}"
            )));
        }
        if let Some(bad) = self
            .server
            .allowed_origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")) || o.ends_with('/'))
        {
            return Err(SettingsError::Invalid(format!(
                "server.allowed_origins entry {bad:?} must look like http(s)://host[:port]"
            )));
        }
        Ok(())
    }

    /// The JWT signing secret, if it is set and long enough.
    pub fn jwt_secret(&self) -> Result<&str, SettingsError> {
        match self.auth.jwt_secret.as_deref() {
            None => Err(SettingsError::Invalid(
                "auth.jwt_secret is not set (or set JWT_SECRET)".to_string(),
            )),
            Some(s) if s.len() < MIN_JWT_SECRET_LEN => Err(SettingsError::Invalid(format!(
                "auth.jwt_secret must be at least {MIN_JWT_SECRET_LEN} bytes"
            ))),
            Some(s) => Ok(s),
        }
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.timeout_secs)
    }

    /// Pretty TOML for display, with the JWT secret masked.
    pub fn to_display_string(&self) -> String {
        let mut shown = self.clone();
        if shown.auth.jwt_secret.is_some() {
            shown.auth.jwt_secret = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).unwrap_or_else(|e| format!("<unprintable: {e}>"))
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
