use std::path::{Path, PathBuf};

use crate::error::CatalogError;

const API_KEY_ENV: &str = "RAWG_API_KEY";

/// Where the RAWG API key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    /// Loaded from an environment variable.
    EnvVar(&'static str),
    /// Loaded from the credentials file.
    ConfigFile,
    /// Not set anywhere.
    Missing,
}

impl std::fmt::Display for ApiKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// TOML credentials file format.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct CredentialsFile {
    rawg: Option<RawgSection>,
}

#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct RawgSection {
    api_key: Option<String>,
}

/// Return the path to the credentials file.
pub fn credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gameshelf").join("credentials.toml"))
}

/// Load the RAWG API key.
///
/// Priority: `$RAWG_API_KEY` > `[rawg] api_key` in the credentials file.
pub fn load_api_key() -> Result<String, CatalogError> {
    let file_key = credentials_path().and_then(|p| read_file_key(&p));
    resolve(std::env::var(API_KEY_ENV).ok(), file_key).0.ok_or_else(|| {
        CatalogError::Config(format!(
            "Missing RAWG API key. Set {} or add [rawg] api_key to the credentials file",
            API_KEY_ENV
        ))
    })
}

/// Determine where the API key is coming from.
pub fn api_key_source() -> ApiKeySource {
    let file_key = credentials_path().and_then(|p| read_file_key(&p));
    resolve(std::env::var(API_KEY_ENV).ok(), file_key).1
}

/// Write the API key to the credentials file, creating parent directories
/// as needed. Returns the path written.
pub fn save_api_key(api_key: &str) -> Result<PathBuf, CatalogError> {
    let path = credentials_path().ok_or_else(|| {
        CatalogError::Config("Could not determine config directory".to_string())
    })?;
    write_file_key(&path, api_key)?;
    Ok(path)
}

fn resolve(env_key: Option<String>, file_key: Option<String>) -> (Option<String>, ApiKeySource) {
    let non_empty = |k: &String| !k.trim().is_empty();
    if let Some(key) = env_key.filter(non_empty) {
        (Some(key), ApiKeySource::EnvVar(API_KEY_ENV))
    } else if let Some(key) = file_key.filter(non_empty) {
        (Some(key), ApiKeySource::ConfigFile)
    } else {
        (None, ApiKeySource::Missing)
    }
}

fn read_file_key(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let file: CredentialsFile = match toml::from_str(&content) {
        Ok(file) => file,
        Err(e) => {
            log::warn!("Ignoring unreadable credentials file {}: {}", path.display(), e);
            return None;
        }
    };
    file.rawg?.api_key
}

fn write_file_key(path: &Path, api_key: &str) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = CredentialsFile {
        rawg: Some(RawgSection {
            api_key: Some(api_key.to_string()),
        }),
    };
    let toml_str = toml::to_string_pretty(&file)
        .map_err(|e| CatalogError::Config(format!("Failed to serialize credentials: {}", e)))?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/credentials_tests.rs"]
mod tests;
