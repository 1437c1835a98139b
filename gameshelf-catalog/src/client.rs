use std::time::Duration;

use gameshelf_core::{CatalogGame, GameId};
use serde::de::DeserializeOwned;

use crate::error::CatalogError;
use crate::types::{CatalogPage, RawgGame, RawgSearchResponse, genre_slug};

pub const DEFAULT_BASE_URL: &str = "https://api.rawg.io/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the RAWG API with a bounded per-request timeout.
#[derive(Clone)]
pub struct RawgClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for RawgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawgClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RawgClient {
    pub fn new(api_key: String) -> Result<Self, CatalogError> {
        Self::with_options(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client against a specific base URL (tests point this at a
    /// local listener).
    pub fn with_options(
        api_key: String,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        if api_key.trim().is_empty() {
            return Err(CatalogError::Config("RAWG API key is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gameshelf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search the catalog. `page` is 1-based.
    pub async fn search(
        &self,
        term: &str,
        page: u32,
        page_size: u32,
    ) -> Result<CatalogPage, CatalogError> {
        let query = [
            ("search", term.to_string()),
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        let response: RawgSearchResponse = self.get_json("games", &query, term).await?;
        Ok(response.into())
    }

    /// Fetch one game's full record.
    pub async fn details(&self, id: GameId) -> Result<CatalogGame, CatalogError> {
        let game: RawgGame = self
            .get_json(&format!("games/{id}"), &[], &id.to_string())
            .await?;
        Ok(game.into())
    }

    /// Other games in the same series.
    pub async fn game_series(
        &self,
        id: GameId,
        page_size: u32,
    ) -> Result<CatalogPage, CatalogError> {
        let query = [("page_size", page_size.to_string())];
        let response: RawgSearchResponse = self
            .get_json(&format!("games/{id}/game-series"), &query, &id.to_string())
            .await?;
        Ok(response.into())
    }

    /// Highest-rated games in any of `genres` (display names).
    pub async fn top_rated_in_genres(
        &self,
        genres: &[String],
        page_size: u32,
    ) -> Result<CatalogPage, CatalogError> {
        let slugs: Vec<String> = genres.iter().map(|g| genre_slug(g)).collect();
        let slugs = slugs.join(",");
        let query = [
            ("genres", slugs.clone()),
            ("ordering", "-rating".to_string()),
            ("page_size", page_size.to_string()),
        ];
        let response: RawgSearchResponse = self.get_json("games", &query, &slugs).await?;
        Ok(response.into())
    }

    /// GET `{base_url}/{path}` and decode the JSON body. `what` names the
    /// resource in a `NotFound` error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("RAWG GET {} {:?}", url, query);

        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(what.to_string()));
        }
        let text = resp.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: truncate(&text, 200).to_string(),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    fn classify(&self, err: reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            CatalogError::Timeout(self.timeout)
        } else {
            CatalogError::Http(err)
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
