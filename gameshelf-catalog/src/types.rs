use chrono::NaiveDate;
use gameshelf_core::CatalogGame;
use serde::{Deserialize, Serialize};

/// One page of catalog search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub games: Vec<CatalogGame>,
    /// Total matches across all pages, as reported by the provider.
    pub total: u64,
}

/// Response from `GET /games`.
#[derive(Debug, Deserialize)]
pub struct RawgSearchResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<RawgGame>,
}

/// A game as RAWG returns it, in both list and detail responses. Detail
/// responses additionally carry `description_raw`, `developers` and
/// `website`.
#[derive(Debug, Deserialize, Clone)]
pub struct RawgGame {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub description_raw: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<NamedRef>>,
    #[serde(default)]
    pub platforms: Option<Vec<PlatformEntry>>,
    #[serde(default)]
    pub developers: Option<Vec<NamedRef>>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformEntry {
    pub platform: NamedRef,
}

/// Parse RAWG's `released` field. Unparseable dates (RAWG occasionally sends
/// partial ones) are dropped rather than failing the whole record.
fn parse_release_date(released: Option<&str>) -> Option<NaiveDate> {
    let text = released?.trim();
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            log::debug!("Ignoring unparseable release date '{}'", text);
            None
        }
    }
}

impl From<RawgGame> for CatalogGame {
    fn from(game: RawgGame) -> Self {
        let release_date = parse_release_date(game.released.as_deref());
        Self {
            id: game.id,
            name: game.name,
            slug: game.slug,
            genres: game
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(|g| g.name)
                .collect(),
            platforms: game
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|p| p.platform.name)
                .collect(),
            release_date,
            rating: game.rating,
            background_image: game.background_image,
            description: game.description_raw.filter(|d| !d.trim().is_empty()),
            developers: game
                .developers
                .unwrap_or_default()
                .into_iter()
                .map(|d| d.name)
                .collect(),
            website: game.website.filter(|w| !w.trim().is_empty()),
        }
    }
}

/// RAWG filters by genre slug: "Massively Multiplayer" -> "massively-multiplayer".
pub fn genre_slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl From<RawgSearchResponse> for CatalogPage {
    fn from(response: RawgSearchResponse) -> Self {
        Self {
            games: response.results.into_iter().map(CatalogGame::from).collect(),
            total: response.count,
        }
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
