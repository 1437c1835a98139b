//! Data model types for a GameShelf library.
//!
//! These types represent the persistent schema: users, locally cached catalog
//! games, library entries (one user's relationship to one game), and follows.
//! Wire form is camelCase JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type UserId = i64;
/// Catalog id assigned by the external provider, never generated locally.
pub type GameId = i64;

// ── User ────────────────────────────────────────────────────────────────────

/// A registered account. The password credential is deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub preferences: BTreeMap<String, String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public face of a user in search results and follow lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

/// Registration input after the password has been hashed.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Partial profile edit. Omitted fields are left alone; an explicit `null`
/// clears `bio` or `avatar`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub avatar: Option<Option<String>>,
    #[serde(default)]
    pub preferences: Option<BTreeMap<String, String>>,
}

// ── Game ────────────────────────────────────────────────────────────────────

/// A catalog record as delivered by the provider, before it is cached locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGame {
    pub id: GameId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Aggregate rating from the provider. Not authoritative.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// A game cached in the local store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub slug: Option<String>,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub background_image: Option<String>,
    pub description: Option<String>,
    pub developers: Vec<String>,
    pub website: Option<String>,
    /// Last time metadata was copied from the provider.
    pub synced_at: DateTime<Utc>,
}

impl From<Game> for CatalogGame {
    fn from(game: Game) -> Self {
        Self {
            id: game.id,
            name: game.name,
            slug: game.slug,
            genres: game.genres,
            platforms: game.platforms,
            release_date: game.release_date,
            rating: game.rating,
            background_image: game.background_image,
            description: game.description,
            developers: game.developers,
            website: game.website,
        }
    }
}

// ── Library Entry ───────────────────────────────────────────────────────────

/// Where a user is with a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayStatus {
    #[default]
    PlanToPlay,
    Playing,
    Completed,
    OnHold,
    Dropped,
    Abandoned,
}

impl PlayStatus {
    pub const ALL: [PlayStatus; 6] = [
        Self::PlanToPlay,
        Self::Playing,
        Self::Completed,
        Self::OnHold,
        Self::Dropped,
        Self::Abandoned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanToPlay => "plan-to-play",
            Self::Playing => "playing",
            Self::Completed => "completed",
            Self::OnHold => "on-hold",
            Self::Dropped => "dropped",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for PlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown play status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for PlayStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// One user's relationship to one game, keyed by `(user_id, game_id)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub user_id: UserId,
    pub game_id: GameId,
    pub status: PlayStatus,
    pub personal_rating: Option<f64>,
    pub review: Option<String>,
    pub hours_played: Option<f64>,
    pub completion_percentage: Option<f64>,
    pub difficulty: Option<u8>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_played_at: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    pub is_recommended: bool,
    pub play_count: u32,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LibraryEntry {
    /// Days between `started_at` and `completed_at`, rounded up.
    pub fn play_duration_days(&self) -> Option<i64> {
        crate::library::play_duration_days(self.started_at, self.completed_at)
    }
}

/// A library entry joined with the game it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub game: Game,
    pub entry: LibraryEntry,
    pub play_duration_days: Option<i64>,
}

impl LibraryItem {
    pub fn new(game: Game, entry: LibraryEntry) -> Self {
        let play_duration_days = entry.play_duration_days();
        Self {
            game,
            entry,
            play_duration_days,
        }
    }
}

/// A community review shown on a game's page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReview {
    pub user_id: UserId,
    pub username: String,
    pub rating: Option<f64>,
    pub review: String,
    pub updated_at: DateTime<Utc>,
}

// ── Follow ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub follower_id: UserId,
    pub followee_id: UserId,
    pub created_at: DateTime<Utc>,
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Distinguishes an omitted field (`None`) from an explicit `null`
/// (`Some(None)`). Pair with `#[serde(default)]`.
pub(crate) mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
