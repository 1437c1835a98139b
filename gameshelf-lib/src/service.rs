//! The library service: every operation the HTTP layer exposes.
//!
//! Catalog calls always happen before any write, so an upstream failure
//! never leaves partial rows behind.

use chrono::Utc;
use gameshelf_catalog::{CatalogPage, CatalogProvider};
use gameshelf_core::{
    CatalogGame, Follow, GameId, GameReview, LibraryEntry, LibraryEntryPatch, LibraryItem,
    NewUser, PlayStatus, ProfileUpdate, User, UserId, UserProfile, UserSummary, ValidationError,
};
use gameshelf_db::OperationError;
use rusqlite::Connection;
use serde::Serialize;

use crate::error::ServiceError;
use crate::settings::MAX_PAGE_SIZE;
use crate::store::Store;

/// Maximum results for a user search.
pub const USER_SEARCH_LIMIT: usize = 10;

const DEFAULT_PAGE_SIZE: u32 = 12;
/// Most games returned by [`LibraryService::related_games`].
pub const RELATED_LIMIT: usize = 6;
/// Genre candidates fetched, leaving room to drop the game itself.
const RELATED_FETCH: u32 = 8;
/// Genres of the source game used for the fallback lookup.
const RELATED_GENRES: usize = 2;
const DUPLICATE_ENTRY: &str = "Game already exists in your library";
const BAD_LOGIN: &str = "Invalid username or password";

/// Everything shown on a game's page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePage {
    pub game: CatalogGame,
    pub reviews: Vec<GameReview>,
    pub average_rating: Option<f64>,
    /// The viewer's own library entry, when signed in and present.
    pub user_entry: Option<LibraryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReviews {
    pub reviews: Vec<GameReview>,
    pub average_rating: Option<f64>,
}

/// Games worth showing next to another one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelatedGames {
    pub games: Vec<CatalogGame>,
}

pub struct LibraryService<P> {
    store: Store,
    catalog: P,
    bcrypt_cost: u32,
    default_page_size: u32,
}

fn missing_game(game_id: GameId) -> OperationError {
    OperationError::NotFound {
        entity_type: "game".to_string(),
        id: game_id.to_string(),
    }
}

fn require_user(conn: &Connection, user_id: UserId) -> Result<User, OperationError> {
    gameshelf_db::get_user(conn, user_id)?.ok_or_else(|| OperationError::NotFound {
        entity_type: "user".to_string(),
        id: user_id.to_string(),
    })
}

fn check_game_id(game_id: GameId) -> Result<(), ValidationError> {
    if game_id <= 0 {
        return Err(ValidationError::single("gameId", "must be a positive integer"));
    }
    Ok(())
}

/// The entry plus its cached game, read on the same connection.
fn library_item(conn: &Connection, entry: LibraryEntry) -> Result<LibraryItem, OperationError> {
    let game = gameshelf_db::get_game(conn, entry.game_id)?
        .ok_or_else(|| missing_game(entry.game_id))?;
    Ok(LibraryItem::new(game, entry))
}

impl<P: CatalogProvider> LibraryService<P> {
    pub fn new(store: Store, catalog: P) -> Self {
        Self {
            store,
            catalog,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the bcrypt work factor (tests use the minimum).
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Page size for catalog searches that do not name one.
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn catalog(&self) -> &P {
        &self.catalog
    }

    // ── Library ─────────────────────────────────────────────────────────

    /// Add a game to a user's library, fetching it from the catalog first if
    /// it has never been cached.
    pub async fn add_game(
        &self,
        user_id: UserId,
        game_id: GameId,
        status: Option<PlayStatus>,
    ) -> Result<LibraryItem, ServiceError> {
        check_game_id(game_id)?;

        let (user_known, already_added, cached) = self
            .store
            .call(move |conn| {
                Ok((
                    gameshelf_db::get_user(conn, user_id)?.is_some(),
                    gameshelf_db::get_entry(conn, user_id, game_id)?.is_some(),
                    gameshelf_db::get_game(conn, game_id)?.is_some(),
                ))
            })
            .await?;
        if !user_known {
            return Err(ServiceError::not_found("User not found"));
        }
        if already_added {
            return Err(ServiceError::Conflict(DUPLICATE_ENTRY.to_string()));
        }

        let record = if cached {
            None
        } else {
            Some(self.catalog.details(game_id).await?)
        };

        let now = Utc::now();
        let item = self
            .store
            .call(move |conn| {
                let entry = match record {
                    Some(record) => {
                        gameshelf_db::add_to_library(conn, user_id, &record, status, now)?
                    }
                    None => gameshelf_db::add_entry(conn, user_id, game_id, status, now)?,
                };
                library_item(conn, entry)
            })
            .await?;
        log::info!(
            "User {} added game {} ({}) as {}",
            user_id,
            game_id,
            item.game.name,
            item.entry.status
        );
        Ok(item)
    }

    /// Apply a partial update. Validation runs before anything is written.
    pub async fn update_entry(
        &self,
        user_id: UserId,
        game_id: GameId,
        patch: LibraryEntryPatch,
    ) -> Result<LibraryItem, ServiceError> {
        patch.validate()?;
        let now = Utc::now();
        self.store
            .call(move |conn| {
                let entry = gameshelf_db::update_entry(conn, user_id, game_id, &patch, now)?;
                library_item(conn, entry)
            })
            .await
    }

    pub async fn remove_entry(&self, user_id: UserId, game_id: GameId) -> Result<(), ServiceError> {
        self.store
            .call(move |conn| gameshelf_db::remove_entry(conn, user_id, game_id))
            .await?;
        log::info!("User {} removed game {}", user_id, game_id);
        Ok(())
    }

    /// The entry for one game, or `None` if it is not in the library.
    pub async fn get_entry(
        &self,
        user_id: UserId,
        game_id: GameId,
    ) -> Result<Option<LibraryItem>, ServiceError> {
        self.store
            .call(move |conn| {
                gameshelf_db::get_entry(conn, user_id, game_id)?
                    .map(|entry| library_item(conn, entry))
                    .transpose()
            })
            .await
    }

    pub async fn list_library(
        &self,
        user_id: UserId,
        status: Option<PlayStatus>,
    ) -> Result<Vec<LibraryItem>, ServiceError> {
        self.store
            .call(move |conn| {
                require_user(conn, user_id)?;
                gameshelf_db::list_library(conn, user_id, status)
            })
            .await
    }

    // ── Accounts ────────────────────────────────────────────────────────

    /// Create an account. The password is hashed on the blocking pool.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, ServiceError> {
        gameshelf_core::validate_registration(email, username, password)?;

        let cost = self.bcrypt_cost;
        let plain = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
            .await?
            .map_err(|e| ServiceError::internal(format!("Password hashing failed: {e}")))?;

        let new_user = NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password_hash,
        };
        let now = Utc::now();
        let user = self
            .store
            .call(move |conn| gameshelf_db::create_user(conn, &new_user, now))
            .await?;
        log::info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Check a username/password pair and stamp the login time.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let name = username.to_string();
        let credentials = self
            .store
            .call(move |conn| gameshelf_db::find_credentials(conn, &name))
            .await?;

        let hash = credentials.as_ref().map(|c| c.password_hash.clone());
        let matches = self.password_matches(password, hash).await?;
        let credentials = match credentials {
            Some(credentials) if matches => credentials,
            _ => return Err(ServiceError::Unauthorized(BAD_LOGIN.to_string())),
        };
        let user_id = credentials.user_id;
        if !credentials.is_active {
            return Err(ServiceError::Unauthorized(
                "Account is deactivated".to_string(),
            ));
        }

        let now = Utc::now();
        self.store
            .call(move |conn| {
                gameshelf_db::record_login(conn, user_id, now)?;
                require_user(conn, user_id)
            })
            .await
    }

    /// Check `plain` against `hash` on the blocking pool. With no hash (unknown
    /// username) a throwaway hash is computed instead, so both outcomes cost
    /// one bcrypt round.
    async fn password_matches(
        &self,
        plain: &str,
        hash: Option<String>,
    ) -> Result<bool, ServiceError> {
        let plain = plain.to_string();
        let cost = self.bcrypt_cost;
        let matches = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => bcrypt::verify(plain, &hash).unwrap_or_else(|e| {
                log::warn!("Unreadable password hash: {}", e);
                false
            }),
            None => {
                let _ = bcrypt::hash(plain, cost);
                false
            }
        })
        .await?;
        Ok(matches)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.store.call(move |conn| require_user(conn, user_id)).await
    }

    /// Soft-(de)activate an account.
    pub async fn set_active(&self, user_id: UserId, active: bool) -> Result<(), ServiceError> {
        let now = Utc::now();
        self.store
            .call(move |conn| gameshelf_db::set_user_active(conn, user_id, active, now))
            .await?;
        log::info!(
            "User {} {}",
            user_id,
            if active { "reactivated" } else { "deactivated" }
        );
        Ok(())
    }

    // ── Profiles & Social ───────────────────────────────────────────────

    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile, ServiceError> {
        self.store
            .call(move |conn| gameshelf_db::user_profile(conn, user_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, ServiceError> {
        let now = Utc::now();
        self.store
            .call(move |conn| gameshelf_db::update_profile(conn, user_id, &update, now))
            .await
    }

    /// Case-insensitive substring search over active usernames.
    pub async fn search_users(&self, term: &str) -> Result<Vec<UserSummary>, ServiceError> {
        let term = term.trim().to_string();
        if term.is_empty() {
            return Err(ValidationError::single("query", "must not be empty").into());
        }
        self.store
            .call(move |conn| gameshelf_db::search_users(conn, &term, USER_SEARCH_LIMIT))
            .await
    }

    pub async fn follow(
        &self,
        follower_id: UserId,
        followee_id: UserId,
    ) -> Result<Follow, ServiceError> {
        let now = Utc::now();
        let follow = self
            .store
            .call(move |conn| gameshelf_db::follow(conn, follower_id, followee_id, now))
            .await?;
        log::info!("User {} followed {}", follower_id, followee_id);
        Ok(follow)
    }

    pub async fn unfollow(&self, follower_id: UserId, followee_id: UserId) -> Result<(), ServiceError> {
        self.store
            .call(move |conn| gameshelf_db::unfollow(conn, follower_id, followee_id))
            .await
    }

    pub async fn followers(&self, user_id: UserId) -> Result<Vec<UserSummary>, ServiceError> {
        self.store
            .call(move |conn| {
                require_user(conn, user_id)?;
                gameshelf_db::followers(conn, user_id)
            })
            .await
    }

    pub async fn following(&self, user_id: UserId) -> Result<Vec<UserSummary>, ServiceError> {
        self.store
            .call(move |conn| {
                require_user(conn, user_id)?;
                gameshelf_db::following(conn, user_id)
            })
            .await
    }

    // ── Catalog ─────────────────────────────────────────────────────────

    /// Search the catalog. Nothing is cached locally.
    pub async fn search_catalog(
        &self,
        term: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<CatalogPage, ServiceError> {
        let term = term.trim();
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(self.default_page_size);

        let mut err = ValidationError::new();
        if term.is_empty() {
            err.push("query", "must not be empty");
        }
        if page == 0 {
            err.push("page", "must be at least 1");
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            err.push("pageSize", format!("must be between 1 and {MAX_PAGE_SIZE}"));
        }
        err.into_result()?;

        Ok(self.catalog.search(term, page, page_size).await?)
    }

    /// Catalog details plus community reviews and the viewer's entry.
    ///
    /// A locally cached game is refreshed from the catalog. If the catalog
    /// is unreachable the cached copy is served instead.
    pub async fn game_page(
        &self,
        game_id: GameId,
        viewer: Option<UserId>,
    ) -> Result<GamePage, ServiceError> {
        check_game_id(game_id)?;

        let game = match self.catalog.details(game_id).await {
            Ok(record) => {
                let fresh = record.clone();
                let now = Utc::now();
                self.store
                    .call(move |conn| {
                        if gameshelf_db::get_game(conn, fresh.id)?.is_some() {
                            gameshelf_db::refresh_game(conn, &fresh, now)?;
                        }
                        Ok(())
                    })
                    .await?;
                record
            }
            Err(e) => {
                let err = ServiceError::from(e);
                if !err.is_retryable() {
                    return Err(err);
                }
                let cached = self
                    .store
                    .call(move |conn| gameshelf_db::get_game(conn, game_id))
                    .await?;
                match cached {
                    Some(game) => {
                        log::warn!("Serving cached copy of game {}", game_id);
                        CatalogGame::from(game)
                    }
                    None => return Err(err),
                }
            }
        };

        let (reviews, average_rating, user_entry) = self
            .store
            .call(move |conn| {
                let user_entry = match viewer {
                    Some(user_id) => gameshelf_db::get_entry(conn, user_id, game_id)?,
                    None => None,
                };
                Ok((
                    gameshelf_db::reviews_for_game(conn, game_id)?,
                    gameshelf_db::community_rating(conn, game_id)?,
                    user_entry,
                ))
            })
            .await?;

        Ok(GamePage {
            game,
            reviews,
            average_rating,
            user_entry,
        })
    }

    /// Games in the same series, or else the top-rated games sharing the
    /// game's leading genres. Catalog trouble yields an empty list.
    pub async fn related_games(&self, game_id: GameId) -> Result<RelatedGames, ServiceError> {
        check_game_id(game_id)?;

        match self.catalog.game_series(game_id, RELATED_LIMIT as u32).await {
            Ok(page) if !page.games.is_empty() => {
                return Ok(RelatedGames {
                    games: page.games.into_iter().take(RELATED_LIMIT).collect(),
                });
            }
            Ok(_) => log::debug!("Game {} has no series, trying genres", game_id),
            Err(e) => log::info!("Series lookup for game {} failed: {}", game_id, e),
        }

        let games = match self.genre_neighbours(game_id).await {
            Ok(games) => games,
            Err(e) => {
                log::warn!("Related games for {} unavailable: {}", game_id, e);
                Vec::new()
            }
        };
        Ok(RelatedGames { games })
    }

    async fn genre_neighbours(&self, game_id: GameId) -> Result<Vec<CatalogGame>, ServiceError> {
        let cached = self
            .store
            .call(move |conn| gameshelf_db::get_game(conn, game_id))
            .await?;
        let genres = match cached {
            Some(game) => game.genres,
            None => self.catalog.details(game_id).await?.genres,
        };
        let genres: Vec<String> = genres.into_iter().take(RELATED_GENRES).collect();
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        let page = self
            .catalog
            .top_rated_in_genres(&genres, RELATED_FETCH)
            .await?;
        Ok(page
            .games
            .into_iter()
            .filter(|g| g.id != game_id)
            .take(RELATED_LIMIT)
            .collect())
    }

    /// Community reviews and average rating from local libraries only.
    pub async fn game_reviews(&self, game_id: GameId) -> Result<GameReviews, ServiceError> {
        check_game_id(game_id)?;
        self.store
            .call(move |conn| {
                Ok(GameReviews {
                    reviews: gameshelf_db::reviews_for_game(conn, game_id)?,
                    average_rating: gameshelf_db::community_rating(conn, game_id)?,
                })
            })
            .await
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
