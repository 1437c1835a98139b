//! CRUD operations for users, games, library entries, and follows.

use std::fmt;

use chrono::{DateTime, Utc};
use gameshelf_core::types::*;
use gameshelf_core::{LibraryEntryPatch, ValidationError, apply_patch, initial_entry};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, Row, Transaction, TransactionBehavior, params};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
    #[error("Conflict on {entity_type}: {reason}")]
    Conflict { entity_type: String, reason: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

fn not_found(entity_type: &str, id: impl ToString) -> OperationError {
    OperationError::NotFound {
        entity_type: entity_type.to_string(),
        id: id.to_string(),
    }
}

fn conflict(entity_type: &str, reason: &str) -> OperationError {
    OperationError::Conflict {
        entity_type: entity_type.to_string(),
        reason: reason.to_string(),
    }
}

/// True for UNIQUE and PRIMARY KEY violations.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

/// Begin a write transaction that takes the write lock up front, so
/// concurrent writers queue on the busy timeout instead of failing mid-way.
fn begin_write(conn: &Connection) -> Result<Transaction<'_>, OperationError> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
}

// ── Row Mapping ─────────────────────────────────────────────────────────────

pub(crate) const USER_COLUMNS: &str = "u.id, u.email, u.username, u.bio, u.avatar, u.preferences,
    u.is_active, u.last_login_at, u.created_at, u.updated_at";

pub(crate) const GAME_COLUMNS: &str = "g.id, g.name, g.slug, g.genres, g.platforms,
    g.release_date, g.rating, g.background_image, g.description, g.synced_at,
    g.developers, g.website";

pub(crate) const ENTRY_COLUMNS: &str = "e.user_id, e.game_id, e.status, e.personal_rating,
    e.review, e.hours_played, e.completion_percentage, e.difficulty, e.started_at,
    e.completed_at, e.last_played_at, e.is_favorite, e.is_recommended, e.play_count,
    e.tags, e.notes, e.created_at, e.updated_at";

/// Number of columns in [`ENTRY_COLUMNS`], for rows that join further tables.
pub(crate) const ENTRY_COLUMN_COUNT: usize = 18;

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        bio: row.get(3)?,
        avatar: row.get(4)?,
        preferences: json_column(row, 5)?,
        is_active: row.get(6)?,
        last_login_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub(crate) fn row_to_game_at(row: &Row<'_>, base: usize) -> rusqlite::Result<Game> {
    Ok(Game {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        slug: row.get(base + 2)?,
        genres: json_column(row, base + 3)?,
        platforms: json_column(row, base + 4)?,
        release_date: row.get(base + 5)?,
        rating: row.get(base + 6)?,
        background_image: row.get(base + 7)?,
        description: row.get(base + 8)?,
        synced_at: row.get(base + 9)?,
        developers: json_column(row, base + 10)?,
        website: row.get(base + 11)?,
    })
}

pub(crate) fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<LibraryEntry> {
    let status: String = row.get(2)?;
    let status = status
        .parse::<PlayStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(LibraryEntry {
        user_id: row.get(0)?,
        game_id: row.get(1)?,
        status,
        personal_rating: row.get(3)?,
        review: row.get(4)?,
        hours_played: row.get(5)?,
        completion_percentage: row.get(6)?,
        difficulty: row.get(7)?,
        started_at: row.get(8)?,
        completed_at: row.get(9)?,
        last_played_at: row.get(10)?,
        is_favorite: row.get(11)?,
        is_recommended: row.get(12)?,
        play_count: row.get(13)?,
        tags: json_column(row, 14)?,
        notes: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>, OperationError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── User Operations ─────────────────────────────────────────────────────────

/// Login material for one account. Never serialized.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: UserId,
    pub password_hash: String,
    pub is_active: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Insert a new account. Email (case-insensitive) and username must both be
/// unused; the conflicting field is named in the error.
pub fn create_user(
    conn: &Connection,
    new_user: &NewUser,
    now: DateTime<Utc>,
) -> Result<User, OperationError> {
    gameshelf_core::validate_email(&new_user.email)?;
    gameshelf_core::validate_username(&new_user.username)?;

    let result = conn.execute(
        "INSERT INTO users (email, username, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![new_user.email, new_user.username, new_user.password_hash, now],
    );
    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Err(user_conflict(conn, &new_user.email)?),
        Err(e) => return Err(e.into()),
    }

    let id = conn.last_insert_rowid();
    get_user(conn, id)?.ok_or_else(|| not_found("user", id))
}

fn user_conflict(conn: &Connection, email: &str) -> Result<OperationError, OperationError> {
    let email_taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        params![email],
        |row| row.get(0),
    )?;
    Ok(if email_taken {
        conflict("user", "Email already in use")
    } else {
        conflict("user", "Username already taken")
    })
}

pub fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>, OperationError> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"))?;
    optional(stmt.query_row(params![id], row_to_user))
}

pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"
    ))?;
    optional(stmt.query_row(params![username], row_to_user))
}

pub(crate) fn user_exists(conn: &Connection, id: UserId) -> Result<bool, OperationError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?)
}

/// Look up login material by username.
pub fn find_credentials(
    conn: &Connection,
    username: &str,
) -> Result<Option<Credentials>, OperationError> {
    let mut stmt =
        conn.prepare("SELECT id, password_hash, is_active FROM users WHERE username = ?1")?;
    optional(stmt.query_row(params![username], |row| {
        Ok(Credentials {
            user_id: row.get(0)?,
            password_hash: row.get(1)?,
            is_active: row.get(2)?,
        })
    }))
}

/// Stamp a successful login.
pub fn record_login(conn: &Connection, id: UserId, now: DateTime<Utc>) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE users SET last_login_at = ?2 WHERE id = ?1",
        params![id, now],
    )?;
    if changed == 0 {
        return Err(not_found("user", id));
    }
    Ok(())
}

/// Soft-(de)activate an account. Accounts are never hard-deleted.
pub fn set_user_active(
    conn: &Connection,
    id: UserId,
    active: bool,
    now: DateTime<Utc>,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, active, now],
    )?;
    if changed == 0 {
        return Err(not_found("user", id));
    }
    Ok(())
}

/// Apply a partial profile edit and return the updated user.
pub fn update_profile(
    conn: &Connection,
    id: UserId,
    update: &ProfileUpdate,
    now: DateTime<Utc>,
) -> Result<User, OperationError> {
    gameshelf_core::validate_profile_update(update)?;
    let mut user = get_user(conn, id)?.ok_or_else(|| not_found("user", id))?;
    if let Some(bio) = &update.bio {
        user.bio = bio.clone();
    }
    if let Some(avatar) = &update.avatar {
        user.avatar = avatar.clone();
    }
    if let Some(preferences) = &update.preferences {
        user.preferences = preferences.clone();
    }
    user.updated_at = now;

    conn.execute(
        "UPDATE users SET bio = ?2, avatar = ?3, preferences = ?4, updated_at = ?5 WHERE id = ?1",
        params![
            id,
            user.bio,
            user.avatar,
            serde_json::to_string(&user.preferences)?,
            now,
        ],
    )?;
    Ok(user)
}

// ── Game Operations ─────────────────────────────────────────────────────────

/// Create-or-fetch a game by catalog id.
///
/// Concurrent callers for the same id all get the same single row: the
/// insert is a no-op when the id already exists. Existing metadata is not
/// overwritten; use [`refresh_game`] for that.
pub fn ensure_game(
    conn: &Connection,
    record: &CatalogGame,
    now: DateTime<Utc>,
) -> Result<Game, OperationError> {
    conn.execute(
        "INSERT INTO games (id, name, slug, genres, platforms, release_date, rating,
             background_image, description, synced_at, developers, website)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO NOTHING",
        params![
            record.id,
            record.name,
            record.slug,
            serde_json::to_string(&record.genres)?,
            serde_json::to_string(&record.platforms)?,
            record.release_date,
            record.rating,
            record.background_image,
            record.description,
            now,
            serde_json::to_string(&record.developers)?,
            record.website,
        ],
    )?;
    get_game(conn, record.id)?.ok_or_else(|| not_found("game", record.id))
}

/// Insert or overwrite a game's metadata from a fresh catalog record.
pub fn refresh_game(
    conn: &Connection,
    record: &CatalogGame,
    now: DateTime<Utc>,
) -> Result<Game, OperationError> {
    conn.execute(
        "INSERT INTO games (id, name, slug, genres, platforms, release_date, rating,
             background_image, description, synced_at, developers, website)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             slug = excluded.slug,
             genres = excluded.genres,
             platforms = excluded.platforms,
             release_date = excluded.release_date,
             rating = excluded.rating,
             background_image = excluded.background_image,
             description = excluded.description,
             synced_at = excluded.synced_at,
             developers = excluded.developers,
             website = excluded.website",
        params![
            record.id,
            record.name,
            record.slug,
            serde_json::to_string(&record.genres)?,
            serde_json::to_string(&record.platforms)?,
            record.release_date,
            record.rating,
            record.background_image,
            record.description,
            now,
            serde_json::to_string(&record.developers)?,
            record.website,
        ],
    )?;
    get_game(conn, record.id)?.ok_or_else(|| not_found("game", record.id))
}

pub fn get_game(conn: &Connection, id: GameId) -> Result<Option<Game>, OperationError> {
    let mut stmt = conn.prepare(&format!("SELECT {GAME_COLUMNS} FROM games g WHERE g.id = ?1"))?;
    optional(stmt.query_row(params![id], |row| row_to_game_at(row, 0)))
}

// ── Library Operations ──────────────────────────────────────────────────────

/// Add an already-cached game to a user's library.
///
/// Fails with `NotFound` for an unknown user or game and `Conflict` when the
/// pair already has an entry.
pub fn add_entry(
    conn: &Connection,
    user_id: UserId,
    game_id: GameId,
    status: Option<PlayStatus>,
    now: DateTime<Utc>,
) -> Result<LibraryEntry, OperationError> {
    if !user_exists(conn, user_id)? {
        return Err(not_found("user", user_id));
    }
    if get_game(conn, game_id)?.is_none() {
        return Err(not_found("game", game_id));
    }

    let entry = initial_entry(user_id, game_id, status, now);
    insert_entry(conn, &entry)?;
    log::debug!("Library entry created: user {} game {}", user_id, game_id);
    Ok(entry)
}

/// Cache `record` (create-or-fetch) and add it to the user's library as one
/// unit. Nothing is written if the user does not exist.
pub fn add_to_library(
    conn: &Connection,
    user_id: UserId,
    record: &CatalogGame,
    status: Option<PlayStatus>,
    now: DateTime<Utc>,
) -> Result<LibraryEntry, OperationError> {
    let tx = begin_write(conn)?;
    if !user_exists(&tx, user_id)? {
        return Err(not_found("user", user_id));
    }
    ensure_game(&tx, record, now)?;
    let entry = add_entry(&tx, user_id, record.id, status, now)?;
    tx.commit()?;
    Ok(entry)
}

fn insert_entry(conn: &Connection, entry: &LibraryEntry) -> Result<(), OperationError> {
    let result = conn.execute(
        "INSERT INTO library_entries (user_id, game_id, status, personal_rating, review,
             hours_played, completion_percentage, difficulty, started_at, completed_at,
             last_played_at, is_favorite, is_recommended, play_count, tags, notes,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            entry.user_id,
            entry.game_id,
            entry.status.as_str(),
            entry.personal_rating,
            entry.review,
            entry.hours_played,
            entry.completion_percentage,
            entry.difficulty,
            entry.started_at,
            entry.completed_at,
            entry.last_played_at,
            entry.is_favorite,
            entry.is_recommended,
            entry.play_count,
            serde_json::to_string(&entry.tags)?,
            entry.notes,
            entry.created_at,
            entry.updated_at,
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(conflict(
            "library entry",
            "Game already exists in your library",
        )),
        Err(e) => Err(e.into()),
    }
}

pub fn get_entry(
    conn: &Connection,
    user_id: UserId,
    game_id: GameId,
) -> Result<Option<LibraryEntry>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM library_entries e WHERE e.user_id = ?1 AND e.game_id = ?2"
    ))?;
    optional(stmt.query_row(params![user_id, game_id], row_to_entry))
}

/// Apply a partial update, including status-transition side effects.
///
/// The patch is validated before anything is read or written; on any error
/// the stored entry is unchanged.
pub fn update_entry(
    conn: &Connection,
    user_id: UserId,
    game_id: GameId,
    patch: &LibraryEntryPatch,
    now: DateTime<Utc>,
) -> Result<LibraryEntry, OperationError> {
    patch.validate()?;

    let tx = begin_write(conn)?;
    let current = get_entry(&tx, user_id, game_id)?
        .ok_or_else(|| not_found("library entry", format!("{user_id}/{game_id}")))?;
    let next = apply_patch(&current, patch, now)?;

    tx.execute(
        "UPDATE library_entries SET
             status = ?3, personal_rating = ?4, review = ?5, hours_played = ?6,
             completion_percentage = ?7, difficulty = ?8, started_at = ?9,
             completed_at = ?10, last_played_at = ?11, is_favorite = ?12,
             is_recommended = ?13, play_count = ?14, tags = ?15, notes = ?16,
             updated_at = ?17
         WHERE user_id = ?1 AND game_id = ?2",
        params![
            user_id,
            game_id,
            next.status.as_str(),
            next.personal_rating,
            next.review,
            next.hours_played,
            next.completion_percentage,
            next.difficulty,
            next.started_at,
            next.completed_at,
            next.last_played_at,
            next.is_favorite,
            next.is_recommended,
            next.play_count,
            serde_json::to_string(&next.tags)?,
            next.notes,
            next.updated_at,
        ],
    )?;
    tx.commit()?;

    if current.status != next.status {
        log::debug!(
            "Library entry user {} game {}: {} -> {}",
            user_id,
            game_id,
            current.status,
            next.status
        );
    }
    Ok(next)
}

/// Hard-delete a library entry. Rating and review go with it.
pub fn remove_entry(
    conn: &Connection,
    user_id: UserId,
    game_id: GameId,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "DELETE FROM library_entries WHERE user_id = ?1 AND game_id = ?2",
        params![user_id, game_id],
    )?;
    if changed == 0 {
        return Err(not_found("library entry", format!("{user_id}/{game_id}")));
    }
    Ok(())
}

// ── Follow Operations ───────────────────────────────────────────────────────

/// Record that `follower_id` follows `followee_id`. Self-follows are rejected.
pub fn follow(
    conn: &Connection,
    follower_id: UserId,
    followee_id: UserId,
    now: DateTime<Utc>,
) -> Result<Follow, OperationError> {
    if follower_id == followee_id {
        return Err(ValidationError::single("followeeId", "cannot follow yourself").into());
    }
    for id in [follower_id, followee_id] {
        if !user_exists(conn, id)? {
            return Err(not_found("user", id));
        }
    }

    let result = conn.execute(
        "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?1, ?2, ?3)",
        params![follower_id, followee_id, now],
    );
    match result {
        Ok(_) => Ok(Follow {
            follower_id,
            followee_id,
            created_at: now,
        }),
        Err(e) if is_unique_violation(&e) => Err(conflict("follow", "Already following this user")),
        Err(e) => Err(e.into()),
    }
}

pub fn unfollow(
    conn: &Connection,
    follower_id: UserId,
    followee_id: UserId,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
        params![follower_id, followee_id],
    )?;
    if changed == 0 {
        return Err(not_found("follow", format!("{follower_id}->{followee_id}")));
    }
    Ok(())
}
