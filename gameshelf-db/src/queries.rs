//! Read queries: library listings, profile aggregation, user search, the
//! social graph, and community reviews.

use gameshelf_core::types::*;
use gameshelf_core::{LibraryStats, UserProfile, average_rating};
use rusqlite::{Connection, params};

use crate::operations::{
    ENTRY_COLUMN_COUNT, ENTRY_COLUMNS, GAME_COLUMNS, OperationError, USER_COLUMNS, get_user,
    row_to_entry, row_to_game_at,
};

// ── Library ─────────────────────────────────────────────────────────────────

/// A user's library joined with the cached games, most recently touched
/// first. Pass `status` to keep only entries in that state.
pub fn list_library(
    conn: &Connection,
    user_id: UserId,
    status: Option<PlayStatus>,
) -> Result<Vec<LibraryItem>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS}, {GAME_COLUMNS}
         FROM library_entries e
         JOIN games g ON g.id = e.game_id
         WHERE e.user_id = ?1 AND (?2 IS NULL OR e.status = ?2)
         ORDER BY e.updated_at DESC, g.name"
    ))?;
    let rows = stmt.query_map(params![user_id, status.map(|s| s.as_str())], |row| {
        let entry = row_to_entry(row)?;
        let game = row_to_game_at(row, ENTRY_COLUMN_COUNT)?;
        Ok(LibraryItem::new(game, entry))
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Every library entry for a user, without game data.
pub fn library_entries(
    conn: &Connection,
    user_id: UserId,
) -> Result<Vec<LibraryEntry>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM library_entries e WHERE e.user_id = ?1 ORDER BY e.game_id"
    ))?;
    let rows = stmt.query_map(params![user_id], row_to_entry)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Summary statistics for a user's library.
pub fn library_stats(conn: &Connection, user_id: UserId) -> Result<LibraryStats, OperationError> {
    let entries = library_entries(conn, user_id)?;
    Ok(LibraryStats::from_entries(&entries))
}

// ── Profile ─────────────────────────────────────────────────────────────────

/// `(followers, following)` for a user.
pub fn follow_counts(conn: &Connection, user_id: UserId) -> Result<(u64, u64), OperationError> {
    let (followers, following): (i64, i64) = conn.query_row(
        "SELECT
             (SELECT COUNT(*) FROM follows WHERE followee_id = ?1),
             (SELECT COUNT(*) FROM follows WHERE follower_id = ?1)",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((followers as u64, following as u64))
}

/// The public profile with freshly computed library stats, or `None` for an
/// unknown user.
pub fn user_profile(
    conn: &Connection,
    user_id: UserId,
) -> Result<Option<UserProfile>, OperationError> {
    let Some(user) = get_user(conn, user_id)? else {
        return Ok(None);
    };
    let stats = library_stats(conn, user_id)?;
    let (followers, following) = follow_counts(conn, user_id)?;
    Ok(Some(UserProfile::new(&user, stats, followers, following)))
}

// ── Users ───────────────────────────────────────────────────────────────────

fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserSummary> {
    let user = crate::operations::row_to_user(row)?;
    Ok(UserSummary {
        id: user.id,
        username: user.username,
        avatar: user.avatar,
        bio: user.bio,
    })
}

/// Escape LIKE wildcards so `_` in a username matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Case-insensitive substring search over active usernames.
pub fn search_users(
    conn: &Connection,
    term: &str,
    limit: usize,
) -> Result<Vec<UserSummary>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         WHERE u.is_active = 1 AND u.username LIKE ?1 ESCAPE '\\'
         ORDER BY u.username LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![like_pattern(term), limit as i64], row_to_summary)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Users following `user_id`, newest first.
pub fn followers(conn: &Connection, user_id: UserId) -> Result<Vec<UserSummary>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         JOIN follows f ON f.follower_id = u.id
         WHERE f.followee_id = ?1
         ORDER BY f.created_at DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], row_to_summary)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Users that `user_id` follows, newest first.
pub fn following(conn: &Connection, user_id: UserId) -> Result<Vec<UserSummary>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         JOIN follows f ON f.followee_id = u.id
         WHERE f.follower_id = ?1
         ORDER BY f.created_at DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], row_to_summary)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Community ───────────────────────────────────────────────────────────────

/// Written reviews for a game with their authors, newest first.
pub fn reviews_for_game(
    conn: &Connection,
    game_id: GameId,
) -> Result<Vec<GameReview>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username, e.personal_rating, e.review, e.updated_at
         FROM library_entries e
         JOIN users u ON u.id = e.user_id
         WHERE e.game_id = ?1 AND e.review IS NOT NULL AND e.review <> ''
         ORDER BY e.updated_at DESC",
    )?;
    let rows = stmt.query_map(params![game_id], |row| {
        Ok(GameReview {
            user_id: row.get(0)?,
            username: row.get(1)?,
            rating: row.get(2)?,
            review: row.get(3)?,
            updated_at: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Mean personal rating across every library holding `game_id`.
pub fn community_rating(conn: &Connection, game_id: GameId) -> Result<Option<f64>, OperationError> {
    let mut stmt = conn.prepare("SELECT personal_rating FROM library_entries WHERE game_id = ?1")?;
    let ratings = stmt
        .query_map(params![game_id], |row| row.get::<_, Option<f64>>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(average_rating(ratings))
}
