//! SQLite persistence layer for GameShelf.
//!
//! Provides schema creation, CRUD operations, and query APIs
//! backed by SQLite (via rusqlite with bundled feature).
//! Uniqueness rules live in the schema; this crate turns constraint
//! violations into typed [`OperationError::Conflict`] values.

pub mod operations;
pub mod queries;
pub mod schema;

pub use operations::{
    Credentials, OperationError, add_entry, add_to_library, create_user, ensure_game,
    find_credentials, find_user_by_username, follow, get_entry, get_game, get_user,
    record_login, refresh_game, remove_entry, set_user_active, unfollow, update_entry,
    update_profile,
};
pub use queries::{
    community_rating, follow_counts, followers, following, library_entries, library_stats,
    list_library, reviews_for_game, search_users, user_profile,
};
pub use schema::{open_database, open_memory};
