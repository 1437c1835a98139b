//! Domain model for a GameShelf library: users, cached catalog games, library
//! entries, and follows, plus the rules that bind them.
//!
//! This crate has no I/O. `gameshelf-db` persists these types and
//! `gameshelf-lib` drives them from request handlers.

pub mod account;
pub mod library;
pub mod stats;
pub mod types;
pub mod validate;

pub use account::{
    validate_email, validate_password, validate_profile_update, validate_registration,
    validate_username,
};
pub use library::{
    LibraryEntryPatch, apply_patch, apply_status_transition, initial_entry, play_duration_days,
};
pub use stats::{LibraryStats, UserProfile, average_rating};
pub use types::*;
pub use validate::{FieldIssue, ValidationError};
