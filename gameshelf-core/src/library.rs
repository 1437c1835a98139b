//! Library entry lifecycle rules: creation defaults, partial updates, and the
//! timestamp side effects of status changes.
//!
//! Everything here is pure. The store reads an entry, calls [`apply_patch`],
//! and writes the result back, so a rejected patch never reaches disk.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::{GameId, LibraryEntry, PlayStatus, UserId, nullable};
use crate::validate::ValidationError;

pub const MAX_REVIEW_CHARS: usize = 2000;
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A partial update to a library entry.
///
/// `None` leaves a field untouched. For nullable fields, `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LibraryEntryPatch {
    #[serde(default, alias = "playStatus")]
    pub status: Option<PlayStatus>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub personal_rating: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub review: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub hours_played: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub completion_percentage: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub difficulty: Option<Option<u8>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub started_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub last_played_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub is_recommended: Option<bool>,
    #[serde(default)]
    pub play_count: Option<u32>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub notes: Option<Option<String>>,
}

impl LibraryEntryPatch {
    pub fn status(status: PlayStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn rating(rating: Option<f64>) -> Self {
        Self {
            personal_rating: Some(rating),
            ..Self::default()
        }
    }

    /// Check every bounded field the patch sets. Collects all issues.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();

        if let Some(Some(rating)) = self.personal_rating {
            if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
                err.push(
                    "personalRating",
                    format!("must be between {MIN_RATING} and {MAX_RATING}"),
                );
            }
        }
        if let Some(Some(review)) = &self.review {
            if review.chars().count() > MAX_REVIEW_CHARS {
                err.push(
                    "review",
                    format!("must be at most {MAX_REVIEW_CHARS} characters"),
                );
            }
        }
        if let Some(Some(hours)) = self.hours_played {
            if !hours.is_finite() || hours < 0.0 {
                err.push("hoursPlayed", "must be zero or more");
            }
        }
        if let Some(Some(pct)) = self.completion_percentage {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                err.push("completionPercentage", "must be between 0 and 100");
            }
        }
        if let Some(Some(difficulty)) = self.difficulty {
            if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
                err.push(
                    "difficulty",
                    format!("must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}"),
                );
            }
        }
        if let Some(tags) = &self.tags {
            if tags.iter().any(|t| t.trim().is_empty()) {
                err.push("tags", "must not contain empty tags");
            }
        }

        err.into_result()
    }
}

/// A fresh entry for `(user_id, game_id)`.
///
/// Starts as plan-to-play; when a different initial status is requested the
/// normal transition rules run from plan-to-play, so adding a game straight
/// into `completed` stamps both dates.
pub fn initial_entry(
    user_id: UserId,
    game_id: GameId,
    status: Option<PlayStatus>,
    now: DateTime<Utc>,
) -> LibraryEntry {
    let mut entry = LibraryEntry {
        user_id,
        game_id,
        status: PlayStatus::PlanToPlay,
        personal_rating: None,
        review: None,
        hours_played: None,
        completion_percentage: None,
        difficulty: None,
        started_at: None,
        completed_at: None,
        last_played_at: None,
        is_favorite: false,
        is_recommended: false,
        play_count: 0,
        tags: Vec::new(),
        notes: None,
        created_at: now,
        updated_at: now,
    };
    if let Some(status) = status {
        apply_status_transition(&mut entry, status, now);
    }
    entry
}

/// Move `entry` to status `to`, stamping derived dates.
///
/// - Entering `completed` without a `completed_at` sets it to `now`.
/// - Leaving `plan-to-play` without a `started_at` sets it to `now`.
///
/// A stamped date never crosses a date the entry already holds: a derived
/// `started_at` is no later than `completed_at`, and a derived
/// `completed_at` is no earlier than `started_at`.
///
/// Setting the status it already has is a no-op.
pub fn apply_status_transition(entry: &mut LibraryEntry, to: PlayStatus, now: DateTime<Utc>) {
    let from = entry.status;
    if from == to {
        return;
    }
    entry.status = to;

    if to == PlayStatus::Completed && entry.completed_at.is_none() {
        entry.completed_at = Some(entry.started_at.map_or(now, |started| started.max(now)));
    }
    if from == PlayStatus::PlanToPlay && entry.started_at.is_none() {
        entry.started_at = Some(entry.completed_at.map_or(now, |completed| completed.min(now)));
    }
}

/// Apply `patch` to a copy of `entry`.
///
/// Explicit field values are applied before the status transition, so a
/// `startedAt` supplied alongside a status change is kept rather than
/// replaced by `now`. The original entry is untouched when this fails.
pub fn apply_patch(
    entry: &LibraryEntry,
    patch: &LibraryEntryPatch,
    now: DateTime<Utc>,
) -> Result<LibraryEntry, ValidationError> {
    patch.validate()?;

    let mut next = entry.clone();
    if let Some(rating) = patch.personal_rating {
        next.personal_rating = rating;
    }
    if let Some(review) = &patch.review {
        next.review = review.clone();
    }
    if let Some(hours) = patch.hours_played {
        next.hours_played = hours;
    }
    if let Some(pct) = patch.completion_percentage {
        next.completion_percentage = pct;
    }
    if let Some(difficulty) = patch.difficulty {
        next.difficulty = difficulty;
    }
    if let Some(started) = patch.started_at {
        next.started_at = started;
    }
    if let Some(completed) = patch.completed_at {
        next.completed_at = completed;
    }
    if let Some(last_played) = patch.last_played_at {
        next.last_played_at = last_played;
    }
    if let Some(favorite) = patch.is_favorite {
        next.is_favorite = favorite;
    }
    if let Some(recommended) = patch.is_recommended {
        next.is_recommended = recommended;
    }
    if let Some(count) = patch.play_count {
        next.play_count = count;
    }
    if let Some(tags) = &patch.tags {
        next.tags = tags.iter().map(|t| t.trim().to_string()).collect();
    }
    if let Some(notes) = &patch.notes {
        next.notes = notes.clone();
    }

    if let Some(status) = patch.status {
        apply_status_transition(&mut next, status, now);
    }

    if let (Some(started), Some(completed)) = (next.started_at, next.completed_at) {
        if completed < started {
            return Err(ValidationError::single(
                "completedAt",
                "must not be earlier than startedAt",
            ));
        }
    }

    next.updated_at = now;
    Ok(next)
}

/// `ceil((completed - started) / 1 day)`, defined only when both are set.
pub fn play_duration_days(
    started: Option<DateTime<Utc>>,
    completed: Option<DateTime<Utc>>,
) -> Option<i64> {
    let millis = (completed? - started?).num_milliseconds();
    let whole = millis / MILLIS_PER_DAY;
    // Integer division truncates toward zero, which is already the ceiling
    // for negative spans.
    if millis % MILLIS_PER_DAY > 0 {
        Some(whole + 1)
    } else {
        Some(whole)
    }
}
