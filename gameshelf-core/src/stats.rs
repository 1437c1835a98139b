//! Profile aggregation over a user's library.

use serde::Serialize;

use crate::types::{LibraryEntry, PlayStatus, User};

/// Summary statistics for one user's library. Recomputed on every read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_games: usize,
    pub completed_count: usize,
    pub playing_count: usize,
    /// Mean of the non-null personal ratings; `None` if nothing is rated.
    pub average_rating: Option<f64>,
}

impl LibraryStats {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LibraryEntry>) -> Self {
        let mut stats = Self::default();
        let mut ratings = Vec::new();

        for entry in entries {
            stats.total_games += 1;
            match entry.status {
                PlayStatus::Completed => stats.completed_count += 1,
                PlayStatus::Playing => stats.playing_count += 1,
                _ => {}
            }
            ratings.push(entry.personal_rating);
        }

        stats.average_rating = average_rating(ratings);
        stats
    }
}

/// Arithmetic mean of the `Some` ratings, or `None` when there are none.
pub fn average_rating(ratings: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = ratings
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), r| (sum + r, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// The public profile read model: user, library stats, and social counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub stats: LibraryStats,
    pub followers: u64,
    pub following: u64,
}

impl UserProfile {
    pub fn new(user: &User, stats: LibraryStats, followers: u64, following: u64) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar.clone(),
            created_at: user.created_at,
            stats,
            followers,
            following,
        }
    }
}
