use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;

pub const DEFAULT_MINIMUM_RATING: f64 = 6.0;
pub const DEFAULT_MINIMUM_VOTES: u32 = 10_000;

/// A user and the scalar part of their suggestion preferences.
///
/// Selected genres, selected title types and watched/ignored titles are
/// stored in join tables and loaded through the preference methods on
/// [`Database`](crate::schema::Database).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub minimum_rating: f64,
    pub minimum_votes: u32,

    /// When set, a suggestion must carry every selected genre instead of
    /// at least one of them.
    pub require_all_selected_genres: bool,

    pub last_activity_at: DateTime<Utc>,
    pub last_settings_update_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            minimum_rating: DEFAULT_MINIMUM_RATING,
            minimum_votes: DEFAULT_MINIMUM_VOTES,
            require_all_selected_genres: false,
            last_activity_at: Utc::now(),
            last_settings_update_at: None,
        }
    }
}
