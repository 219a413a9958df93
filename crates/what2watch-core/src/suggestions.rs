//! Random title suggestions filtered by user preferences.

use rusqlite::OptionalExtension;

use crate::error::Result;
use crate::model::{Title, UserId};
use crate::schema::db::row_to_title;
use crate::schema::Database;

/// Titles the user has not watched or ignored, passing the rating, vote and
/// title-type filters. `?1` is the user id.
const BASE_FILTER: &str = "
    SELECT t.id, t.name, t.title_type_id, t.start_year, t.end_year, t.rating, t.votes
    FROM titles t
    JOIN users u ON u.id = ?1
    WHERE t.rating >= u.minimum_rating
      AND t.votes >= u.minimum_votes
      AND t.title_type_id IN (SELECT title_type_id FROM user_title_types WHERE user_id = ?1)
      AND t.id NOT IN (SELECT title_id FROM watched_titles WHERE user_id = ?1)
      AND t.id NOT IN (SELECT title_id FROM ignored_titles WHERE user_id = ?1)";

/// At least one selected genre.
const ANY_GENRE: &str = "
      AND EXISTS (
          SELECT 1 FROM title_genres tg
          JOIN user_genres ug ON ug.genre_id = tg.genre_id
          WHERE tg.title_id = t.id AND ug.user_id = ?1)";

/// Every selected genre, and at least one selected.
const ALL_GENRES: &str = "
      AND EXISTS (SELECT 1 FROM user_genres WHERE user_id = ?1)
      AND NOT EXISTS (
          SELECT 1 FROM user_genres ug
          WHERE ug.user_id = ?1
            AND ug.genre_id NOT IN (SELECT genre_id FROM title_genres WHERE title_id = t.id))";

impl Database {
    /// Pick a random title matching the user's preferences.
    ///
    /// Returns `Ok(None)` when nothing matches, and an error if the user
    /// does not exist.
    pub fn suggest_title(&self, user: UserId) -> Result<Option<Title>> {
        let settings = self.get_user(user)?;
        let genre_filter = if settings.require_all_selected_genres {
            ALL_GENRES
        } else {
            ANY_GENRE
        };

        let title = self
            .conn()
            .query_row(
                &format!("{BASE_FILTER}{genre_filter} ORDER BY random() LIMIT 1"),
                [user],
                row_to_title,
            )
            .optional()?;

        log::debug!(
            "Suggestion for user {}: {}",
            user,
            title
                .as_ref()
                .map(|t| t.id.imdb_id())
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(title)
    }
}
