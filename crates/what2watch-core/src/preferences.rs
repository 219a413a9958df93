//! User preferences that drive title suggestions.
//!
//! Scalar settings live on the `users` row; selected genres, selected title
//! types and watched/ignored titles live in join tables. Every settings
//! change stamps `last_settings_update_at`.

use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::error::{Error, Result};
use crate::model::{Genre, GenreId, TitleId, TitleType, TitleTypeFamily, User, UserId};
use crate::schema::db::{parse_timestamp, row_to_genre};
use crate::schema::{Database, TitleRepository};

impl Database {
    /// Create the user on first contact, or refresh its last activity.
    pub fn upsert_user(&self, id: UserId) -> Result<User> {
        let defaults = User::new(id);
        self.conn().execute(
            "INSERT INTO users (id, minimum_rating, minimum_votes, require_all_selected_genres, last_activity_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET last_activity_at = excluded.last_activity_at",
            rusqlite::params![
                id,
                defaults.minimum_rating,
                defaults.minimum_votes,
                defaults.require_all_selected_genres,
                defaults.last_activity_at.to_rfc3339(),
            ],
        )?;
        self.get_user(id)
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, minimum_rating, minimum_votes, require_all_selected_genres,
                        last_activity_at, last_settings_update_at
                 FROM users WHERE id = ?1",
                [id],
                |row| {
                    let last_activity_at: String = row.get(4)?;
                    let last_settings_update_at: Option<String> = row.get(5)?;
                    Ok(User {
                        id: row.get(0)?,
                        minimum_rating: row.get(1)?,
                        minimum_votes: row.get(2)?,
                        require_all_selected_genres: row.get(3)?,
                        last_activity_at: parse_timestamp(4, &last_activity_at)?,
                        last_settings_update_at: last_settings_update_at
                            .map(|value| parse_timestamp(5, &value))
                            .transpose()?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "user",
                id: id.to_string(),
            })
    }

    pub fn set_minimum_rating(&self, id: UserId, rating: f64) -> Result<()> {
        if !(0.0..=10.0).contains(&rating) {
            return Err(Error::InvalidData(format!(
                "minimum rating must be between 0 and 10, got {rating}"
            )));
        }
        self.update_settings(id, "minimum_rating = ?2", rating)
    }

    pub fn set_minimum_votes(&self, id: UserId, votes: u32) -> Result<()> {
        self.update_settings(id, "minimum_votes = ?2", votes)
    }

    pub fn set_require_all_genres(&self, id: UserId, require_all: bool) -> Result<()> {
        self.update_settings(id, "require_all_selected_genres = ?2", require_all)
    }

    fn update_settings(
        &self,
        id: UserId,
        assignment: &str,
        value: impl rusqlite::ToSql,
    ) -> Result<()> {
        let changed = self.conn().execute(
            &format!("UPDATE users SET {assignment}, last_settings_update_at = ?3 WHERE id = ?1"),
            rusqlite::params![id, value, Utc::now().to_rfc3339()],
        )?;
        if changed == 0 {
            return Err(Error::NotFound {
                entity: "user",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn record_settings_update(&self, id: UserId) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET last_settings_update_at = ?2 WHERE id = ?1",
            rusqlite::params![id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

// Genre selection
impl Database {
    pub fn select_genre(&self, user: UserId, genre: GenreId) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO user_genres (user_id, genre_id) VALUES (?1, ?2)",
            rusqlite::params![user, genre],
        )?;
        self.record_settings_update(user)
    }

    pub fn unselect_genre(&self, user: UserId, genre: GenreId) -> Result<()> {
        self.conn().execute(
            "DELETE FROM user_genres WHERE user_id = ?1 AND genre_id = ?2",
            rusqlite::params![user, genre],
        )?;
        self.record_settings_update(user)
    }

    pub fn select_all_genres(&self, user: UserId) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO user_genres (user_id, genre_id) SELECT ?1, id FROM genres",
            [user],
        )?;
        self.record_settings_update(user)
    }

    pub fn unselect_all_genres(&self, user: UserId) -> Result<()> {
        self.conn()
            .execute("DELETE FROM user_genres WHERE user_id = ?1", [user])?;
        self.record_settings_update(user)
    }

    pub fn selected_genres(&self, user: UserId) -> Result<Vec<Genre>> {
        let mut stmt = self.conn().prepare(
            "SELECT g.id, g.name
             FROM genres g
             JOIN user_genres ug ON ug.genre_id = g.id
             WHERE ug.user_id = ?1
             ORDER BY g.name",
        )?;
        let genres = stmt
            .query_map([user], row_to_genre)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genres)
    }
}

// Title type selection
impl Database {
    pub fn select_title_type(&self, user: UserId, family: TitleTypeFamily) -> Result<()> {
        let title_type = self.get_or_create_title_type(family.name())?;
        self.conn().execute(
            "INSERT OR IGNORE INTO user_title_types (user_id, title_type_id) VALUES (?1, ?2)",
            rusqlite::params![user, title_type.id],
        )?;
        self.record_settings_update(user)
    }

    pub fn unselect_title_type(&self, user: UserId, family: TitleTypeFamily) -> Result<()> {
        self.conn().execute(
            "DELETE FROM user_title_types
             WHERE user_id = ?1
               AND title_type_id IN (SELECT id FROM title_types WHERE name = ?2)",
            rusqlite::params![user, family.name()],
        )?;
        self.record_settings_update(user)
    }

    pub fn selected_title_types(&self, user: UserId) -> Result<Vec<TitleType>> {
        let mut stmt = self.conn().prepare(
            "SELECT tt.id, tt.name
             FROM title_types tt
             JOIN user_title_types utt ON utt.title_type_id = tt.id
             WHERE utt.user_id = ?1
             ORDER BY tt.id",
        )?;
        let types = stmt
            .query_map([user], |row| {
                Ok(TitleType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(types)
    }
}

// Watched and ignored titles
impl Database {
    /// Exclude a title from future suggestions because it was watched.
    pub fn mark_watched(&self, user: UserId, title: TitleId) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO watched_titles (user_id, title_id) VALUES (?1, ?2)",
            rusqlite::params![user, title],
        )?;
        Ok(())
    }

    /// Exclude a title from future suggestions without marking it watched.
    pub fn mark_ignored(&self, user: UserId, title: TitleId) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO ignored_titles (user_id, title_id) VALUES (?1, ?2)",
            rusqlite::params![user, title],
        )?;
        Ok(())
    }
}
