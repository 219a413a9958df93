use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Genre, GenreId, Title, TitleId, TitleType};
use crate::schema::repository::TitleRepository;

use super::migrations::MIGRATIONS;

/// Upper bound on ids bound into one `IN (...)` list. Stays well below
/// SQLite's host parameter limit whatever batch size the caller picks.
const LOOKUP_CHUNK_SIZE: usize = 500;

const TITLE_COLUMNS: &str = "id, name, title_type_id, start_year, end_year, rating, votes";

/// A database connection with the catalog and preference queries.
///
/// Open one per process (or per pipeline stage) and pass it down; it is
/// closed when dropped.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a single transaction.
    ///
    /// The transaction is committed when `f` returns `Ok` and rolled back
    /// when it returns `Err`.
    pub fn with_transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Self) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let tx = self.conn.unchecked_transaction().map_err(Error::from)?;
        let value = f(self)?;
        tx.commit().map_err(Error::from)?;
        Ok(value)
    }

    fn apply_migrations(&self) -> Result<()> {
        // Create migrations table if it doesn't exist
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Catalog reads beyond the repository interface
impl Database {
    /// Get a single title by id.
    pub fn get_title(&self, id: TitleId) -> Result<Option<Title>> {
        let title = self
            .conn
            .query_row(
                &format!("SELECT {TITLE_COLUMNS} FROM titles WHERE id = ?1"),
                [id],
                row_to_title,
            )
            .optional()?;
        Ok(title)
    }

    /// Look a genre up by its exact name.
    pub fn get_genre_by_name(&self, name: &str) -> Result<Option<Genre>> {
        let genre = self
            .conn
            .query_row(
                "SELECT id, name FROM genres WHERE name = ?1",
                [name],
                row_to_genre,
            )
            .optional()?;
        Ok(genre)
    }

    pub fn count_titles(&self) -> Result<u64> {
        self.count("titles")
    }

    pub fn count_genres(&self) -> Result<u64> {
        self.count("genres")
    }

    pub fn count_title_types(&self) -> Result<u64> {
        self.count("title_types")
    }

    pub fn count_users(&self) -> Result<u64> {
        self.count("users")
    }

    /// Number of titles per stored title type, ordered by type id.
    pub fn count_titles_by_type(&self) -> Result<Vec<(TitleType, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tt.id, tt.name, COUNT(t.id)
             FROM title_types tt
             LEFT JOIN titles t ON t.title_type_id = tt.id
             GROUP BY tt.id, tt.name
             ORDER BY tt.id",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok((
                    TitleType {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    },
                    row.get::<_, i64>(2)? as u64,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }

    fn count(&self, table: &str) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }
}

impl TitleRepository for Database {
    fn list_genres(&self) -> Result<Vec<Genre>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM genres ORDER BY name")?;
        let genres = stmt
            .query_map([], row_to_genre)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genres)
    }

    fn insert_genre(&self, name: &str) -> Result<Genre> {
        self.conn
            .prepare_cached("INSERT INTO genres (name) VALUES (?1)")?
            .execute([name])?;
        Ok(Genre {
            id: GenreId::new(self.conn.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    fn list_title_types(&self) -> Result<Vec<TitleType>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM title_types ORDER BY id")?;
        let types = stmt
            .query_map([], |row| {
                Ok(TitleType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(types)
    }

    fn get_or_create_title_type(&self, name: &str) -> Result<TitleType> {
        self.conn
            .prepare_cached("INSERT OR IGNORE INTO title_types (name) VALUES (?1)")?
            .execute([name])?;
        let title_type = self.conn.query_row(
            "SELECT id, name FROM title_types WHERE name = ?1",
            [name],
            |row| {
                Ok(TitleType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;
        Ok(title_type)
    }

    fn get_titles_by_ids(&self, ids: &[TitleId]) -> Result<Vec<Title>> {
        let mut titles = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = self.conn.prepare_cached(&format!(
                "SELECT {TITLE_COLUMNS} FROM titles WHERE id IN ({placeholders})"
            ))?;
            let rows = stmt.query_map(rusqlite::params_from_iter(chunk), row_to_title)?;
            for title in rows {
                titles.push(title?);
            }
        }
        Ok(titles)
    }

    fn insert_title(&self, title: &Title) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO titles (id, name, title_type_id, start_year, end_year, rating, votes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?
            .execute(rusqlite::params![
                title.id,
                title.name,
                title.title_type,
                title.start_year,
                title.end_year,
                title.rating,
                title.votes,
            ])?;
        Ok(())
    }

    fn update_title(&self, title: &Title) -> Result<()> {
        let changed = self
            .conn
            .prepare_cached(
                "UPDATE titles SET
                    name = ?2, title_type_id = ?3, start_year = ?4,
                    end_year = ?5, rating = ?6, votes = ?7
                 WHERE id = ?1",
            )?
            .execute(rusqlite::params![
                title.id,
                title.name,
                title.title_type,
                title.start_year,
                title.end_year,
                title.rating,
                title.votes,
            ])?;
        if changed == 0 {
            return Err(Error::NotFound {
                entity: "title",
                id: title.id.to_string(),
            });
        }
        Ok(())
    }

    fn replace_title_genres(&self, id: TitleId, genres: &BTreeSet<GenreId>) -> Result<()> {
        self.conn
            .prepare_cached("DELETE FROM title_genres WHERE title_id = ?1")?
            .execute([id])?;
        let mut insert = self
            .conn
            .prepare_cached("INSERT INTO title_genres (title_id, genre_id) VALUES (?1, ?2)")?;
        for genre in genres {
            insert.execute(rusqlite::params![id, genre])?;
        }
        Ok(())
    }

    fn title_genres(&self, id: TitleId) -> Result<Vec<Genre>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT g.id, g.name
             FROM genres g
             JOIN title_genres tg ON tg.genre_id = g.id
             WHERE tg.title_id = ?1
             ORDER BY g.name",
        )?;
        let genres = stmt
            .query_map([id], row_to_genre)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genres)
    }
}

pub(crate) fn row_to_title(row: &rusqlite::Row<'_>) -> rusqlite::Result<Title> {
    Ok(Title {
        id: row.get(0)?,
        name: row.get(1)?,
        title_type: row.get(2)?,
        start_year: row.get(3)?,
        end_year: row.get(4)?,
        rating: row.get(5)?,
        votes: row.get(6)?,
    })
}

pub(crate) fn row_to_genre(row: &rusqlite::Row<'_>) -> rusqlite::Result<Genre> {
    Ok(Genre {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(Into::into)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TitleTypeFamily, TitleTypeId};
    use tempfile::TempDir;

    fn movie_type(db: &Database) -> TitleTypeId {
        db.get_or_create_title_type(TitleTypeFamily::Movie.name())
            .unwrap()
            .id
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_reopen_does_not_reapply_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.insert_genre("Drama").unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.count_genres().unwrap(), 1);
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_genre_names_are_unique() {
        let db = Database::open_in_memory().unwrap();
        let drama = db.insert_genre("Drama").unwrap();
        assert_eq!(drama.name, "Drama");
        assert!(db.insert_genre("Drama").is_err());

        db.insert_genre("Comedy").unwrap();
        let names: Vec<String> = db
            .list_genres()
            .unwrap()
            .into_iter()
            .map(|genre| genre.name)
            .collect();
        assert_eq!(names, vec!["Comedy", "Drama"]);
    }

    #[test]
    fn test_get_or_create_title_type_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let first = db.get_or_create_title_type("Movie").unwrap();
        let second = db.get_or_create_title_type("Movie").unwrap();
        assert_eq!(first, second);
        assert_eq!(db.list_title_types().unwrap().len(), 1);
    }

    #[test]
    fn test_title_insert_update_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let movie = movie_type(&db);

        let mut title = Title::new(TitleId::new(111_161), "Shawshank", movie, 1994)
            .with_rating(9.3, 2_900_000);
        db.insert_title(&title).unwrap();
        assert_eq!(db.get_title(title.id).unwrap(), Some(title.clone()));

        title.name = "The Shawshank Redemption".to_string();
        title.votes = 3_000_000;
        db.update_title(&title).unwrap();

        let stored = db.get_title(title.id).unwrap().unwrap();
        assert_eq!(stored.name, "The Shawshank Redemption");
        assert_eq!(stored.votes, 3_000_000);
        assert_eq!(db.count_titles().unwrap(), 1);
    }

    #[test]
    fn test_update_missing_title_fails() {
        let db = Database::open_in_memory().unwrap();
        let title = Title::new(TitleId::new(1), "Ghost", movie_type(&db), 2000);
        assert!(matches!(
            db.update_title(&title),
            Err(Error::NotFound { entity: "title", .. })
        ));
    }

    #[test]
    fn test_get_titles_by_ids_spans_lookup_chunks() {
        let db = Database::open_in_memory().unwrap();
        let movie = movie_type(&db);
        for id in 1..=1200 {
            db.insert_title(&Title::new(TitleId::new(id), format!("Title {id}"), movie, 2000))
                .unwrap();
        }

        let wanted: Vec<TitleId> = (1..=1500).step_by(2).map(TitleId::new).collect();
        let found = db.get_titles_by_ids(&wanted).unwrap();
        assert_eq!(found.len(), 600);
        assert!(found.iter().all(|title| title.id.get() % 2 == 1));

        assert!(db.get_titles_by_ids(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_replace_title_genres_replaces_whole_set() {
        let db = Database::open_in_memory().unwrap();
        let title = Title::new(TitleId::new(7), "Se7en", movie_type(&db), 1995);
        db.insert_title(&title).unwrap();

        let a = db.insert_genre("A").unwrap();
        let b = db.insert_genre("B").unwrap();
        let c = db.insert_genre("C").unwrap();

        db.replace_title_genres(title.id, &BTreeSet::from([a.id, b.id]))
            .unwrap();
        db.replace_title_genres(title.id, &BTreeSet::from([b.id, c.id]))
            .unwrap();

        let genres = db.title_genres(title.id).unwrap();
        assert_eq!(genres, vec![b, c]);
    }

    #[test]
    fn test_with_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.with_transaction(|db| {
            db.insert_genre("Drama")?;
            Err(Error::InvalidData("abort".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.count_genres().unwrap(), 0);

        db.with_transaction(|db| db.insert_genre("Drama").map(|_| ()))
            .unwrap();
        assert_eq!(db.count_genres().unwrap(), 1);
    }

    #[test]
    fn test_count_titles_by_type() {
        let db = Database::open_in_memory().unwrap();
        let movie = movie_type(&db);
        db.get_or_create_title_type(TitleTypeFamily::Series.name())
            .unwrap();
        db.insert_title(&Title::new(TitleId::new(1), "One", movie, 2001))
            .unwrap();

        let counts = db.count_titles_by_type().unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].0.name, "Movie");
        assert_eq!(counts[0].1, 1);
        assert_eq!(counts[1].1, 0);
    }
}
