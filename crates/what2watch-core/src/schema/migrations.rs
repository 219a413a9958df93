/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Genres, created on demand by the importer
CREATE TABLE IF NOT EXISTS genres (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Canonical title types (Movie, Series, Mini Series)
CREATE TABLE IF NOT EXISTS title_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Titles; the primary key is the IMDB tconst number
CREATE TABLE IF NOT EXISTS titles (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    title_type_id INTEGER NOT NULL REFERENCES title_types(id),
    start_year INTEGER NOT NULL,
    end_year INTEGER,
    rating REAL NOT NULL,
    votes INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_titles_title_type_id ON titles(title_type_id);
CREATE INDEX IF NOT EXISTS idx_titles_start_year ON titles(start_year);
CREATE INDEX IF NOT EXISTS idx_titles_rating ON titles(rating);
CREATE INDEX IF NOT EXISTS idx_titles_votes ON titles(votes);

-- Title genres (many-to-many)
CREATE TABLE IF NOT EXISTS title_genres (
    title_id INTEGER NOT NULL REFERENCES titles(id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (title_id, genre_id)
);

CREATE INDEX IF NOT EXISTS idx_title_genres_genre_id ON title_genres(genre_id);
"#;

const MIGRATION_002: &str = r#"
-- Users and their scalar suggestion preferences
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    minimum_rating REAL NOT NULL DEFAULT 6.0,
    minimum_votes INTEGER NOT NULL DEFAULT 10000,
    require_all_selected_genres INTEGER NOT NULL DEFAULT 0,
    last_activity_at TEXT NOT NULL,
    last_settings_update_at TEXT
);

CREATE TABLE IF NOT EXISTS user_genres (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, genre_id)
);

CREATE TABLE IF NOT EXISTS user_title_types (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title_type_id INTEGER NOT NULL REFERENCES title_types(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, title_type_id)
);

CREATE TABLE IF NOT EXISTS watched_titles (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title_id INTEGER NOT NULL REFERENCES titles(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, title_id)
);

CREATE TABLE IF NOT EXISTS ignored_titles (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title_id INTEGER NOT NULL REFERENCES titles(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, title_id)
);
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "title_catalog",
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "user_preferences",
        sql: MIGRATION_002,
    },
];
