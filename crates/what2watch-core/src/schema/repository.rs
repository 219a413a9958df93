//! The storage interface the importer writes through.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{Genre, GenreId, Title, TitleId, TitleType};

/// Create/update/query access to the title catalog.
///
/// Every method returns owned values; nothing is loaded lazily behind the
/// caller's back. Related rows (a title's genres) are fetched explicitly
/// with [`title_genres`](Self::title_genres).
pub trait TitleRepository {
    /// List every stored genre.
    fn list_genres(&self) -> Result<Vec<Genre>>;

    /// Store a new genre. Fails if the name is already taken.
    fn insert_genre(&self, name: &str) -> Result<Genre>;

    /// List every stored title type.
    fn list_title_types(&self) -> Result<Vec<TitleType>>;

    /// Return the title type with this name, creating it if needed.
    fn get_or_create_title_type(&self, name: &str) -> Result<TitleType>;

    /// Fetch the titles whose ids appear in `ids`. Unknown ids are ignored.
    fn get_titles_by_ids(&self, ids: &[TitleId]) -> Result<Vec<Title>>;

    /// Store a new title under its own id.
    fn insert_title(&self, title: &Title) -> Result<()>;

    /// Overwrite the mutable fields of an existing title.
    fn update_title(&self, title: &Title) -> Result<()>;

    /// Make `genres` the complete genre set of a title.
    fn replace_title_genres(&self, id: TitleId, genres: &BTreeSet<GenreId>) -> Result<()>;

    /// Load the genres of a title, ordered by name.
    fn title_genres(&self, id: TitleId) -> Result<Vec<Genre>>;
}
