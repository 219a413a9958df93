//! Per-run lookup tables for genres and title types.
//!
//! Both tables are tiny (a few dozen genres, three title types) and are hit
//! once per imported row, so they are loaded up front and kept in memory for
//! the whole import.

use std::collections::{BTreeSet, HashMap};

use what2watch_core::model::{Genre, GenreId, TitleType, TitleTypeFamily, TitleTypeId};
use what2watch_core::schema::TitleRepository;

/// The three canonical title types, keyed by family.
#[derive(Debug, Clone)]
pub struct TitleTypeCache {
    types: HashMap<TitleTypeFamily, TitleType>,
}

impl TitleTypeCache {
    /// Get or create the stored row of every family.
    pub fn load<S: TitleRepository + ?Sized>(repo: &S) -> what2watch_core::Result<Self> {
        let mut types: HashMap<TitleTypeFamily, TitleType> = repo
            .list_title_types()?
            .into_iter()
            .filter_map(|title_type| title_type.family().map(|family| (family, title_type)))
            .collect();

        for family in TitleTypeFamily::ALL {
            if !types.contains_key(&family) {
                let title_type = repo.get_or_create_title_type(family.name())?;
                log::debug!("Created title type {} ({})", title_type.name, title_type.id);
                types.insert(family, title_type);
            }
        }

        Ok(Self { types })
    }

    /// Resolve a raw dataset category such as `tvMovie`.
    #[must_use]
    pub fn resolve(&self, kind: &str) -> Option<TitleTypeId> {
        self.get(TitleTypeFamily::from_raw(kind)?)
    }

    #[must_use]
    pub fn get(&self, family: TitleTypeFamily) -> Option<TitleTypeId> {
        self.types.get(&family).map(|title_type| title_type.id)
    }
}

/// Genre name to id, growing as the import meets new names.
#[derive(Debug, Clone, Default)]
pub struct GenreCache {
    genres: HashMap<String, GenreId>,
    created: usize,
}

impl GenreCache {
    /// Preload every stored genre.
    pub fn load<S: TitleRepository + ?Sized>(repo: &S) -> what2watch_core::Result<Self> {
        let genres = repo
            .list_genres()?
            .into_iter()
            .map(|Genre { id, name }| (name, id))
            .collect();
        Ok(Self { genres, created: 0 })
    }

    /// Look a genre up by name, storing it on first sight.
    pub fn resolve<S: TitleRepository + ?Sized>(
        &mut self,
        repo: &S,
        name: &str,
    ) -> what2watch_core::Result<GenreId> {
        if let Some(id) = self.genres.get(name) {
            return Ok(*id);
        }
        let genre = repo.insert_genre(name)?;
        log::info!("New genre: {}", genre.name);
        self.created += 1;
        self.genres.insert(genre.name, genre.id);
        Ok(genre.id)
    }

    /// Resolve a record's genre list into the set stored for the title.
    pub fn resolve_all<S, I>(
        &mut self,
        repo: &S,
        names: I,
    ) -> what2watch_core::Result<BTreeSet<GenreId>>
    where
        S: TitleRepository + ?Sized,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| self.resolve(repo, name.as_ref()))
            .collect()
    }

    /// Number of genres this cache has stored.
    #[must_use]
    pub const fn created(&self) -> usize {
        self.created
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genres.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }
}
