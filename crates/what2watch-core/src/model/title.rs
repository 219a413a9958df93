use serde::{Deserialize, Serialize};

use crate::model::ids::{TitleId, TitleTypeId};

/// A movie or a series, as stored in the catalog.
///
/// The genre set lives in its own join table and is loaded explicitly with
/// [`TitleRepository::title_genres`](crate::schema::TitleRepository::title_genres).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    pub title_type: TitleTypeId,
    pub start_year: i32,

    /// Only set for series that have ended.
    pub end_year: Option<i32>,

    /// Weighted average of user ratings, 1.0 to 10.0.
    pub rating: f64,
    pub votes: u32,
}

impl Title {
    #[must_use]
    pub fn new(
        id: TitleId,
        name: impl Into<String>,
        title_type: TitleTypeId,
        start_year: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            title_type,
            start_year,
            end_year: None,
            rating: 0.0,
            votes: 0,
        }
    }

    #[must_use]
    pub fn with_end_year(mut self, end_year: i32) -> Self {
        self.end_year = Some(end_year);
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: f64, votes: u32) -> Self {
        self.rating = rating;
        self.votes = votes;
        self
    }

    /// Human readable release span, e.g. `1994` or `2008-2013`.
    #[must_use]
    pub fn years(&self) -> String {
        match self.end_year {
            Some(end) if end != self.start_year => format!("{}-{}", self.start_year, end),
            _ => self.start_year.to_string(),
        }
    }
}
