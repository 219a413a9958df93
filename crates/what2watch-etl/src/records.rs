//! Record types of the `title.basics` and `title.ratings` datasets.

use what2watch_core::model::TitleId;

use crate::error::DatasetError;
use crate::merge::Keyed;
use crate::reader::{DatasetRecord, Row};

/// Full header of `title.basics.tsv`.
pub const TITLE_BASICS_HEADER: [&str; 9] = [
    "tconst",
    "titleType",
    "primaryTitle",
    "originalTitle",
    "isAdult",
    "startYear",
    "endYear",
    "runtimeMinutes",
    "genres",
];

/// Full header of `title.ratings.tsv`.
pub const TITLE_RATINGS_HEADER: [&str; 3] = ["tconst", "averageRating", "numVotes"];

/// Decode a `tconst` key such as `tt0000001`.
#[must_use]
pub fn parse_title_id(tconst: &str) -> Option<TitleId> {
    TitleId::from_tconst(tconst)
}

fn require_title_id(row: &Row<'_>, tconst: &str) -> Result<TitleId, DatasetError> {
    parse_title_id(tconst).ok_or_else(|| row.invalid("tconst", tconst))
}

/// A record of the `title.basics.tsv.gz` dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleBasicsRecord {
    pub id: TitleId,

    /// Raw dataset category, e.g. `movie`, `tvSeries`, `short`.
    pub kind: String,
    pub primary_title: String,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub genres: Vec<String>,
}

impl DatasetRecord for TitleBasicsRecord {
    const COLUMNS: &'static [&'static str] = &[
        "tconst",
        "titleType",
        "primaryTitle",
        "startYear",
        "endYear",
        "genres",
    ];

    fn from_row(row: &Row<'_>) -> Result<Option<Self>, DatasetError> {
        let (Some(tconst), Some(kind), Some(primary_title), Some(start_year), Some(genres)) = (
            row.get("tconst"),
            row.get("titleType"),
            row.get("primaryTitle"),
            row.get("startYear"),
            row.get("genres"),
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            id: require_title_id(row, tconst)?,
            kind: kind.to_string(),
            primary_title: primary_title.to_string(),
            start_year: row.parse("startYear", start_year)?,
            end_year: row.parse_optional("endYear")?,
            genres: genres
                .split(',')
                .map(str::trim)
                .filter(|genre| !genre.is_empty())
                .map(str::to_string)
                .collect(),
        }))
    }
}

impl Keyed for TitleBasicsRecord {
    type Key = TitleId;

    fn key(&self) -> TitleId {
        self.id
    }
}

/// A record of the `title.ratings.tsv.gz` dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRatingsRecord {
    pub id: TitleId,
    pub rating: f64,
    pub votes: u32,
}

impl DatasetRecord for TitleRatingsRecord {
    const COLUMNS: &'static [&'static str] = &TITLE_RATINGS_HEADER;

    fn from_row(row: &Row<'_>) -> Result<Option<Self>, DatasetError> {
        let (Some(tconst), Some(rating), Some(votes)) = (
            row.get("tconst"),
            row.get("averageRating"),
            row.get("numVotes"),
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            id: require_title_id(row, tconst)?,
            rating: row.parse("averageRating", rating)?,
            votes: row.parse("numVotes", votes)?,
        }))
    }
}

impl Keyed for TitleRatingsRecord {
    type Key = TitleId;

    fn key(&self) -> TitleId {
        self.id
    }
}
