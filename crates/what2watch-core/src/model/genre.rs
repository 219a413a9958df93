use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::model::ids::{GenreId, TitleTypeId};

/// A genre, e.g. "Drama". Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// A stored title type. There is one row per [`TitleTypeFamily`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleType {
    pub id: TitleTypeId,
    pub name: String,
}

impl TitleType {
    /// The canonical family this type stands for, if its name is one of them.
    #[must_use]
    pub fn family(&self) -> Option<TitleTypeFamily> {
        TitleTypeFamily::ALL
            .into_iter()
            .find(|family| family.name() == self.name)
    }
}

/// The canonical families the raw dataset categories are folded onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TitleTypeFamily {
    Movie,
    Series,
    MiniSeries,
}

impl TitleTypeFamily {
    pub const ALL: [Self; 3] = [Self::Movie, Self::Series, Self::MiniSeries];

    /// The stored name of the title type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Series => "Series",
            Self::MiniSeries => "Mini Series",
        }
    }

    /// Fold a raw dataset category onto its family.
    ///
    /// Categories without a family (shorts, episodes, video games, ...) are
    /// not imported and map to `None`.
    #[must_use]
    pub fn from_raw(kind: &str) -> Option<Self> {
        match kind {
            "movie" | "tvMovie" => Some(Self::Movie),
            "tvSeries" => Some(Self::Series),
            "tvMiniSeries" => Some(Self::MiniSeries),
            _ => None,
        }
    }
}

impl fmt::Display for TitleTypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TitleTypeFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "movie" | "movies" => Ok(Self::Movie),
            "series" => Ok(Self::Series),
            "mini-series" | "miniseries" => Ok(Self::MiniSeries),
            other => Err(Error::InvalidData(format!(
                "unknown title type {other:?} (expected movie, series or mini-series)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_names() {
        assert_eq!(TitleTypeFamily::Movie.name(), "Movie");
        assert_eq!(TitleTypeFamily::MiniSeries.to_string(), "Mini Series");
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("movie".parse::<TitleTypeFamily>().unwrap(), TitleTypeFamily::Movie);
        assert_eq!("Series".parse::<TitleTypeFamily>().unwrap(), TitleTypeFamily::Series);
        assert_eq!(
            "Mini Series".parse::<TitleTypeFamily>().unwrap(),
            TitleTypeFamily::MiniSeries
        );
        assert_eq!(
            "mini_series".parse::<TitleTypeFamily>().unwrap(),
            TitleTypeFamily::MiniSeries
        );
        assert!("short".parse::<TitleTypeFamily>().is_err());
    }

    #[test]
    fn test_family_from_raw() {
        assert_eq!(TitleTypeFamily::from_raw("movie"), Some(TitleTypeFamily::Movie));
        assert_eq!(TitleTypeFamily::from_raw("tvMovie"), Some(TitleTypeFamily::Movie));
        assert_eq!(TitleTypeFamily::from_raw("tvSeries"), Some(TitleTypeFamily::Series));
        assert_eq!(
            TitleTypeFamily::from_raw("tvMiniSeries"),
            Some(TitleTypeFamily::MiniSeries)
        );
        assert_eq!(TitleTypeFamily::from_raw("tvEpisode"), None);
        assert_eq!(TitleTypeFamily::from_raw("Movie"), None);
    }

    #[test]
    fn test_title_type_family() {
        let title_type = TitleType {
            id: TitleTypeId::new(3),
            name: "Mini Series".to_string(),
        };
        assert_eq!(title_type.family(), Some(TitleTypeFamily::MiniSeries));

        let unknown = TitleType {
            id: TitleTypeId::new(4),
            name: "Podcast".to_string(),
        };
        assert_eq!(unknown.family(), None);
    }
}
