use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! define_id {
    ($name:ident, $inner:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            #[must_use]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                self.0.to_sql()
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                <$inner>::column_result(value).map(Self)
            }
        }
    };
}

define_id!(
    TitleId,
    u32,
    "Identifier of a title, reused verbatim from the IMDB `tconst` number."
);
define_id!(GenreId, i64, "Identifier of a stored genre.");
define_id!(TitleTypeId, i64, "Identifier of a stored title type.");
define_id!(UserId, i64, "Identifier of a user (a Telegram user id).");

impl TitleId {
    /// Decode an IMDB key of the form `tt` followed by zero-padded digits.
    ///
    /// Returns `None` for anything else, including keys without the prefix.
    #[must_use]
    pub fn from_tconst(tconst: &str) -> Option<Self> {
        let digits = tconst.strip_prefix("tt")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }

    /// The IMDB key for this title, padded to at least seven digits.
    #[must_use]
    pub fn imdb_id(self) -> String {
        format!("tt{:07}", self.0)
    }

    #[must_use]
    pub fn imdb_url(self) -> String {
        format!("https://www.imdb.com/title/{}", self.imdb_id())
    }
}

/// Accepts both the IMDB form (`tt0111161`) and a bare number (`111161`).
impl FromStr for TitleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::from_tconst(s)
            .or_else(|| s.parse().ok().map(Self))
            .ok_or_else(|| Error::InvalidData(format!("not a title id: {s:?}")))
    }
}
