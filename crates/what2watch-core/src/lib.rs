//! Core domain model for what2watch.
//!
//! This crate defines the title catalog (titles, genres, title types), the
//! user preferences used for suggestions, the SQLite schema and the
//! repository the importer writes through.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod preferences;
pub mod schema;
pub mod suggestions;

pub use error::{Error, Result};
