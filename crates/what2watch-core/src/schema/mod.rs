pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::TitleRepository;
