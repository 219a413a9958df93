pub mod genre;
pub mod ids;
pub mod title;
pub mod user;

pub use genre::{Genre, TitleType, TitleTypeFamily};
pub use ids::{GenreId, TitleId, TitleTypeId, UserId};
pub use title::Title;
pub use user::User;
