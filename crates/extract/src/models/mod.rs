//! Domain records produced by the extractors.
//!
//! Everything serializes to camelCase JSON, which is both the cache storage
//! format and the shape printed by the command line.

mod chapter;
mod genre;
mod home;
mod info;
mod kind;
mod search;
mod status;

pub use self::chapter::{ChapterContent, Page};
pub use self::genre::GenreRef;
pub use self::home::HomeFeed;
pub use self::info::{ChapterRef, Character, ContentInfo};
pub use self::kind::ContentType;
pub use self::search::{SearchResult, Suggestion};
pub use self::status::Status;
