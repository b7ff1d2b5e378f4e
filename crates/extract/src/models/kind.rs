use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Format of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Manga,
    Manhwa,
    Manhua,
    Comic,
    Doujinshi,
    #[serde(rename = "One-shot")]
    OneShot,
}
impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Manga => "Manga",
            ContentType::Manhwa => "Manhwa",
            ContentType::Manhua => "Manhua",
            ContentType::Comic => "Comic",
            ContentType::Doujinshi => "Doujinshi",
            ContentType::OneShot => "One-shot",
        }
    }
}
impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        crate::normalize::parse_content_type(value)
    }
}
impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
