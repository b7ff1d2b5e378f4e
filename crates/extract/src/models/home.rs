use serde::{Deserialize, Serialize};

use super::SearchResult;

/// Curated sections of a source's landing page. Sections a source does not
/// offer stay empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trending: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub popular_today: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latest_updates: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_releases: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<SearchResult>,
}
impl HomeFeed {
    pub fn is_empty(&self) -> bool {
        self.trending.is_empty()
            && self.popular_today.is_empty()
            && self.latest_updates.is_empty()
            && self.new_releases.is_empty()
            && self.recommendations.is_empty()
    }
}
