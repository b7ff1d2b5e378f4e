use serde::{Serialize, Serializer};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::ErrorKind;

/// The sites with an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    MangaReader,
    Hentai20,
    OmegaScans,
}
impl SourceId {
    pub const ALL: [SourceId; 3] = [Self::MangaReader, Self::Hentai20, Self::OmegaScans];

    /// Machine name, also the first segment of every cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MangaReader => "mangareader",
            Self::Hentai20 => "hentai20",
            Self::OmegaScans => "omegascans",
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MangaReader => "MangaReader",
            Self::Hentai20 => "Hentai20",
            Self::OmegaScans => "OmegaScans",
        }
    }
}
impl Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for SourceId {
    type Err = ErrorKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ErrorKind::ValidationFailure(format!("unknown source: {value}")))
    }
}

/// One operation a source may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Search,
    SearchSuggestions,
    Popular,
    PopularToday,
    PopularWeek,
    PopularMonth,
    LatestUpdates,
    NewRelease,
    Recommendations,
    Trending,
    Completed,
    TopRated,
    Type,
    Author,
    Genres,
    Genre,
    Home,
    Info,
    Chapter,
}
impl Capability {
    /// Operation name, also the second segment of every cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::SearchSuggestions => "search-suggestions",
            Self::Popular => "popular",
            Self::PopularToday => "popular-today",
            Self::PopularWeek => "popular-week",
            Self::PopularMonth => "popular-month",
            Self::LatestUpdates => "latest-updates",
            Self::NewRelease => "new-release",
            Self::Recommendations => "recommendations",
            Self::Trending => "trending",
            Self::Completed => "completed",
            Self::TopRated => "top-rated",
            Self::Type => "type",
            Self::Author => "author",
            Self::Genres => "genres",
            Self::Genre => "genre",
            Self::Home => "home",
            Self::Info => "info",
            Self::Chapter => "chapter",
        }
    }
}
impl Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static list of the operations a source implements.
///
/// Callers check [`Capabilities::supports`] before invoking an optional
/// operation; unsupported operations fail with [`ErrorKind::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities(&'static [Capability]);
impl Capabilities {
    pub const fn new(capabilities: &'static [Capability]) -> Self {
        Self(capabilities)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}
impl Serialize for Capabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0)
    }
}

/// Descriptor of a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub id: SourceId,
    pub name: &'static str,
    pub base_url: String,
    pub is_active: bool,
    #[serde(rename = "features")]
    pub capabilities: Capabilities,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mangareader", SourceId::MangaReader)]
    #[case("Hentai20", SourceId::Hentai20)]
    #[case(" omegascans ", SourceId::OmegaScans)]
    fn parses_source_ids(#[case] input: &str, #[case] expected: SourceId) {
        assert_eq!(input.parse::<SourceId>().unwrap(), expected);
    }

    #[test]
    fn unknown_source_is_a_validation_failure() {
        assert!(matches!("mangadex".parse::<SourceId>(), Err(ErrorKind::ValidationFailure(_))));
    }

    #[test]
    fn capabilities_serialize_as_operation_names() {
        const CAPABILITIES: Capabilities = Capabilities::new(&[Capability::Search, Capability::SearchSuggestions]);
        assert!(CAPABILITIES.supports(Capability::Search));
        assert!(!CAPABILITIES.supports(Capability::Home));
        let info = SourceInfo {
            id: SourceId::MangaReader,
            name: "MangaReader",
            base_url: "https://mangareader.to".into(),
            is_active: true,
            capabilities: CAPABILITIES,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["id"], "mangareader");
        assert_eq!(json["baseUrl"], "https://mangareader.to");
        assert_eq!(json["features"], serde_json::json!(["search", "search-suggestions"]));
    }
}
