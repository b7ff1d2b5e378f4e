use std::collections::BTreeMap;
use std::fmt;

/// Deterministic cache key for one `(source, operation, parameters)` triple.
///
/// Renders as `source:operation:name:value|name:value` with parameters sorted
/// by name, so the order in which they are added never changes the key. An
/// operation without parameters keeps its trailing separator
/// (`mangareader:genres:`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    source: String,
    operation: String,
    params: BTreeMap<String, String>,
}
impl CacheKey {
    pub fn new(source: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            operation: operation.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:", self.source, self.operation)?;
        for (index, (name, value)) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str("|")?;
            }
            write!(f, "{name}:{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parameter_order_does_not_matter() {
        let forward = CacheKey::new("src", "op").param("a", 1).param("b", 2);
        let backward = CacheKey::new("src", "op").param("b", 2).param("a", 1);
        assert_eq!(forward, backward);
        assert_eq!(forward.to_string(), backward.to_string());
        assert_eq!(forward.to_string(), "src:op:a:1|b:2");
    }

    #[rstest]
    #[case(CacheKey::new("mangareader", "search").param("query", "one piece").param("page", 1), "mangareader:search:page:1|query:one piece")]
    #[case(CacheKey::new("hentai20", "genres"), "hentai20:genres:")]
    #[case(CacheKey::new("omegascans", "info").param("id", "solo-leveling"), "omegascans:info:id:solo-leveling")]
    fn renders(#[case] key: CacheKey, #[case] expected: &str) {
        assert_eq!(key.to_string(), expected);
    }

    #[test]
    fn later_parameter_replaces_earlier() {
        let key = CacheKey::new("src", "op").param("page", 1).param("page", 2);
        assert_eq!(key.to_string(), "src:op:page:2");
    }
}
