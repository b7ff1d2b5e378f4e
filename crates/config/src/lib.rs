//! Layered configuration.
//!
//! Values are merged, later layers winning, from:
//! 1. built-in defaults,
//! 2. a config file (`scanline.toml`, `.yaml` or `.json`), either given
//!    explicitly or found in the platform config directory,
//! 3. `SCANLINE_` environment variables, with `__` separating nested keys
//!    (`SCANLINE_QUEUE__DELAY_MS=250`).
//!
//! The merged result is validated before it is handed out.

pub mod error;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use scanline_cache::CacheConfig;
use scanline_fetch::{DEFAULT_USER_AGENTS, RetryMode, RetryPolicy, UserAgents};
use scanline_sources::adapters::{hentai20, mangareader, omegascans};
use scanline_sources::{RegistryConfig, SiteUrls, TtlPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "SCANLINE_";
const FILE_STEM: &str = "scanline";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchSettings,
    pub queue: QueueSettings,
    pub cache: CacheSettings,
    pub ttl: TtlSettings,
    pub sources: SourceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_ms: u64,
    pub user_agents: Vec<String>,
    /// Total attempts per request, the first one included.
    pub retry_attempts: u32,
    /// Delay after the first failed attempt; doubled after each further one.
    pub retry_delay_ms: u64,
    pub retry_mode: RetryMode,
}
impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|agent| agent.to_string()).collect(),
            retry_attempts: 3,
            retry_delay_ms: 1000,
            retry_mode: RetryMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Pause between two queued requests.
    pub delay_ms: u64,
}
impl Default for QueueSettings {
    fn default() -> Self {
        Self { delay_ms: 500 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// TTL of values promoted from the durable tier.
    pub ephemeral_ttl_secs: u64,
    pub durable_ttl_secs: u64,
    pub durable: bool,
    /// SQLite file of the durable tier; defaults to the platform cache directory.
    pub path: Option<PathBuf>,
}
impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ephemeral_ttl_secs: 600,
            durable_ttl_secs: 3600,
            durable: true,
            path: None,
        }
    }
}

/// Ephemeral TTL per data category, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlSettings {
    pub listings: u64,
    pub suggestions: u64,
    pub info: u64,
    pub chapter: u64,
    pub genres: u64,
    pub home: u64,
}
impl Default for TtlSettings {
    fn default() -> Self {
        let policy = TtlPolicy::default();
        Self {
            listings: policy.listings.as_secs(),
            suggestions: policy.suggestions.as_secs(),
            info: policy.info.as_secs(),
            chapter: policy.chapter.as_secs(),
            genres: policy.genres.as_secs(),
            home: policy.home.as_secs(),
        }
    }
}

/// Base URLs of the sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub mangareader: String,
    pub hentai20: String,
    pub omegascans: String,
    pub omegascans_api: String,
}
impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            mangareader: mangareader::BASE_URL.to_string(),
            hentai20: hentai20::BASE_URL.to_string(),
            omegascans: omegascans::BASE_URL.to_string(),
            omegascans_api: omegascans::API_BASE_URL.to_string(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", FILE_STEM)
}

/// First `scanline.{toml,yaml,yml,json}` in the platform config directory.
fn discover() -> Option<PathBuf> {
    let dir = project_dirs()?.config_dir().to_path_buf();
    ["toml", "yaml", "yml", "json"].into_iter().map(|ext| dir.join(format!("{FILE_STEM}.{ext}"))).find(|path| path.is_file())
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).or_raise(|| ErrorKind::Invalid(format!("{field} is not a valid URL: {value}")))
}

impl Config {
    /// The layered figment, without extracting it.
    ///
    /// An explicit `path` must exist and have a known extension.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = match path {
            Some(path) if !path.is_file() => {
                exn::bail!(ErrorKind::Invalid(format!("config file not found: {}", path.display())));
            },
            Some(path) => Some(path.to_path_buf()),
            None => discover(),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Loading config file");
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
                Some("json") => figment.merge(Json::file(&file)),
                _ => exn::bail!(ErrorKind::Invalid(format!("unsupported config format: {}", file.display()))),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads and validates the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agents.iter().all(|agent| agent.trim().is_empty()) {
            exn::bail!(ErrorKind::Invalid("fetch.user_agents must not be empty".to_string()));
        }
        if self.fetch.retry_attempts == 0 {
            exn::bail!(ErrorKind::Invalid("fetch.retry_attempts must be at least 1".to_string()));
        }
        if self.fetch.timeout_ms == 0 {
            exn::bail!(ErrorKind::Invalid("fetch.timeout_ms must be positive".to_string()));
        }
        self.site_urls()?;
        Ok(())
    }

    fn site_urls(&self) -> Result<SiteUrls> {
        Ok(SiteUrls {
            mangareader: parse_url("sources.mangareader", &self.sources.mangareader)?,
            hentai20: parse_url("sources.hentai20", &self.sources.hentai20)?,
            omegascans: parse_url("sources.omegascans", &self.sources.omegascans)?,
            omegascans_api: parse_url("sources.omegascans_api", &self.sources.omegascans_api)?,
        })
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            listings: Duration::from_secs(self.ttl.listings),
            suggestions: Duration::from_secs(self.ttl.suggestions),
            info: Duration::from_secs(self.ttl.info),
            chapter: Duration::from_secs(self.ttl.chapter),
            genres: Duration::from_secs(self.ttl.genres),
            home: Duration::from_secs(self.ttl.home),
        }
    }

    pub fn registry_config(&self) -> Result<RegistryConfig> {
        let user_agents = UserAgents::new(self.fetch.user_agents.iter().cloned())
            .or_raise(|| ErrorKind::Invalid("fetch.user_agents must not be empty".to_string()))?;
        Ok(RegistryConfig {
            urls: self.site_urls()?,
            timeout: Duration::from_millis(self.fetch.timeout_ms),
            user_agents,
            retry: RetryPolicy {
                max_attempts: self.fetch.retry_attempts,
                base_delay: Duration::from_millis(self.fetch.retry_delay_ms),
                mode: self.fetch.retry_mode,
            },
            ttl: self.ttl_policy(),
        })
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ephemeral_ttl: Duration::from_secs(self.cache.ephemeral_ttl_secs),
            durable_ttl: Duration::from_secs(self.cache.durable_ttl_secs),
        }
    }

    pub fn queue_delay(&self) -> Duration {
        Duration::from_millis(self.queue.delay_ms)
    }

    /// Location of the durable cache, `None` when it is disabled or no
    /// platform cache directory exists.
    pub fn durable_path(&self) -> Option<PathBuf> {
        if !self.cache.durable {
            return None;
        }
        self.cache.path.clone().or_else(|| Some(project_dirs()?.cache_dir().join("cache.sqlite")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        let registry = config.registry_config().unwrap();
        assert_eq!(registry.timeout, Duration::from_millis(15_000));
        assert_eq!(registry.retry, RetryPolicy::default());
        assert_eq!(registry.user_agents.len(), 4);
        assert_eq!(config.queue_delay(), Duration::from_millis(500));
        assert_eq!(config.cache_config(), CacheConfig::default());
        assert_eq!(config.ttl_policy(), TtlPolicy::default());
    }

    #[test]
    fn file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "scanline.toml",
                r#"
                    [fetch]
                    retry_attempts = 5
                    retry_mode = "transient-only"

                    [queue]
                    delay_ms = 100
                "#,
            )?;
            jail.set_env("SCANLINE_QUEUE__DELAY_MS", "250");
            jail.set_env("SCANLINE_TTL__HOME", "60");
            let config = Config::load(Some(Path::new("scanline.toml"))).unwrap();
            assert_eq!(config.fetch.retry_attempts, 5);
            assert_eq!(config.fetch.retry_mode, RetryMode::TransientOnly);
            assert_eq!(config.queue.delay_ms, 250);
            assert_eq!(config.ttl_policy().home, Duration::from_secs(60));
            // Untouched values keep their defaults.
            assert_eq!(config.fetch.timeout_ms, 15_000);
            Ok(())
        });
    }

    #[test]
    fn yaml_files_are_read() {
        Jail::expect_with(|jail| {
            jail.create_file("scanline.yaml", "cache:\n  durable: false\n  durable_ttl_secs: 7200\n")?;
            let config = Config::load(Some(Path::new("scanline.yaml"))).unwrap();
            assert!(!config.cache.durable);
            assert_eq!(config.durable_path(), None);
            assert_eq!(config.cache_config().durable_ttl, Duration::from_secs(7200));
            Ok(())
        });
    }

    #[rstest]
    #[case("[fetch]\nretry_attempts = 0\n")]
    #[case("[fetch]\nuser_agents = []\n")]
    #[case("[sources]\nhentai20 = \"not a url\"\n")]
    fn invalid_values_are_rejected(#[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanline.toml");
        std::fs::write(&path, contents).unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn malformed_files_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanline.json");
        std::fs::write(&path, r#"{"queue": {"delay_ms": "soon"}}"#).unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
        let other = dir.path().join("scanline.ini");
        std::fs::write(&other, "").unwrap();
        assert!(Config::load(Some(&other)).is_err());
    }

    #[test]
    fn explicit_cache_path_wins() {
        let mut config = Config::default();
        config.cache.path = Some(PathBuf::from("/tmp/scanline-test.sqlite"));
        assert_eq!(config.durable_path(), Some(PathBuf::from("/tmp/scanline-test.sqlite")));
    }
}
