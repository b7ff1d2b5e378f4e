use crate::error::{ErrorKind, Result};

/// Desktop browser identities rotated across requests.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// A non-empty pool of user-agent strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgents {
    pool: Vec<String>,
}
impl UserAgents {
    pub fn new(pool: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let pool: Vec<String> = pool.into_iter().map(Into::into).filter(|agent: &String| !agent.trim().is_empty()).collect();
        if pool.is_empty() {
            exn::bail!(ErrorKind::Client("user-agent pool is empty".to_string()));
        }
        Ok(Self { pool })
    }

    /// Chooses an agent uniformly at random.
    pub fn pick(&self) -> &str {
        // Never empty, see `new`.
        &self.pool[fastrand::usize(..self.pool.len())]
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.pool.iter().any(|known| known == agent)
    }
}
impl Default for UserAgents {
    fn default() -> Self {
        Self { pool: DEFAULT_USER_AGENTS.iter().map(|agent| agent.to_string()).collect() }
    }
}
