//! HTTP fetching for scanline sources.
//!
//! A [`Fetcher`] is bound to one site. All fetchers of a process share a
//! single [`RequestQueue`], which runs requests one at a time and spaces them
//! out. Failed attempts are retried according to a [`RetryPolicy`].

pub mod agents;
pub mod client;
pub mod error;
pub mod queue;
pub mod retry;

pub use agents::{DEFAULT_USER_AGENTS, UserAgents};
pub use client::{DEFAULT_TIMEOUT, FetchConfig, Fetcher};
pub use queue::RequestQueue;
pub use retry::{RetryMode, RetryPolicy};
