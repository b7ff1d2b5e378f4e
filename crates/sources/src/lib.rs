//! Site adapters and the cached scraping service.
//!
//! Each [`Source`] turns operations such as search or chapter lookup into
//! queue-paced fetches plus extraction. A [`CachedSource`] puts one source
//! behind the shared two-tier cache, and the [`Registry`] holds one of those
//! per site.
//!
//! ```no_run
//! use scanline_cache::Cache;
//! use scanline_fetch::RequestQueue;
//! use scanline_sources::{Registry, RegistryConfig, SourceId};
//! use std::sync::Arc;
//!
//! # async fn run() -> scanline_sources::error::Result<()> {
//! let queue = Arc::new(RequestQueue::default());
//! let registry = Registry::from_config(&RegistryConfig::default(), queue, Arc::new(Cache::default()))?;
//! let results = registry.require(SourceId::MangaReader)?.search("one piece", 1).await?;
//! println!("{} results, cached: {}", results.value.len(), results.hit);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
mod capability;
pub mod error;
mod registry;
mod service;
mod source;

pub use crate::capability::{Capabilities, Capability, SourceId, SourceInfo};
pub use crate::registry::{Registry, RegistryConfig, SiteUrls};
pub use crate::service::{Cached, CachedSource, Record, TtlPolicy};
pub use crate::source::{PAGE_SIZE, PageInfo, Ranking, Source};
