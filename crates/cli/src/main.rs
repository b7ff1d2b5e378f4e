//! `scanline`: scrape manga listings, details and chapters from the command
//! line, printing JSON.

mod error;
mod output;

use clap::{Parser, Subcommand};
use exn::ResultExt;
use scanline_cache::{Cache, SqliteStore};
use scanline_config::Config;
use scanline_fetch::RequestQueue;
use scanline_sources::{CachedSource, Ranking, Registry, SourceId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{ErrorKind, Result, report, sourced};
use crate::output::Envelope;

#[derive(Debug, Parser)]
#[command(name = "scanline", version, about = "Scrape manga sites into JSON")]
struct Cli {
    /// Config file (toml, yaml or json). Discovered in the user config
    /// directory when omitted.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
    /// Site to query.
    #[arg(long, short, global = true, default_value = "mangareader")]
    source: SourceId,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the configured sources and what they support.
    Sources,
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Quick title suggestions for a partial query.
    Suggest { query: String },
    Popular {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    PopularToday {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    PopularWeek {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    PopularMonth {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Latest {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    NewReleases {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Recommendations {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Trending {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Completed {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    TopRated {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Titles of one content type, e.g. `manhwa`, or `comic`/`novel` on omegascans.
    Type {
        kind: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Other titles by an author.
    Author {
        name: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Genres,
    /// Titles tagged with a genre slug.
    Genre {
        slug: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// The landing page feed.
    Home,
    /// Details and chapter list for one title.
    Info { id: String },
    /// Page images of one chapter.
    Chapter { id: String },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// The two-tier cache, or memory only when the durable store is disabled or
/// cannot be opened.
async fn open_cache(config: &Config) -> Cache {
    let cache = Cache::new(config.cache_config());
    let Some(path) = config.durable_path() else {
        return cache;
    };
    if let Some(parent) = path.parent()
        && let Err(err) = std::fs::create_dir_all(parent)
    {
        tracing::warn!(path = %parent.display(), error = %err, "Cannot create cache directory, continuing without durable cache");
        return cache;
    }
    match SqliteStore::connect(&path).await {
        Ok(store) => {
            tracing::debug!(path = %path.display(), "Opened durable cache");
            cache.with_durable(Arc::new(store))
        },
        Err(err) => {
            let kind: &scanline_cache::error::ErrorKind = &err;
            tracing::warn!(path = %path.display(), error = %kind, "Durable cache unavailable, continuing in memory");
            cache
        },
    }
}

async fn ranked(source: &CachedSource, ranking: Ranking, page: u32) -> Result<String> {
    let cached = sourced(source.ranked(&ranking, page).await)?;
    Envelope::page(source.id(), page, cached).render()
}

async fn run(command: Command, registry: &Registry, id: SourceId) -> Result<String> {
    let source = || sourced(registry.require(id));
    match command {
        Command::Sources => serde_json::to_string_pretty(&registry.descriptors()).or_raise(|| ErrorKind::Output),
        Command::Search { query, page } => Envelope::page(id, page, sourced(source()?.search(&query, page).await)?).render(),
        Command::Suggest { query } => Envelope::new(id, sourced(source()?.search_suggestions(&query).await)?).render(),
        Command::Popular { page } => Envelope::page(id, page, sourced(source()?.popular(page).await)?).render(),
        Command::PopularToday { page } => Envelope::page(id, page, sourced(source()?.popular_today(page).await)?).render(),
        Command::PopularWeek { page } => ranked(source()?, Ranking::PopularWeek, page).await,
        Command::PopularMonth { page } => ranked(source()?, Ranking::PopularMonth, page).await,
        Command::Latest { page } => Envelope::page(id, page, sourced(source()?.latest_updates(page).await)?).render(),
        Command::NewReleases { page } => ranked(source()?, Ranking::NewRelease, page).await,
        Command::Recommendations { page } => {
            Envelope::page(id, page, sourced(source()?.recommendations(page).await)?).render()
        },
        Command::Trending { page } => ranked(source()?, Ranking::Trending, page).await,
        Command::Completed { page } => ranked(source()?, Ranking::Completed, page).await,
        Command::TopRated { page } => ranked(source()?, Ranking::TopRated, page).await,
        Command::Type { kind, page } => ranked(source()?, Ranking::Type(kind), page).await,
        Command::Author { name, page } => ranked(source()?, Ranking::Author(name), page).await,
        Command::Genres => Envelope::new(id, sourced(source()?.genres().await)?).render(),
        Command::Genre { slug, page } => Envelope::page(id, page, sourced(source()?.genre(&slug, page).await)?).render(),
        Command::Home => Envelope::new(id, sourced(source()?.home().await)?).render(),
        Command::Info { id: content } => Envelope::new(id, sourced(source()?.info(&content).await)?).render(),
        Command::Chapter { id: chapter } => Envelope::new(id, sourced(source()?.chapter(&chapter).await)?).render(),
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config).map_err(report)?;
    let registry_config = config.registry_config().or_raise(|| ErrorKind::Config).map_err(report)?;
    let queue = Arc::new(RequestQueue::new(config.queue_delay()));
    let cache = Arc::new(open_cache(&config).await);
    let registry = Registry::from_config(&registry_config, Arc::clone(&queue), cache)
        .or_raise(|| ErrorKind::Setup)
        .map_err(report)?;

    let outcome = run(cli.command, &registry, cli.source).await;
    queue.shutdown().await;
    println!("{}", outcome.map_err(report)?);
    Ok(())
}
