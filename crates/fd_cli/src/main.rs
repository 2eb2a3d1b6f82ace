use clap::{Parser, Subcommand};
use fd_core::{logging::init_logging, Result};
use fd_scrapers::{http_capabilities, CacheConsistency, DigestManager, FetchConfig};
use fd_storage::{create_storage, StorageConfig, StorageKind};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Feed registry and cached article summaries", long_about = None)]
pub struct Cli {
    /// Storage backend: sqlite or memory (memory forgets everything on exit)
    #[arg(long, env = "DIGEST_STORAGE", default_value = "sqlite")]
    storage: StorageKind,
    #[arg(long, env = "DIGEST_DB_PATH", default_value = "feed-digest.db")]
    db_path: PathBuf,
    /// Summarizer: placeholder, extractive, openai, local, deepseek, anthropic
    #[arg(long, env = "DIGEST_MODEL", default_value = "placeholder")]
    model: String,
    #[arg(long, env = "DIGEST_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long)]
    model_url: Option<String>,
    #[arg(long)]
    model_name: Option<String>,
    /// Total timeout for feed and article fetches, in seconds
    #[arg(long, default_value_t = 30)]
    fetch_timeout: u64,
    /// best-effort or conditional
    #[arg(long, default_value = "best-effort")]
    cache_consistency: CacheConsistency,
    #[arg(long, env = "DIGEST_LOG_LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Manage registered feeds
    Feeds {
        #[command(subcommand)]
        command: FeedCommands,
    },
    /// Print the current entries of a registered feed
    Articles { feed_id: String },
    /// Print the (cached) summary of an article
    Summary {
        url: String,
        /// Recompute even if a summary is cached
        #[arg(long)]
        fresh: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FeedCommands {
    Add { name: String, url: String },
    List,
}

impl Cli {
    /// One-shot commands against in-memory storage lose whatever they write.
    fn discards_state(&self) -> bool {
        self.storage == StorageKind::Memory && !matches!(self.command, Commands::Serve { .. })
    }
}

async fn build_manager(cli: &Cli) -> Result<DigestManager> {
    let storage = create_storage(&StorageConfig {
        kind: cli.storage,
        db_path: cli.db_path.clone(),
    })
    .await?;

    let fetch_config = FetchConfig::default().with_timeout(Duration::from_secs(cli.fetch_timeout));
    let (parser, extractor) = http_capabilities(&fetch_config)?;

    let inference = fd_inference::create_model(fd_inference::Config {
        model: cli.model.clone(),
        api_key: cli.api_key.clone(),
        model_name: cli.model_name.clone(),
        model_url: cli.model_url.clone(),
        ..fd_inference::Config::default()
    })
    .await?;

    info!(
        "✨ Ready (storage: {}, model: {}, cache: {})",
        storage.backend,
        inference.name(),
        cli.cache_consistency
    );

    Ok(DigestManager::new(storage.registry, storage.cache, parser, extractor, inference)
        .with_consistency(cli.cache_consistency))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    if cli.discards_state() {
        warn!("Using memory storage: nothing from this command is kept after it exits");
    }

    let manager = build_manager(&cli).await?;

    match cli.command {
        Commands::Serve { bind } => {
            fd_web::serve(fd_web::AppState::new(manager), bind).await?;
        }
        Commands::Feeds { command } => match command {
            FeedCommands::Add { name, url } => {
                let feed = manager.register_feed(&name, &url).await?;
                print_json(&feed)?;
            }
            FeedCommands::List => {
                for feed in manager.list_feeds().await? {
                    println!("{}\t{}\t{}", feed.id, feed.name, feed.url);
                }
            }
        },
        Commands::Articles { feed_id } => {
            print_json(&manager.get_feed_articles(&feed_id).await?)?;
        }
        Commands::Summary { url, fresh } => {
            let summary = if fresh {
                manager.summarize_url(&url).await?
            } else {
                manager.get_article_summary(&url).await?
            };
            println!("{}", summary.summary);
        }
    }

    Ok(())
}
