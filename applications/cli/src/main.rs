/// Tandem - terminal player for a Tandem backend
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tandem_server_client::{into_remote_tracks, SearchType, TandemServerClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod keys;
mod player;

use crate::config::CliConfig;
use crate::player::Selection;

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str =
    "tandem=info,tandem_playback=info,tandem_server_client=info,tandem_audio_desktop=info";

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Play catalog and local music from a Tandem backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (default: ./tandem.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend URL, overrides the configuration
    #[arg(long)]
    server: Option<String>,

    /// Initial volume (0.0-1.0), overrides the configuration
    #[arg(long)]
    volume: Option<f32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog and play the results
    Search {
        /// Search query
        query: String,

        /// What to search for: songs, podcasts or episodes
        #[arg(long = "type", default_value = "songs")]
        search_type: SearchType,
    },
    /// Play the home feed
    Home,
    /// Play liked songs
    Liked {
        /// Maximum number of songs
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Play a local collection
    Local {
        /// Collection name
        collection: String,

        /// Index of the first track to play
        #[arg(long, default_value_t = 0)]
        start: usize,
    },
    /// List local collections
    Collections,
    /// Show connection and authentication status
    Status,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.server, cli.volume);
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let client = TandemServerClient::new(config.server_config())?;
    tracing::info!("Using backend at {}", client.url());

    let selection = match cli.command {
        Commands::Collections => return runtime.block_on(list_collections(&client)),
        Commands::Status => return runtime.block_on(status(&client)),
        command => runtime.block_on(fetch_selection(&client, command))?,
    };
    // Catalog requests are done; playback runs on plain threads
    drop(runtime);

    if selection.is_empty() {
        bail!("nothing to play");
    }
    tracing::info!("Queued {} tracks", selection.len());

    player::run(&config, client.stream_urls(), selection)
}

async fn fetch_selection(
    client: &TandemServerClient,
    command: Commands,
) -> anyhow::Result<Selection> {
    let selection = match command {
        Commands::Search { query, search_type } => Selection::Remote(
            client
                .catalog()
                .search(&query, search_type)
                .await
                .with_context(|| format!("search for '{}' failed", query))?,
        ),
        Commands::Home => Selection::Remote(
            client
                .catalog()
                .home()
                .await
                .context("failed to load the home feed")?,
        ),
        Commands::Liked { limit } => {
            let liked = client
                .library()
                .liked_songs(limit)
                .await
                .context("failed to load liked songs")?;
            Selection::Remote(into_remote_tracks(liked.tracks))
        }
        Commands::Local { collection, start } => {
            let detail = client
                .local()
                .collection(&collection)
                .await
                .with_context(|| format!("failed to load collection '{}'", collection))?;
            Selection::Local {
                collection,
                tracks: detail.into_tracks(),
                start,
            }
        }
        Commands::Collections | Commands::Status => bail!("not a playback command"),
    };
    Ok(selection)
}

async fn list_collections(client: &TandemServerClient) -> anyhow::Result<()> {
    let collections = client
        .local()
        .collections()
        .await
        .context("failed to list local collections")?;

    if collections.is_empty() {
        println!("No local collections");
    }
    for collection in collections {
        println!(
            "{} ({} tracks, {})",
            collection.name, collection.track_count, collection.total_size_formatted
        );
    }
    Ok(())
}

async fn status(client: &TandemServerClient) -> anyhow::Result<()> {
    if !client.test_connection().await {
        println!("Backend at {} is unreachable", client.url());
        return Ok(());
    }
    println!("Backend at {} is reachable", client.url());

    let auth = client
        .auth()
        .status()
        .await
        .context("failed to read auth status")?;
    println!(
        "Authenticated: {}{}",
        if auth.authenticated { "yes" } else { "no" },
        if auth.message.is_empty() {
            String::new()
        } else {
            format!(" ({})", auth.message)
        }
    );
    Ok(())
}
