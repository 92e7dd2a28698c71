//! Tandem Server Client
//!
//! HTTP client library for the Tandem backend: the catalog, the user's
//! library, podcasts, local collections and stream URLs.
//!
//! # Features
//!
//! - **Catalog**: search, genres, home feed, podcasts, stream info
//! - **Library**: playlists and liked songs (needs a backend session)
//! - **Podcasts**: saved podcasts, channels, paged episodes
//! - **Local files**: collections and their tracks
//! - **Stream URLs**: `StreamUrls` implements the `tandem-core` stream traits
//!
//! # Example
//!
//! ```ignore
//! use tandem_server_client::{ServerConfig, TandemServerClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TandemServerClient::new(ServerConfig::default())?;
//!
//!     let mix = client.local().collection("Road Trip").await?;
//!     let tracks = mix.into_tracks();
//!     println!("{} tracks", tracks.len());
//!
//!     let urls = client.stream_urls();
//!     println!("{}", urls.local("Road Trip", &tracks[0].filename));
//!     Ok(())
//! }
//! ```

mod auth;
mod catalog;
mod client;
mod error;
mod library;
mod local;
mod podcasts;
mod streams;
mod types;

// Re-export main types
pub use client::TandemServerClient;
pub use error::{Result, ServerClientError};
pub use streams::StreamUrls;
pub use types::{
    into_remote_tracks, AuthStatus, CatalogSong, ChannelEpisodes, ChannelInfo, LibraryChannel,
    LibraryPodcast, LikedSongs, LocalCollection, LocalCollectionDetail, LocalFile, Playlist,
    PlaylistDetail, Podcast, SearchResponse, SearchType, ServerConfig, StreamInfo,
    DEFAULT_SERVER_URL,
};

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use catalog::CatalogClient;
pub use library::LibraryClient;
pub use local::LocalFilesClient;
pub use podcasts::PodcastClient;
