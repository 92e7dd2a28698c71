//! Types for Tandem backend requests and responses.

use serde::{Deserialize, Serialize};
use tandem_core::{LocalTrack, RemoteKind, RemoteTrack};
use url::Url;

use crate::error::{Result, ServerClientError};

/// Backend URL used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Configuration for connecting to a Tandem backend.
///
/// Changing the backend means building a new client from a new config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the backend (e.g., "http://localhost:8000")
    pub url: String,
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Validate and normalise the URL.
    ///
    /// Trailing slashes are dropped; only `http` and `https` are accepted.
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.url.trim();
        if trimmed.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let trimmed = trimmed.trim_end_matches('/');
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        Url::parse(trimmed).map_err(|e| ServerClientError::InvalidUrl(format!("{}: {}", trimmed, e)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// What to search the catalog for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Songs,
    Podcasts,
    Episodes,
}

impl SearchType {
    /// Query-string value
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Songs => "songs",
            SearchType::Podcasts => "podcasts",
            SearchType::Episodes => "episodes",
        }
    }
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "songs" => Ok(SearchType::Songs),
            "podcasts" => Ok(SearchType::Podcasts),
            "episodes" => Ok(SearchType::Episodes),
            other => Err(format!("unknown search type '{}'", other)),
        }
    }
}

/// A song or episode as returned by the catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSong {
    pub video_id: String,
    #[serde(default)]
    pub podcast_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Display duration, e.g. "3:45"
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CatalogSong> for RemoteTrack {
    fn from(song: CatalogSong) -> Self {
        let kind = match song.kind.as_deref() {
            Some("episode" | "podcast") => RemoteKind::Episode,
            _ if song.podcast_id.is_some() => RemoteKind::Episode,
            _ => RemoteKind::Song,
        };

        RemoteTrack {
            id: song.video_id,
            title: song.title,
            artist: song.artist,
            thumbnail: song.thumbnail,
            duration_hint: song.duration_seconds.filter(|s| s.is_finite() && *s > 0.0),
            podcast_id: song.podcast_id,
            kind,
        }
    }
}

/// Convert catalog songs to playable tracks.
pub fn into_remote_tracks(songs: Vec<CatalogSong>) -> Vec<RemoteTrack> {
    songs.into_iter().map(RemoteTrack::from).collect()
}

/// Response from search and home endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    pub results: Vec<CatalogSong>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(rename = "type", default)]
    pub search_type: Option<SearchType>,
}

/// Podcast with its episodes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
    pub podcast_id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub episodes: Vec<CatalogSong>,
}

/// Resolved stream details for a catalog item.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub url: String,
    pub content_type: String,
    pub duration: f64,
    pub title: String,
}

// =============================================================================
// Auth Types
// =============================================================================

/// Whether the backend holds an authenticated catalog session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Library Types
// =============================================================================

/// Playlist in the user's catalog library.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub playlist_id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub track_count: u32,
}

/// Playlist with its tracks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub playlist_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub track_count: u32,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tracks: Vec<CatalogSong>,
}

/// The user's liked songs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedSongs {
    pub title: String,
    #[serde(default)]
    pub track_count: u32,
    #[serde(default)]
    pub tracks: Vec<CatalogSong>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistsResponse {
    pub playlists: Vec<Playlist>,
}

// =============================================================================
// Podcast Library Types
// =============================================================================

/// Podcast saved in the user's library.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPodcast {
    pub podcast_id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Channel the user follows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryChannel {
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Channel details.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub episode_count: u32,
}

/// One page of a channel's episodes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEpisodes {
    pub episodes: Vec<CatalogSong>,
    /// Token for the next page
    #[serde(default)]
    pub continuation: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PodcastsResponse {
    pub podcasts: Vec<LibraryPodcast>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelsResponse {
    pub channels: Vec<LibraryChannel>,
}

// =============================================================================
// Local File Types
// =============================================================================

/// A file inside a local collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFile {
    pub filename: String,
    pub title: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub size_formatted: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub extension: Option<String>,
}

impl LocalFile {
    /// Playable track belonging to `collection`
    pub fn into_track(self, collection: &str) -> LocalTrack {
        LocalTrack {
            collection_name: collection.to_string(),
            filename: self.filename,
            title: self.title,
            size_bytes: self.size,
            extension: self
                .extension
                .map(|e| e.trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty()),
        }
    }
}

/// Summary of a local collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCollection {
    pub name: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub track_count: u32,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub total_size_formatted: String,
}

/// Local collection with its files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCollectionDetail {
    pub name: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub tracks: Vec<LocalFile>,
    #[serde(default)]
    pub track_count: u32,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub total_size_formatted: String,
}

impl LocalCollectionDetail {
    /// Files as playable tracks stamped with this collection's name
    pub fn into_tracks(self) -> Vec<LocalTrack> {
        let name = self.name;
        self.tracks
            .into_iter()
            .map(|file| file.into_track(&name))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionsResponse {
    pub playlists: Vec<LocalCollection>,
}
