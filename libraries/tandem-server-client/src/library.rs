//! The user's catalog library.
//!
//! These endpoints answer 401 until the backend has a catalog session.

use crate::client::{endpoint, get_json};
use crate::error::Result;
use crate::types::{LikedSongs, Playlist, PlaylistDetail, PlaylistsResponse};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Library client for the Tandem backend.
pub struct LibraryClient<'a> {
    http: &'a Client,
    base: &'a Url,
}

impl<'a> LibraryClient<'a> {
    pub(crate) fn new(http: &'a Client, base: &'a Url) -> Self {
        Self { http, base }
    }

    /// Playlists saved in the library.
    pub async fn playlists(&self) -> Result<Vec<Playlist>> {
        let url = endpoint(self.base, &["api", "library", "playlists"]);
        let response: PlaylistsResponse = get_json(self.http, url, "library playlists").await?;
        debug!(playlists = response.playlists.len(), "Fetched library playlists");
        Ok(response.playlists)
    }

    /// Liked songs, at most `limit`.
    pub async fn liked_songs(&self, limit: u32) -> Result<LikedSongs> {
        let mut url = endpoint(self.base, &["api", "library", "liked-songs"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        get_json(self.http, url, "liked songs").await
    }

    /// A playlist and its tracks.
    pub async fn playlist(&self, playlist_id: &str) -> Result<PlaylistDetail> {
        let url = endpoint(self.base, &["api", "library", "playlist", playlist_id]);
        get_json(self.http, url, "playlist").await
    }
}
