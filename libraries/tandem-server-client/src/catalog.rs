//! Catalog search and browse.

use crate::client::{endpoint, get_json};
use crate::error::Result;
use crate::types::{into_remote_tracks, Podcast, SearchResponse, SearchType, StreamInfo};
use reqwest::Client;
use tandem_core::RemoteTrack;
use tracing::debug;
use url::Url;

/// Catalog client for the Tandem backend.
pub struct CatalogClient<'a> {
    http: &'a Client,
    base: &'a Url,
}

impl<'a> CatalogClient<'a> {
    pub(crate) fn new(http: &'a Client, base: &'a Url) -> Self {
        Self { http, base }
    }

    /// Search the catalog.
    pub async fn search(&self, query: &str, search_type: SearchType) -> Result<Vec<RemoteTrack>> {
        let mut url = endpoint(self.base, &["api", "search"]);
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("type", search_type.as_str());

        let response: SearchResponse = get_json(self.http, url, "search results").await?;
        debug!(query, results = response.results.len(), "Search complete");
        Ok(into_remote_tracks(response.results))
    }

    /// Songs for a genre.
    pub async fn search_genre(&self, genre: &str) -> Result<Vec<RemoteTrack>> {
        let url = endpoint(self.base, &["api", "search", "genre", genre]);
        let response: SearchResponse = get_json(self.http, url, "genre results").await?;
        Ok(into_remote_tracks(response.results))
    }

    /// Home feed recommendations.
    pub async fn home(&self) -> Result<Vec<RemoteTrack>> {
        let url = endpoint(self.base, &["api", "home"]);
        let response: SearchResponse = get_json(self.http, url, "home feed").await?;
        Ok(into_remote_tracks(response.results))
    }

    /// Podcast details and episodes.
    pub async fn podcast(&self, podcast_id: &str) -> Result<Podcast> {
        let url = endpoint(self.base, &["api", "podcast", podcast_id]);
        get_json(self.http, url, "podcast").await
    }

    /// Stream details for a catalog item.
    pub async fn stream_info(&self, video_id: &str) -> Result<StreamInfo> {
        let url = endpoint(self.base, &["api", "stream-info", video_id]);
        get_json(self.http, url, "stream info").await
    }
}
