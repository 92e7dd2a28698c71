//! Local collections served by the backend.

use crate::client::{endpoint, get_json};
use crate::error::Result;
use crate::types::{CollectionsResponse, LocalCollection, LocalCollectionDetail};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Local-file client for the Tandem backend.
pub struct LocalFilesClient<'a> {
    http: &'a Client,
    base: &'a Url,
}

impl<'a> LocalFilesClient<'a> {
    pub(crate) fn new(http: &'a Client, base: &'a Url) -> Self {
        Self { http, base }
    }

    /// Every local collection.
    pub async fn collections(&self) -> Result<Vec<LocalCollection>> {
        let url = endpoint(self.base, &["api", "local", "playlists"]);
        let response: CollectionsResponse = get_json(self.http, url, "local collections").await?;
        debug!(collections = response.playlists.len(), "Fetched local collections");
        Ok(response.playlists)
    }

    /// One collection and its files.
    ///
    /// Use [`LocalCollectionDetail::into_tracks`] to get playable tracks.
    pub async fn collection(&self, name: &str) -> Result<LocalCollectionDetail> {
        let url = endpoint(self.base, &["api", "local", "playlist", name]);
        get_json(self.http, url, "local collection").await
    }
}
