//! Podcast library and channels.

use crate::client::{endpoint, get_json};
use crate::error::Result;
use crate::types::{
    ChannelEpisodes, ChannelInfo, ChannelsResponse, LibraryChannel, LibraryPodcast,
    PodcastsResponse,
};
use reqwest::Client;
use url::Url;

/// Podcast client for the Tandem backend.
pub struct PodcastClient<'a> {
    http: &'a Client,
    base: &'a Url,
}

impl<'a> PodcastClient<'a> {
    pub(crate) fn new(http: &'a Client, base: &'a Url) -> Self {
        Self { http, base }
    }

    /// Podcasts saved in the library.
    pub async fn library_podcasts(&self, limit: u32) -> Result<Vec<LibraryPodcast>> {
        let mut url = endpoint(self.base, &["api", "podcasts", "library"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let response: PodcastsResponse = get_json(self.http, url, "library podcasts").await?;
        Ok(response.podcasts)
    }

    /// Channels the user follows.
    pub async fn library_channels(&self, limit: u32) -> Result<Vec<LibraryChannel>> {
        let mut url = endpoint(self.base, &["api", "podcasts", "channels"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let response: ChannelsResponse = get_json(self.http, url, "library channels").await?;
        Ok(response.channels)
    }

    /// Channel details.
    pub async fn channel(&self, channel_id: &str) -> Result<ChannelInfo> {
        let url = endpoint(self.base, &["api", "podcasts", "channel", channel_id]);
        get_json(self.http, url, "channel").await
    }

    /// One page of a channel's episodes.
    ///
    /// Pass the previous page's `continuation` to fetch the next one.
    pub async fn channel_episodes(
        &self,
        channel_id: &str,
        continuation: Option<&str>,
    ) -> Result<ChannelEpisodes> {
        let mut url = endpoint(
            self.base,
            &["api", "podcasts", "channel", channel_id, "episodes"],
        );
        if let Some(token) = continuation {
            url.query_pairs_mut().append_pair("continuation", token);
        }
        get_json(self.http, url, "channel episodes").await
    }
}
