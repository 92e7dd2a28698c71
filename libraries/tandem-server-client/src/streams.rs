//! Stream URLs handed to the playback engines.

use crate::client::endpoint;
use crate::error::Result;
use crate::types::ServerConfig;
use tandem_core::{CatalogStreams, LocalStreams, TandemError};
use url::Url;

/// Builds stream URLs for one backend.
///
/// Pure string building; nothing is fetched until a device opens the URL.
#[derive(Debug, Clone)]
pub struct StreamUrls {
    base: Url,
}

impl StreamUrls {
    /// Stream URLs for the backend in `config`.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Ok(Self::from_base(config.base_url()?))
    }

    pub(crate) fn from_base(base: Url) -> Self {
        Self { base }
    }

    /// `{base}/api/stream/{id}`
    pub fn catalog(&self, track_id: &str) -> String {
        endpoint(&self.base, &["api", "stream", track_id]).into()
    }

    /// `{base}/api/local/stream/{collection}/{filename}`, percent-encoded
    pub fn local(&self, collection: &str, filename: &str) -> String {
        endpoint(&self.base, &["api", "local", "stream", collection, filename]).into()
    }
}

impl CatalogStreams for StreamUrls {
    fn stream_url(&self, track_id: &str) -> tandem_core::Result<String> {
        if track_id.trim().is_empty() {
            return Err(TandemError::unresolvable(track_id, "empty track id"));
        }
        Ok(self.catalog(track_id))
    }
}

impl LocalStreams for StreamUrls {
    fn stream_url(&self, collection: &str, filename: &str) -> tandem_core::Result<String> {
        if collection.is_empty() || filename.is_empty() {
            return Err(TandemError::unresolvable(
                format!("{}/{}", collection, filename),
                "collection and filename are required",
            ));
        }
        Ok(self.local(collection, filename))
    }
}
