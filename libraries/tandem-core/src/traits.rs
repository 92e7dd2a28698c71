/// Core traits for Tandem
use crate::error::Result;

/// Resolves catalog track identifiers to playable stream URLs
///
/// Implemented by the catalog service client. Resolution is a pure
/// computation over the client's configuration; no request is issued.
pub trait CatalogStreams: Send + Sync {
    /// Stream URL for a remote track identifier
    ///
    /// # Errors
    /// Returns an error if the identifier cannot be expressed as a URL
    fn stream_url(&self, track_id: &str) -> Result<String>;
}

/// Resolves files inside a named local collection to playable stream URLs
pub trait LocalStreams: Send + Sync {
    /// Stream URL for `filename` within `collection`
    ///
    /// # Errors
    /// Returns an error if the pair cannot be expressed as a URL
    fn stream_url(&self, collection: &str, filename: &str) -> Result<String>;
}
