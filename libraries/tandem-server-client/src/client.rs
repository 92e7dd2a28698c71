//! Main Tandem backend client.

use crate::auth::AuthClient;
use crate::catalog::CatalogClient;
use crate::error::{Result, ServerClientError};
use crate::library::LibraryClient;
use crate::local::LocalFilesClient;
use crate::podcasts::PodcastClient;
use crate::streams::StreamUrls;
use crate::types::ServerConfig;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Timeout for the connection check.
const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Main client for the Tandem backend.
///
/// Read-only access to the catalog, the user's library, podcasts and local
/// collections, plus the stream URLs the player engines open.
///
/// # Example
///
/// ```ignore
/// use tandem_server_client::{SearchType, ServerConfig, TandemServerClient};
///
/// let client = TandemServerClient::new(ServerConfig::new("http://localhost:8000"))?;
///
/// if client.test_connection().await {
///     let songs = client.catalog().search("daft punk", SearchType::Songs).await?;
///     println!("Found {} songs", songs.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TandemServerClient {
    http: Client,
    base: Url,
}

impl TandemServerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let base = config.base_url()?;

        // Create HTTP client with reasonable defaults
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Tandem/{} (CLI)", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServerClientError::Request)?;

        Ok(Self { http, base })
    }

    /// Get the server URL.
    pub fn url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Stream URL builder for this backend.
    pub fn stream_urls(&self) -> StreamUrls {
        StreamUrls::from_base(self.base.clone())
    }

    /// Check that the backend answers at all.
    pub async fn ping(&self) -> Result<()> {
        let url = endpoint(&self.base, &[]);
        debug!(url = %url, "Testing server connection");

        let response = self
            .http
            .get(url)
            .timeout(CONNECTION_TEST_TIMEOUT)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if status.is_success() {
            info!(url = %self.url(), "Connected to server");
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }

    /// Whether the backend answers within five seconds.
    pub async fn test_connection(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!("Connection test failed: {}", e);
                false
            }
        }
    }

    /// Catalog search and browse.
    pub fn catalog(&self) -> CatalogClient<'_> {
        CatalogClient::new(&self.http, &self.base)
    }

    /// The user's catalog library.
    pub fn library(&self) -> LibraryClient<'_> {
        LibraryClient::new(&self.http, &self.base)
    }

    /// Podcast library and channels.
    pub fn podcasts(&self) -> PodcastClient<'_> {
        PodcastClient::new(&self.http, &self.base)
    }

    /// Local collections.
    pub fn local(&self) -> LocalFilesClient<'_> {
        LocalFilesClient::new(&self.http, &self.base)
    }

    /// Backend session status.
    pub fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(&self.http, &self.base)
    }
}

/// `base` with `segments` appended as percent-encoded path segments.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// GET `url` and decode the JSON body.
///
/// 401 maps to `AuthRequired`, other failures to `ServerError`.
pub(crate) async fn get_json<T: DeserializeOwned>(http: &Client, url: Url, what: &str) -> Result<T> {
    debug!(url = %url, "Fetching {}", what);

    let response = http.get(url).send().await.map_err(send_error)?;
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(|e| {
            ServerClientError::ParseError(format!("Failed to parse {}: {}", what, e))
        })
    } else if status == StatusCode::UNAUTHORIZED {
        Err(ServerClientError::AuthRequired)
    } else {
        let error_text = response.text().await.unwrap_or_default();
        Err(ServerClientError::ServerError {
            status: status.as_u16(),
            message: error_text,
        })
    }
}

fn send_error(e: reqwest::Error) -> ServerClientError {
    if e.is_connect() || e.is_timeout() {
        ServerClientError::ServerUnreachable(e.to_string())
    } else {
        ServerClientError::Request(e)
    }
}
