//! Backend session status.

use crate::client::{endpoint, get_json};
use crate::error::Result;
use crate::types::AuthStatus;
use reqwest::Client;
use url::Url;

/// Auth client for the Tandem backend.
///
/// Only reads the session state; logging in happens on the backend.
pub struct AuthClient<'a> {
    http: &'a Client,
    base: &'a Url,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base: &'a Url) -> Self {
        Self { http, base }
    }

    /// Whether the backend holds an authenticated catalog session.
    pub async fn status(&self) -> Result<AuthStatus> {
        let url = endpoint(self.base, &["api", "auth", "status"]);
        get_json(self.http, url, "auth status").await
    }
}
