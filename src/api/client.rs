//! Corral Client
//!
//! Main client for interacting with the Corral API, combining
//! authentication and HTTP functionality.

use serde_json::Value;
use url::Url;

use super::auth::Credentials;
use super::http::{HttpClient, HttpFailure};
use crate::error::Error;

/// API version prefix carried by every request path
const API_VERSION: &str = "v1";

/// Main Corral client
#[derive(Clone)]
pub struct Client {
    pub credentials: Credentials,
    pub http: HttpClient,
    endpoint: Url,
}

impl Client {
    /// Create a new Corral client against the given service endpoint
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self, Error> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Transport(format!("invalid endpoint '{endpoint}': {e}")))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Transport(format!(
                "invalid endpoint '{endpoint}': scheme must be http or https"
            )));
        }

        let http = HttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            endpoint,
        })
    }

    /// The configured service endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build a versioned API URL
    ///
    /// `path` is relative to the version root, e.g. `nodes/detail?limit=5`.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            API_VERSION,
            path.trim_start_matches('/')
        )
    }

    /// Make a GET request to the Corral API
    pub async fn get(&self, path: &str) -> Result<Value, HttpFailure> {
        let token = self.token().await?;
        self.http.get(&self.api_url(path), &token).await
    }

    /// Make a POST request to the Corral API
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, HttpFailure> {
        let token = self.token().await?;
        self.http.post(&self.api_url(path), &token, body).await
    }

    /// Make a PATCH request to the Corral API
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, HttpFailure> {
        let token = self.token().await?;
        self.http.patch(&self.api_url(path), &token, body).await
    }

    /// Make a PUT request to the Corral API
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, HttpFailure> {
        let token = self.token().await?;
        self.http.put(&self.api_url(path), &token, body).await
    }

    /// Make a DELETE request to the Corral API
    pub async fn delete(&self, path: &str) -> Result<Value, HttpFailure> {
        let token = self.token().await?;
        self.http.delete(&self.api_url(path), &token).await
    }

    async fn token(&self) -> Result<String, HttpFailure> {
        self.credentials
            .token()
            .await
            .map_err(|e| HttpFailure::Auth(e.to_string()))
    }
}
