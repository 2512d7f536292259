//! HTTP utilities for Corral REST API calls

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A failed request, before it is given resource context.
///
/// The HTTP layer does not know which resource an URL refers to, so it
/// reports failures in raw form; callers attach the resource kind and
/// identifier via [`HttpFailure::into_error`].
#[derive(Debug)]
pub enum HttpFailure {
    /// The server answered with a non-success status
    Status { status: StatusCode, body: String },
    /// The request never completed (connection, timeout, TLS, ...)
    Transport(String),
    /// No usable token could be obtained for the request
    Auth(String),
    /// The response body was not valid JSON
    Malformed(String),
}

impl HttpFailure {
    /// Attach resource context and convert to the public error type
    pub fn into_error(self, kind: &'static str, id: &str) -> Error {
        match self {
            HttpFailure::Status { status, body } => Error::from_status(status, &body, kind, id),
            HttpFailure::Transport(msg) => Error::Transport(msg),
            HttpFailure::Auth(msg) => Error::Auth(msg),
            HttpFailure::Malformed(msg) => Error::Protocol(msg),
        }
    }
}

impl From<reqwest::Error> for HttpFailure {
    fn from(err: reqwest::Error) -> Self {
        HttpFailure::Transport(err.to_string())
    }
}

/// HTTP client wrapper for Corral API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(concat!("corral/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Make a GET request to the Corral API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value, HttpFailure> {
        self.request(Method::GET, url, token, None).await
    }

    /// Make a POST request to the Corral API
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value, HttpFailure> {
        self.request(Method::POST, url, token, body).await
    }

    /// Make a PATCH request to the Corral API
    pub async fn patch(&self, url: &str, token: &str, body: &Value) -> Result<Value, HttpFailure> {
        self.request(Method::PATCH, url, token, Some(body)).await
    }

    /// Make a PUT request to the Corral API
    pub async fn put(&self, url: &str, token: &str, body: &Value) -> Result<Value, HttpFailure> {
        self.request(Method::PUT, url, token, Some(body)).await
    }

    /// Make a DELETE request to the Corral API
    pub async fn delete(&self, url: &str, token: &str) -> Result<Value, HttpFailure> {
        self.request(Method::DELETE, url, token, None).await
    }

    /// Issue one request and parse the JSON response
    async fn request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, HttpFailure> {
        let request_id = Uuid::new_v4();
        tracing::debug!("{} {} [request-id: {}]", method, url, request_id);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("X-Request-Id", request_id.to_string());

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error: {} - {} [request-id: {}]",
                status,
                sanitize_for_log(&response_body),
                request_id
            );
            return Err(HttpFailure::Status {
                status,
                body: response_body,
            });
        }

        // Handle empty response (e.g. 204 from DELETE)
        if response_body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_body)
            .map_err(|e| HttpFailure::Malformed(format!("failed to parse response JSON: {e}")))
    }
}
