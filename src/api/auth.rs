//! Corral Authentication
//!
//! The client never negotiates sessions itself; it either carries a
//! pre-issued API token, or exchanges username/password credentials for a
//! token at the identity service and caches it until shortly before
//! expiry.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::Error;

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Default token TTL if the identity service does not report an expiry
const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 60;

/// How credentials were supplied
#[derive(Clone)]
enum AuthMethod {
    /// Pre-issued token, used as-is
    Token(String),
    /// Password grant against the identity service
    Password {
        auth_url: String,
        username: String,
        password: String,
        project: Option<String>,
    },
}

/// Credentials holder with token caching
#[derive(Clone)]
pub struct Credentials {
    method: AuthMethod,
    http: reqwest::Client,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// Token issue response from the identity service
#[derive(Deserialize)]
struct TokenResponse {
    token: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Create credentials from a pre-issued token
    pub fn from_token(token: &str) -> Self {
        Self {
            method: AuthMethod::Token(token.to_string()),
            http: reqwest::Client::new(),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Create credentials for password auth against an identity service
    pub fn from_password(
        auth_url: &str,
        username: &str,
        password: &str,
        project: Option<&str>,
    ) -> Self {
        Self {
            method: AuthMethod::Password {
                auth_url: auth_url.trim_end_matches('/').to_string(),
                username: username.to_string(),
                password: password.to_string(),
                project: project.map(str::to_string),
            },
            http: reqwest::Client::new(),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Resolve credentials from loaded configuration.
    ///
    /// A token takes precedence over username/password. Fails when
    /// neither is available.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        if let Some(token) = config.effective_token() {
            return Ok(Self::from_token(&token));
        }

        match (
            config.effective_auth_url(),
            config.effective_username(),
            config.effective_password(),
        ) {
            (Some(auth_url), Some(username), Some(password)) => Ok(Self::from_password(
                &auth_url,
                &username,
                &password,
                config.effective_project().as_deref(),
            )),
            _ => Err(Error::Auth(
                "no credentials: set CORRAL_TOKEN, or CORRAL_AUTH_URL with \
                 CORRAL_USERNAME and CORRAL_PASSWORD"
                    .to_string(),
            )),
        }
    }

    /// Get a token for API calls
    pub async fn token(&self) -> Result<String, Error> {
        // Static tokens are returned as-is; expiry is the issuer's problem
        if let AuthMethod::Token(token) = &self.method {
            return Ok(token.clone());
        }

        // Check cache first - but only return if token is still valid
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let issued = self.issue_token().await?;

        let expires_at = issued
            .expires_at
            .unwrap_or_else(|| Utc::now() + ChronoDuration::seconds(DEFAULT_TOKEN_TTL_SECS))
            - ChronoDuration::seconds(TOKEN_EXPIRY_BUFFER_SECS);

        // Cache it with expiry
        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: issued.token.clone(),
                expires_at,
            });
        }

        tracing::debug!("New token cached, expires at {}", expires_at);

        Ok(issued.token)
    }

    /// Force refresh the token
    pub async fn refresh(&self) -> Result<String, Error> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.token().await
    }

    /// Exchange username/password for a token at the identity service
    async fn issue_token(&self) -> Result<TokenResponse, Error> {
        let AuthMethod::Password {
            auth_url,
            username,
            password,
            project,
        } = &self.method
        else {
            return Err(Error::Auth("issue_token requires password auth".to_string()));
        };

        let url = format!("{auth_url}/v1/tokens");
        tracing::debug!("Requesting token from {}", url);

        let mut body = json!({
            "username": username,
            "password": password,
        });
        if let Some(project) = project {
            body["project"] = json!(project);
        }

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("identity service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Auth(format!(
                "identity service rejected credentials: {status}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::Auth(format!("malformed token response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_token_returned_as_is() {
        let credentials = Credentials::from_token("abc123");
        let token = tokio_test::block_on(credentials.token()).unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn test_cached_token_expiry() {
        let valid = CachedToken {
            token: "t".to_string(),
            expires_at: Utc::now() + ChronoDuration::seconds(300),
        };
        assert!(valid.is_valid());

        let expired = CachedToken {
            token: "t".to_string(),
            expires_at: Utc::now() - ChronoDuration::seconds(1),
        };
        assert!(!expired.is_valid());
    }

    #[test]
    fn test_from_config_without_credentials_fails() {
        // Isolate from ambient environment
        for var in ["CORRAL_TOKEN", "CORRAL_AUTH_URL", "CORRAL_USERNAME", "CORRAL_PASSWORD"] {
            std::env::remove_var(var);
        }
        let config = Config::default();
        let result = Credentials::from_config(&config);
        assert!(matches!(result, Err(Error::Auth(_))));
    }
}
