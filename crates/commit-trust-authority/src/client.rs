//! HTTP client for the key authorization endpoint.

use std::time::Duration;

use async_trait::async_trait;
use commit_trust_core::{Authorization, AuthorizationProvider, TrustResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::config::AuthorityConfig;
use crate::error::{AuthorityError, AuthorityResult};

/// User agent for authority requests.
pub const AUTHORITY_USER_AGENT: &str = concat!("commit-trust/", env!("CARGO_PKG_VERSION"));

/// Path of the commit signing authorization endpoint, below the base URL.
const AUTHORIZATION_PATH: [&str; 5] = ["v0", "pgp", "key", "authorization", "git-commit-signing"];

/// Client for the remote key authority.
#[derive(Debug, Clone)]
pub struct AuthorityClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl AuthorityClient {
    /// Create a client. Fails when the token is missing or the base URL is
    /// not an absolute http(s) URL.
    pub fn new(config: AuthorityConfig) -> AuthorityResult<Self> {
        let token = config
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthorityError::Config {
                message: "missing API token".to_string(),
            })?;

        let base_url = Url::parse(&config.base_url).map_err(|e| AuthorityError::Config {
            message: format!("invalid base URL '{}': {}", config.base_url, e),
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(AuthorityError::Config {
                message: format!("invalid base URL '{}'", config.base_url),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(AUTHORITY_USER_AGENT));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| AuthorityError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> AuthorityResult<Self> {
        Self::new(AuthorityConfig::from_env())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ask whether `pgp_key_id` may sign commits for `committer_email`.
    ///
    /// Sends exactly one request.
    pub async fn fetch_authorization(
        &self,
        pgp_key_id: &str,
        committer_email: &str,
    ) -> AuthorityResult<Authorization> {
        let url = self.authorization_url(pgp_key_id, committer_email)?;
        debug!(url = %url, "requesting key authorization");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AuthorityError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        if status != reqwest::StatusCode::OK {
            return Err(AuthorityError::from_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| AuthorityError::InvalidResponse {
            message: format!("failed to parse authorization response: {}", e),
        })
    }

    fn authorization_url(&self, pgp_key_id: &str, committer_email: &str) -> AuthorityResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| AuthorityError::Config {
                message: format!("base URL '{}' cannot carry a path", self.base_url),
            })?;
            segments.pop_if_empty();
            segments.extend(AUTHORIZATION_PATH);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("pgp_key_id", pgp_key_id)
            .append_pair("committer_email", committer_email);
        Ok(url)
    }
}

#[async_trait]
impl AuthorizationProvider for AuthorityClient {
    async fn get_authorization(
        &self,
        issuer_key_id: &str,
        committer_email: &str,
    ) -> TrustResult<Authorization> {
        Ok(self
            .fetch_authorization(issuer_key_id, committer_email)
            .await?)
    }
}
