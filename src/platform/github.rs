//! GitHub App REST client

use crate::error::{Error, Result};
use crate::platform::InstallationSource;
use crate::types::{Installation, InstallationToken, SecretString};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::LINK;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Public GitHub API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest response body accepted from GitHub
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1 << 20;

const API_VERSION: &str = "2022-11-28";

/// Installations requested per listing page (the API maximum)
const PAGE_SIZE: u32 = 100;

/// Listing pages followed before giving up
const MAX_PAGES: u32 = 50;

#[derive(Deserialize)]
struct InstallationResponse {
    id: u64,
    account: Option<AccountResponse>,
}

#[derive(Deserialize)]
struct AccountResponse {
    login: String,
}

impl From<InstallationResponse> for Installation {
    fn from(inst: InstallationResponse) -> Self {
        Self {
            id: inst.id,
            account_login: inst.account.map(|a| a.login).unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Client authenticated as the app itself (not as an installation)
pub struct GitHubAppClient {
    http_client: Client,
    api_url: String,
    assertion: SecretString,
    max_response_bytes: usize,
}

impl GitHubAppClient {
    /// Create a client that authenticates every request with `assertion`
    pub fn new(api_url: &str, assertion: SecretString) -> Result<Self> {
        Self::with_timeout(api_url, assertion, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(api_url: &str, assertion: SecretString, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("gha/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            assertion,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    /// Cap the size of response bodies
    #[must_use]
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Exchange the assertion for an installation access token
    pub async fn create_installation_token(
        &self,
        installation_id: u64,
    ) -> Result<InstallationToken> {
        let url = format!(
            "{}/app/installations/{installation_id}/access_tokens",
            self.api_url
        );
        debug!(installation_id, "requesting installation token");

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.assertion.expose()))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("requesting installation token: {e}")))?;

        let status = response.status();
        let body = self.read_body(response).await?;
        debug!(installation_id, %status, "installation token response");

        if !status.is_success() {
            return Err(Error::Authority {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AccessTokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Transport(format!("parsing token response: {e}")))?;

        let token = parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or(Error::EmptyToken)?;
        let expires_at = parsed.expires_at.ok_or_else(|| {
            Error::Transport("parsing token response: missing expires_at".to_string())
        })?;

        debug!(installation_id, %expires_at, "minted installation token");
        Ok(InstallationToken {
            value: SecretString::new(token),
            expires_at,
        })
    }

    /// Read a response body, refusing anything over the configured ceiling
    async fn read_body(&self, mut response: Response) -> Result<String> {
        let limit = self.max_response_bytes;
        let too_large = || Error::Transport(format!("response body exceeds {limit} bytes"));

        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Transport(format!("reading response: {e}")))?
        {
            if body.len() + chunk.len() > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl InstallationSource for GitHubAppClient {
    async fn list_installations(&self) -> Result<Vec<Installation>> {
        let mut url = format!("{}/app/installations?per_page={PAGE_SIZE}", self.api_url);
        let mut installations = Vec::new();

        for page in 1..=MAX_PAGES {
            debug!(page, "listing app installations");

            let response = self
                .http_client
                .get(&url)
                .header("Authorization", format!("Bearer {}", self.assertion.expose()))
                .header("Accept", "application/vnd.github+json")
                .header("X-GitHub-Api-Version", API_VERSION)
                .send()
                .await
                .map_err(|e| Error::Transport(format!("listing installations: {e}")))?;

            let status = response.status();
            let next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);
            let body = self.read_body(response).await?;

            if !status.is_success() {
                return Err(Error::Authority {
                    status: status.as_u16(),
                    body,
                });
            }

            let batch: Vec<InstallationResponse> = serde_json::from_str(&body)
                .map_err(|e| Error::Transport(format!("parsing installations: {e}")))?;
            installations.extend(batch.into_iter().map(Installation::from));

            match next {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(count = installations.len(), "listed app installations");
        Ok(installations)
    }
}

/// Target of the `rel="next"` entry in a `Link` header
fn next_page_url(link: &str) -> Option<String> {
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
        is_next.then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}
