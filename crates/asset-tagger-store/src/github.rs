//! GitHub contents API backend
//!
//! Documents are stored as files in a repository. Reading returns the file's
//! blob SHA as the version token; writing creates a commit and must present
//! the SHA of the file being replaced.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::backend::{DocumentBackend, StoredDocument};
use crate::error::{StoreError, StoreResult};

/// Default API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// API version header value
const API_VERSION: &str = "2022-11-28";

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// Configuration for the GitHub backend
#[derive(Clone)]
pub struct GitHubConfig {
    /// API base URL
    pub api_url: Url,

    /// Repository in `owner/name` form
    pub repository: String,

    /// Branch to read from and commit to; the repository default when unset
    pub branch: Option<String>,

    /// Access token
    pub token: SecretString,

    /// Per-request timeout
    pub timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,
}

impl GitHubConfig {
    /// Create a configuration with default endpoint and timeout
    pub fn new(repository: impl Into<String>, token: SecretString) -> StoreResult<Self> {
        Ok(Self {
            api_url: Url::parse(DEFAULT_API_URL)?,
            repository: repository.into(),
            branch: None,
            token,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("asset-tagger/{}", crate::VERSION),
        })
    }

    /// Set the API base URL
    pub fn api_url(mut self, url: Url) -> Self {
        self.api_url = url;
        self
    }

    /// Set the branch
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.branch = if branch.trim().is_empty() {
            None
        } else {
            Some(branch)
        };
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> StoreResult<()> {
        self.owner_and_name()?;

        if self.token.expose_secret().trim().is_empty() {
            return Err(StoreError::Configuration(
                "GitHub token cannot be empty".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(StoreError::Configuration(
                "timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn owner_and_name(&self) -> StoreResult<(&str, &str)> {
        match self.repository.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok((owner, name))
            }
            _ => Err(StoreError::Configuration(format!(
                "repository must be in owner/name form, got '{}'",
                self.repository
            ))),
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url.as_str())
            .field("repository", &self.repository)
            .field("branch", &self.branch)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: Option<ContentRef>,
}

#[derive(Debug, Deserialize)]
struct ContentRef {
    sha: String,
}

/// Document backend committing to a GitHub repository
pub struct GitHubBackend {
    client: Client,
    config: GitHubConfig,
}

impl GitHubBackend {
    /// Create a new backend from validated configuration
    pub fn new(config: GitHubConfig) -> StoreResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        debug!(repository = %config.repository, branch = ?config.branch, "GitHub backend created");
        Ok(Self { client, config })
    }

    /// Repository this backend commits to
    pub fn repository(&self) -> &str {
        &self.config.repository
    }

    fn contents_url(&self, path: &str) -> StoreResult<Url> {
        let (owner, name) = self.config.owner_and_name()?;
        let mut url = self.config.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::Configuration(format!(
                    "API URL cannot be a base: {}",
                    self.config.api_url
                ))
            })?
            .pop_if_empty()
            .extend(["repos", owner, name, "contents"])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.config.token.expose_secret())
    }

    fn get_request(&self, url: Url) -> RequestBuilder {
        let request = self.authorized(self.client.get(url));
        match &self.config.branch {
            Some(branch) => request.query(&[("ref", branch.as_str())]),
            None => request,
        }
    }

    /// Large files come back without inline content; read them raw
    async fn fetch_raw(&self, url: Url, path: &str) -> StoreResult<Vec<u8>> {
        let response = self
            .get_request(url)
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_status(response, path).await);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl DocumentBackend for GitHubBackend {
    fn name(&self) -> &'static str {
        "github"
    }

    #[instrument(skip(self), fields(repository = %self.config.repository))]
    async fn fetch(&self, path: &str) -> StoreResult<Option<StoredDocument>> {
        let url = self.contents_url(path)?;
        let response = self.get_request(url.clone()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path, "Remote document does not exist");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_for_status(response, path).await);
        }

        let body: ContentsResponse = response.json().await?;
        if let Some(kind) = body.kind.as_deref() {
            if kind != "file" {
                return Err(StoreError::InvalidResponse(format!(
                    "{} is a {}, not a file",
                    path, kind
                )));
            }
        }

        let content = match (body.encoding.as_deref(), body.content.as_deref()) {
            (Some("base64"), Some(encoded)) => decode_content(encoded, path)?,
            (Some("none"), _) | (None, None) => self.fetch_raw(url, path).await?,
            (encoding, _) => {
                return Err(StoreError::InvalidResponse(format!(
                    "Unsupported encoding {:?} for {}",
                    encoding, path
                )))
            }
        };

        debug!(path, sha = %body.sha, bytes = content.len(), "Fetched remote document");
        Ok(Some(StoredDocument::new(content, Some(body.sha))))
    }

    #[instrument(skip(self, content, message), fields(repository = %self.config.repository, bytes = content.len()))]
    async fn put(
        &self,
        path: &str,
        content: &[u8],
        version: Option<&str>,
        message: &str,
    ) -> StoreResult<Option<String>> {
        let url = self.contents_url(path)?;
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            sha: version,
            branch: self.config.branch.as_deref(),
        };

        let response = self.authorized(self.client.put(url)).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(error_for_status(response, path).await);
        }

        let body: PutContentsResponse = response.json().await?;
        let sha = body.content.map(|c| c.sha);
        debug!(path, sha = ?sha, "Committed remote document");
        Ok(sha)
    }

    async fn health_check(&self) -> StoreResult<()> {
        let (owner, name) = self.config.owner_and_name()?;
        let mut url = self.config.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Configuration("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["repos", owner, name]);

        let response = self.authorized(self.client.get(url)).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_for_status(response, &self.config.repository).await)
        }
    }
}

fn decode_content(encoded: &str, path: &str) -> StoreResult<Vec<u8>> {
    // The API wraps base64 content at 60 columns
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| {
        StoreError::InvalidResponse(format!("Invalid base64 content for {}: {}", path, e))
    })
}

async fn error_for_status(response: Response, path: &str) -> StoreError {
    let status = response.status();
    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::Authentication(format!("{} ({})", detail, status))
        }
        StatusCode::NOT_FOUND => StoreError::NotFound(format!("{}: {}", path, detail)),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Conflict(format!("{}: {}", path, detail))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            StoreError::Connection(format!("rate limited: {}", detail))
        }
        s if s.is_server_error() => StoreError::Connection(format!("{} ({})", detail, s)),
        s => StoreError::InvalidResponse(format!("{} ({})", detail, s)),
    };

    warn!(path, status = %status, error = %err, "GitHub request failed");
    err
}
