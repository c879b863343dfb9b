//! Client for a remote, hash-versioned file store (GitHub contents API).

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::config::ContentStoreConfig;

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone, Error)]
pub enum ContentStoreError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("unauthorized: the access token was rejected")]
    Unauthorized,
    #[error("{path} was modified concurrently, reload and try again")]
    VersionConflict { path: String },
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
}

/// File content together with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: String,
    /// `None` when the file does not exist yet
    pub version_token: Option<String>,
}

impl StoredFile {
    /// What a missing file reads as
    pub fn absent() -> Self {
        Self {
            content: "[]".to_string(),
            version_token: None,
        }
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Reads `path`. A missing file yields [`StoredFile::absent`].
    async fn get_file(&self, path: &str) -> Result<StoredFile, ContentStoreError>;

    /// Writes `content` to `path` if the file is still at `expected_version`.
    /// `None` creates the file. Returns the new version token.
    async fn put_file(
        &self,
        path: &str,
        content: &str,
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String, ContentStoreError>;
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    sha: Option<&'a str>,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: CommittedContent,
}

#[derive(Debug, Deserialize)]
struct CommittedContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// [`ContentStore`] backed by the contents endpoint of a GitHub repository
#[derive(Debug)]
pub struct GitHubContentStore {
    http: Client,
    config: ContentStoreConfig,
}

impl GitHubContentStore {
    pub fn new(config: ContentStoreConfig) -> Result<Self, ContentStoreError> {
        let http = Client::builder()
            .user_agent(concat!("recipe-archive/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ContentStoreError::Transport(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}/{}",
            self.config.api_url,
            self.config.owner,
            self.config.repo,
            self.config.path_prefix.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.config.token.expose_secret())
    }
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    async fn get_file(&self, path: &str) -> Result<StoredFile, ContentStoreError> {
        let res = self
            .http
            .get(self.contents_url(path))
            .query(&[("ref", self.config.branch.as_str())])
            .header("Authorization", self.auth_header())
            .header("Accept", ACCEPT_HEADER)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            StatusCode::NOT_FOUND => {
                debug!(path, "File not found in content store, treating as empty");
                Ok(StoredFile::absent())
            }
            s if s.is_success() => {
                let body = res
                    .json::<ContentsResponse>()
                    .await
                    .map_err(|e| ContentStoreError::Decode(e.to_string()))?;
                if body.encoding.as_deref() == Some("none") {
                    return Err(ContentStoreError::Decode(format!(
                        "{path} is too large to be served inline"
                    )));
                }
                let content = decode_content(&body.content)?;
                Ok(StoredFile {
                    content,
                    version_token: Some(body.sha),
                })
            }
            _ => Err(error_from_response(path, res).await),
        }
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String, ContentStoreError> {
        let request = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            sha: expected_version,
            branch: &self.config.branch,
        };

        let res = self
            .http
            .put(self.contents_url(path))
            .header("Authorization", self.auth_header())
            .header("Accept", ACCEPT_HEADER)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !res.status().is_success() {
            return Err(error_from_response(path, res).await);
        }

        let body = res
            .json::<PutContentsResponse>()
            .await
            .map_err(|e| ContentStoreError::Decode(e.to_string()))?;

        info!(
            path,
            branch = %self.config.branch,
            version = %body.content.sha,
            "Committed file to content store"
        );
        Ok(body.content.sha)
    }
}

/// The API wraps base64 at 60 columns
fn decode_content(encoded: &str) -> Result<String, ContentStoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| ContentStoreError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ContentStoreError::Decode(e.to_string()))
}

async fn error_from_response(path: &str, res: reqwest::Response) -> ContentStoreError {
    let status = res.status();
    match status {
        StatusCode::UNAUTHORIZED => ContentStoreError::Unauthorized,
        StatusCode::CONFLICT => ContentStoreError::VersionConflict {
            path: path.to_string(),
        },
        _ => {
            let text = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.message)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or(text);
            ContentStoreError::Http {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ContentStoreError {
    if e.is_timeout() {
        ContentStoreError::Timeout
    } else {
        ContentStoreError::Transport(e.to_string())
    }
}
