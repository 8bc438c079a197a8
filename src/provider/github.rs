use crate::config::Config;
use crate::model::{Credential, Entry, EntryKind, Listing, RateLimitInfo, RepositoryLocator};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::ProviderError;

const API_VERSION: &str = "2022-11-28";

pub struct GitHubProvider {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubProvider {
    /// Builds a provider from the API URL, timeout and user agent in
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] if the HTTP client cannot be
    /// constructed (e.g. no TLS backend).
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn contents_url(
        &self,
        repo: &RepositoryLocator,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.api_url).map_err(|e| ProviderError::Api {
            status: None,
            message: format!("invalid API URL {}: {}", self.api_url, e),
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| ProviderError::Api {
                status: None,
                message: format!("API URL cannot be a base: {}", self.api_url),
            })?;
            segments
                .pop_if_empty()
                .extend(["repos", repo.owner.as_str(), repo.name.as_str(), "contents"]);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }

        if let Some(git_ref) = git_ref {
            url.query_pairs_mut().append_pair("ref", git_ref);
        }

        Ok(url)
    }

    async fn get(
        &self,
        credential: &Credential,
        url: Url,
        path: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(credential.expose())
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;

        check_status(response, path).await
    }

    async fn fetch_raw(
        &self,
        credential: &Credential,
        download_url: &str,
        path: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let url = Url::parse(download_url).map_err(|e| ProviderError::Api {
            status: None,
            message: format!("invalid download URL for {}: {}", path, e),
        })?;
        let response = self.get(credential, url, path).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// The contents endpoint answers with an array for directories and a single
/// object for files.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Many(Vec<ContentItem>),
    One(ContentItem),
}

#[derive(Deserialize)]
struct ContentItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
    download_url: Option<String>,
    content: Option<String>,
    encoding: Option<String>,
}

impl ContentItem {
    fn into_entry(self) -> Entry {
        let mut entry = Entry::new(self.path, EntryKind::from_api(&self.kind));
        entry.size = self.size;
        entry.download_url = self.download_url;
        entry
    }
}

impl From<ContentsResponse> for Listing {
    fn from(response: ContentsResponse) -> Self {
        match response {
            ContentsResponse::Many(items) => {
                Listing::Directory(items.into_iter().map(ContentItem::into_entry).collect())
            }
            ContentsResponse::One(item) => Listing::File(item.into_entry()),
        }
    }
}

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimitResource,
}

#[derive(Deserialize)]
struct RateLimitResource {
    limit: u64,
    remaining: u64,
    reset: i64,
}

impl From<RateLimitResource> for RateLimitInfo {
    fn from(core: RateLimitResource) -> Self {
        RateLimitInfo {
            remaining: core.remaining,
            limit: core.limit,
            reset_time: DateTime::<Utc>::from_timestamp(core.reset, 0).unwrap_or_default(),
        }
    }
}

async fn check_status(
    response: reqwest::Response,
    path: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiMessage>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string());

    Err(classify_status(status, path, message))
}

fn classify_status(status: StatusCode, path: &str, message: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::BadCredentials,
        StatusCode::NOT_FOUND => ProviderError::NotFound {
            path: path.to_string(),
        },
        _ => ProviderError::Api {
            status: Some(status.as_u16()),
            message,
        },
    }
}

/// Decodes the base64 `content` field; GitHub wraps it at 60 columns.
fn decode_base64(content: &str) -> Result<Vec<u8>, ProviderError> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(|e| ProviderError::Api {
        status: None,
        message: format!("malformed base64 content: {}", e),
    })
}

#[async_trait]
impl super::ContentProvider for GitHubProvider {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    async fn list_contents(
        &self,
        credential: &Credential,
        repo: &RepositoryLocator,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Listing, ProviderError> {
        let url = self.contents_url(repo, path, git_ref)?;
        let response = self.get(credential, url, path).await?;
        let contents: ContentsResponse = response.json().await?;
        Ok(contents.into())
    }

    async fn fetch_content(
        &self,
        credential: &Credential,
        repo: &RepositoryLocator,
        entry: &Entry,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>, ProviderError> {
        let url = self.contents_url(repo, &entry.path, git_ref)?;
        let response = self.get(credential, url, &entry.path).await?;
        let item = match response.json::<ContentsResponse>().await? {
            ContentsResponse::One(item) => item,
            ContentsResponse::Many(_) => {
                return Err(ProviderError::Api {
                    status: None,
                    message: format!("{} is a directory", entry.path),
                })
            }
        };

        match (item.encoding.as_deref(), item.content.as_deref()) {
            (Some("base64"), Some(content)) => decode_base64(content),
            // Files over 1 MB come back with encoding "none" and no content.
            _ => match item.download_url.as_deref().or(entry.download_url.as_deref()) {
                Some(download_url) => self.fetch_raw(credential, download_url, &entry.path).await,
                None => Err(ProviderError::Api {
                    status: None,
                    message: format!("no content available for {}", entry.path),
                }),
            },
        }
    }

    async fn rate_limit(&self, credential: &Credential) -> Result<RateLimitInfo, ProviderError> {
        let url = Url::parse(&format!("{}/rate_limit", self.api_url)).map_err(|e| {
            ProviderError::Api {
                status: None,
                message: format!("invalid API URL {}: {}", self.api_url, e),
            }
        })?;
        let response = self.get(credential, url, "rate_limit").await?;
        let body: RateLimitResponse = response.json().await?;
        Ok(body.resources.core.into())
    }
}
