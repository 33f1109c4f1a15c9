//! Listing the files a pull request changes.

use crate::config::{GitHubConfig, PullRequest, Secret};
use crate::error::FetchError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

/// Entries per page requested from the files endpoint (the API maximum).
pub const PAGE_SIZE: usize = 100;

/// The files endpoint stops listing after 3000 files.
pub const MAX_PAGES: u32 = 30;

const MAX_ERROR_BODY: usize = 512;

/// Something that can list the changed paths of a pull request.
#[allow(async_fn_in_trait)]
pub trait ChangeSource {
    /// Repository-relative paths changed by `pull_request`, in listing order.
    async fn changed_files(&self, pull_request: &PullRequest) -> Result<Vec<String>, FetchError>;
}

/// GitHub REST API client for the pull request files listing.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Secret,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    filename: String,
}

impl GitHubClient {
    /// Builds a client with the API headers and request timeout set.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] if the HTTP client cannot be built.
    pub fn new(config: &GitHubConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("codepath-notify/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    async fn page(&self, url: &str, page: u32) -> Result<Vec<ChangedFile>, FetchError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.token.expose())
            .query(&[("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl ChangeSource for GitHubClient {
    async fn changed_files(&self, pull_request: &PullRequest) -> Result<Vec<String>, FetchError> {
        let repo = &pull_request.repository;
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_url, repo.owner, repo.name, pull_request.number
        );

        let mut files = Vec::new();
        for page in 1..=MAX_PAGES {
            let entries = self.page(&url, page).await?;
            let count = entries.len();
            debug!(page, count, "fetched changed files page");
            files.extend(entries.into_iter().map(|f| f.filename));

            if count < PAGE_SIZE {
                return Ok(files);
            }
        }

        warn!(
            pull_request = pull_request.number,
            files = files.len(),
            "file listing truncated at the API limit"
        );
        Ok(files)
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}
