//! Page fetcher backed by an external scrape provider
//!
//! This module handles the provider boundary:
//! - Building the HTTP client with the provider timeout and user agent
//! - Sending one scrape request per page URL
//! - Classifying provider failures
//! - Writing the returned page text to the caller-chosen path

use crate::config::{ProviderSettings, ScrapeOptions};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Path of the scrape operation under the provider endpoint
const SCRAPE_PATH: &str = "/v1/scrape";

/// Longest provider error body quoted in a log line
const MAX_ERROR_BODY: usize = 300;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Provider returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Provider could not scrape {url}: {message}")]
    Provider { url: String, message: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One page to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub wait_for_ms: u64,
    pub only_main_content: bool,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, options: ScrapeOptions) -> Self {
        Self {
            url: url.into(),
            wait_for_ms: options.wait_for_ms,
            only_main_content: options.only_main_content,
        }
    }
}

/// Renders a URL and saves its text content
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `request.url`, writes the content to `output` and returns its byte size
    async fn fetch(&self, request: &FetchRequest, output: &Path) -> Result<u64, FetchError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequestBody<'a> {
    url: &'a str,
    formats: [&'static str; 1],
    wait_for: u64,
    only_main_content: bool,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponseBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
}

/// Builds the HTTP client used to talk to the scrape provider
///
/// # Arguments
///
/// * `settings` - Provider settings (timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(settings: &ProviderSettings) -> Result<Client, reqwest::Error> {
    let user_agent = format!("sale-pager/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] calling the provider's scrape API
pub struct ScrapeApiFetcher {
    client: Client,
    scrape_url: String,
    api_key: Option<String>,
}

impl ScrapeApiFetcher {
    pub fn new(settings: &ProviderSettings) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(settings)?,
            scrape_url: format!("{}{}", settings.endpoint.trim_end_matches('/'), SCRAPE_PATH),
            api_key: settings.api_key.clone(),
        })
    }

    /// Sends the scrape request and returns the page text
    async fn scrape(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let body = ScrapeRequestBody {
            url: &request.url,
            formats: ["markdown"],
            wait_for: request.wait_for_ms,
            only_main_content: request.only_main_content,
        };

        let mut builder = self.client.post(&self.scrape_url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(&request.url, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(&request.url, status, &text));
        }

        let parsed: ScrapeResponseBody = response
            .json()
            .await
            .map_err(|e| classify_error(&request.url, e))?;

        if !parsed.success {
            return Err(FetchError::Provider {
                url: request.url.clone(),
                message: parsed
                    .error
                    .unwrap_or_else(|| "scrape reported failure".to_string()),
            });
        }

        parsed
            .data
            .and_then(|data| data.markdown)
            .ok_or_else(|| FetchError::Provider {
                url: request.url.clone(),
                message: "response carried no markdown content".to_string(),
            })
    }
}

#[async_trait]
impl PageFetcher for ScrapeApiFetcher {
    async fn fetch(&self, request: &FetchRequest, output: &Path) -> Result<u64, FetchError> {
        let content = self.scrape(request).await?;

        tokio::fs::write(output, content.as_bytes())
            .await
            .map_err(|source| FetchError::Io {
                path: output.to_path_buf(),
                source,
            })?;

        Ok(content.len() as u64)
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

fn status_error(url: &str, status: StatusCode, body: &str) -> FetchError {
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    }
}
