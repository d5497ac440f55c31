//! Dropbox API client
//!
//! Wraps `reqwest::Client` with bearer authentication and the two Dropbox
//! hosts: the RPC host (`api.dropboxapi.com`) takes JSON bodies, the content
//! host (`content.dropboxapi.com`) takes its arguments in the
//! `Dropbox-API-Arg` header and carries file bytes in the body.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boxmirror_dropbox::client::DropboxClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DropboxClient::new("access-token-here");
//! let account: serde_json::Value = client
//!     .rpc("users/get_current_account", &serde_json::Value::Null)
//!     .await?;
//! println!("{account}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{header::HeaderValue, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::DropboxError;

/// Base URL for RPC endpoints
pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com/2";

/// Base URL for content upload/download endpoints
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com/2";

/// Header carrying the JSON arguments of content endpoints
pub const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// Default retry-after duration when the header is missing
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Maximum number of retries for 429 responses
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Error body returned by Dropbox for 4xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_summary: Option<String>,
}

// ============================================================================
// DropboxClient
// ============================================================================

/// HTTP client for Dropbox API v2 calls
#[derive(Debug, Clone)]
pub struct DropboxClient {
    client: Client,
    api_url: String,
    content_url: String,
    access_token: String,
    max_retries: u32,
}

impl DropboxClient {
    /// Creates a client against the public Dropbox hosts
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_urls(access_token, DEFAULT_API_URL, DEFAULT_CONTENT_URL)
    }

    /// Creates a client with custom base URLs (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - A valid Dropbox access token
    /// * `api_url` - Base URL for RPC endpoints
    /// * `content_url` - Base URL for content endpoints
    pub fn with_base_urls(
        access_token: impl Into<String>,
        api_url: impl Into<String>,
        content_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            content_url: content_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Rebuilds the underlying HTTP client with a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, DropboxError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Sets how many times a 429 response is retried before giving up
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn content_url(&self) -> &str {
        &self.content_url
    }

    /// Calls an RPC endpoint with a JSON body and decodes the JSON result
    ///
    /// # Arguments
    /// * `endpoint` - Endpoint path without leading slash (e.g. `files/list_folder`)
    /// * `body` - Request arguments
    pub async fn rpc<B, R>(&self, endpoint: &str, body: &B) -> Result<R, DropboxError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.api_url, endpoint);
        let response = self
            .send_with_retry(endpoint, || {
                self.client
                    .post(&url)
                    .bearer_auth(&self.access_token)
                    .json(body)
            })
            .await?;

        response
            .json()
            .await
            .map_err(|e| DropboxError::InvalidResponse(format!("{endpoint}: {e}")))
    }

    /// Calls a content endpoint with arguments in the `Dropbox-API-Arg` header
    ///
    /// `body` is sent as `application/octet-stream` when present. The raw
    /// response is returned so callers can read bytes or JSON.
    pub async fn content<A>(
        &self,
        endpoint: &str,
        arg: &A,
        body: Option<Vec<u8>>,
    ) -> Result<Response, DropboxError>
    where
        A: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.content_url, endpoint);
        let header = api_arg_header(arg)?;

        self.send_with_retry(endpoint, || {
            let request = self
                .client
                .post(&url)
                .bearer_auth(&self.access_token)
                .header(API_ARG_HEADER, header.clone());
            match &body {
                Some(bytes) => request
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(bytes.clone()),
                None => request,
            }
        })
        .await
    }

    /// Sends a request, retrying on 429 after the advertised delay
    async fn send_with_retry<F>(&self, endpoint: &str, build: F) -> Result<Response, DropboxError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            let response = build().send().await?;

            match check_status(response).await {
                Err(DropboxError::RateLimited { retry_after }) if attempt < self.max_retries => {
                    attempt += 1;
                    info!(
                        endpoint,
                        attempt,
                        retry_after_ms = retry_after.as_millis() as u64,
                        "Received 429, backing off"
                    );
                    tokio::time::sleep(retry_after).await;
                }
                Err(DropboxError::RateLimited { retry_after }) => {
                    warn!(endpoint, attempts = attempt + 1, "429 retry limit exhausted");
                    return Err(DropboxError::RateLimited { retry_after });
                }
                other => {
                    if attempt > 0 {
                        debug!(endpoint, attempt, "Request completed after retry");
                    }
                    return other;
                }
            }
        }
    }
}

// ============================================================================
// Response status mapping
// ============================================================================

/// Maps a non-success response to a [`DropboxError`]
async fn check_status(response: Response) -> Result<Response, DropboxError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(parse_retry_after)
        .unwrap_or(DEFAULT_RETRY_AFTER);

    let text = response.text().await.unwrap_or_default();
    let summary = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|body| body.error_summary)
        .unwrap_or(text);

    Err(match status {
        StatusCode::UNAUTHORIZED => DropboxError::Unauthorized(summary),
        StatusCode::TOO_MANY_REQUESTS => DropboxError::RateLimited { retry_after },
        StatusCode::CONFLICT if summary.starts_with("path/not_found") => DropboxError::NotFound(summary),
        s if s.is_server_error() => DropboxError::ServerError(format!("{}: {}", s.as_u16(), summary)),
        s => DropboxError::Api {
            status: s.as_u16(),
            summary,
        },
    })
}

/// Parses a `Retry-After` value given in whole seconds
pub fn parse_retry_after(value: &str) -> Duration {
    match value.trim().parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => {
            warn!(value, "Could not parse Retry-After header, using default");
            DEFAULT_RETRY_AFTER
        }
    }
}

/// Serializes `arg` for the `Dropbox-API-Arg` header
///
/// Header values must be ASCII, so every non-ASCII character is written as
/// a `\uXXXX` JSON escape (surrogate pairs above the BMP).
pub fn api_arg_header<A: Serialize + ?Sized>(arg: &A) -> Result<HeaderValue, DropboxError> {
    let json = serde_json::to_string(arg)
        .map_err(|e| DropboxError::InvalidResponse(format!("cannot encode API arg: {e}")))?;

    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }

    HeaderValue::from_str(&escaped)
        .map_err(|e| DropboxError::InvalidResponse(format!("invalid API arg header: {e}")))
}
