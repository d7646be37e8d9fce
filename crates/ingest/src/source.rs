//! Upstream source-of-record client.
//!
//! Fetches `{"data": [...]}` payloads per entity family with bounded
//! retries and doubling backoff. A family whose fetch fails after all
//! attempts is skipped for that run; other families proceed.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Retry attempts per endpoint before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Initial retry backoff; doubles per attempt.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status} for {url}")]
    Api { status: u16, url: String },

    #[error("source unavailable after {attempts} attempts: {url}")]
    Unavailable { attempts: u32, url: String },
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// HTTP client for the upstream SCM backend.
#[derive(Debug, Clone)]
pub struct SourceClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl SourceClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Fetch one family's payload.
    ///
    /// Transport errors and 5xx responses are retried with doubling
    /// backoff; a 4xx is not retryable and fails immediately.
    pub async fn fetch(&self, path: &str) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut backoff = INITIAL_BACKOFF;

        for attempt in 1..=MAX_ATTEMPTS {
            info!("Fetching {} (attempt {}/{})", url, attempt, MAX_ATTEMPTS);

            let outcome = self
                .http
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
                .await;

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json::<Value>().await?);
                    }
                    if status.is_server_error() && attempt < MAX_ATTEMPTS {
                        warn!("Server error {} on {}, retrying", status, url);
                    } else {
                        return Err(SourceError::Api {
                            status: status.as_u16(),
                            url,
                        });
                    }
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!("Request error on {}: {}, retrying", url, e);
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }

        Err(SourceError::Unavailable {
            attempts: MAX_ATTEMPTS,
            url,
        })
    }
}
