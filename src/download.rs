//! HTTP fetch layer for the upstream VHI image endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use tracing::debug;

/// Request timeout for the week-validity probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
/// Request timeout for image downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// A fetched HTTP response, reduced to what classification needs.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Whether the response can be an image at all: 2xx and an image
    /// content type. Upstream errors sometimes come back as 200 text/html.
    pub fn is_image(&self) -> bool {
        if !(200..300).contains(&self.status) {
            return false;
        }
        self.content_type
            .as_deref()
            .map(|ctype| ctype.to_lowercase().contains("image"))
            .unwrap_or(false)
    }
}

/// Issues one GET and returns the reduced response. Implemented by the
/// reqwest client in production and by deterministic stubs in tests.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse>;
}

/// Production fetcher over a shared `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        // Headers the upstream expects; avoids occasional blocks.
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (compatible; VHI-Downloader/1.0; +https://www.star.nesdis.noaa.gov/)",
            ),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_static(
                "https://www.star.nesdis.noaa.gov/smcd/emb/vci/VH/vh_browseVH.php",
            ),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/apng,image/*,*/*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body: {}", url))?
            .to_vec();

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

// -- Tests -------------------------------------------------------------------
