//! The unified fetcher.
//!
//! Dispatches on the location shape: filesystem paths are read through
//! `tokio::fs`, HTTP(S) URLs through a pooled `reqwest` client fronted by
//! the durable cache. Byte-order marks are stripped in both cases so
//! downstream parsing never sees them.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::debug;
use tydi_core::error::TydiError;
use tydi_core::utils::location;

use crate::cache::{HttpCache, DEFAULT_TTL};
use crate::FetchResult;

/// Caller-supplied fetch configuration
#[derive(Debug, Clone, Default)]
pub struct FetchConfig {
    /// Proxy URL applied to all HTTP requests
    pub proxy: Option<String>,
    /// Directory for the durable HTTP cache; no caching when unset
    pub cache_dir: Option<camino::Utf8PathBuf>,
    /// Request timeout; defaults to 30 seconds
    pub timeout: Option<Duration>,
}

/// Unified reader for local files and HTTP(S) URLs
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    cache: Option<HttpCache>,
}

impl Fetcher {
    /// Create a fetcher from caller configuration
    pub fn new(config: FetchConfig) -> FetchResult<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout.unwrap_or(Duration::from_secs(30)))
            .gzip(true)
            .user_agent(concat!("tydi/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| TydiError::network(format!("Invalid proxy URL {proxy}"), e))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TydiError::network("Failed to create HTTP client".to_string(), e))?;

        let cache = config.cache_dir.map(HttpCache::new).transpose()?;

        Ok(Self { client, cache })
    }

    /// Check whether a durable cache backs HTTP reads
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Read a location as text
    pub async fn read_text(&self, loc: &str) -> FetchResult<String> {
        if location::is_http(loc) {
            self.read_http(loc).await
        } else {
            self.read_file(loc).await
        }
    }

    /// Read a location and parse it as JSON, surfacing the offending
    /// location on parse failure
    pub async fn read_json<T: serde::de::DeserializeOwned>(&self, loc: &str) -> FetchResult<T> {
        let text = self.read_text(loc).await?;
        serde_json::from_str(&text).map_err(|e| TydiError::JsonParse {
            path: loc.to_string(),
            message: e.to_string(),
        })
    }

    async fn read_file(&self, path: &str) -> FetchResult<String> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(strip_bom(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TydiError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(TydiError::io(format!("Failed to read {path}"), e)),
        }
    }

    async fn read_http(&self, url: &str) -> FetchResult<String> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url) {
                debug!(url, "serving from http cache");
                return Ok(body);
            }
        }

        debug!(url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TydiError::network(format!("Request to {url} failed"), e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TydiError::HttpStatus {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        let ttl = response_ttl(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| TydiError::network(format!("Failed to read response from {url}"), e))?;
        let body = strip_bom(body);

        if let Some(cache) = &self.cache {
            cache.put(url, body.clone(), ttl).await?;
        }

        Ok(body)
    }
}

/// Strip a leading UTF-8 byte-order mark
fn strip_bom(text: String) -> String {
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Freshness lifetime from `Cache-Control: max-age`, or the default TTL
fn response_ttl(headers: &reqwest::header::HeaderMap) -> Duration {
    headers
        .get(reqwest::header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value.split(',').find_map(|directive| {
                directive
                    .trim()
                    .strip_prefix("max-age=")
                    .and_then(|age| age.parse::<u64>().ok())
            })
        })
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TTL)
}
