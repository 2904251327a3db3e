//! Transport - where resources come from.
//!
//! The loader and the bootstrap scheduler only know this seam. `HttpTransport`
//! is the production implementation; `MemoryTransport` serves pre-seeded
//! bundles and backs the test suites.

use async_trait::async_trait;
use kiln_foundation::{Error, KilnConfig, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Resource source. Locations are relative paths (dots already converted to
/// slashes by the kind's URL rule).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a resource asynchronously.
    async fn fetch(&self, location: &str) -> Result<String>;

    /// Fetch a resource, blocking the calling thread until it resolves.
    ///
    /// Must not be called from inside an async runtime.
    fn fetch_blocking(&self, location: &str) -> Result<String>;
}

// ============================================================================
// HttpTransport
// ============================================================================

/// HTTP GET against a configured base URL.
pub struct HttpTransport {
    base: Url,
    timeout: Duration,
    user_agent: String,
    client: reqwest::Client,
    // built on first blocking fetch; reqwest's blocking client cannot be
    // created inside an async runtime
    blocking: OnceLock<reqwest::blocking::Client>,
}

impl HttpTransport {
    pub fn new(config: &KilnConfig) -> Result<Self> {
        config.validate()?;
        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid base-url: {e}")))?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            base,
            timeout,
            user_agent: config.user_agent.clone(),
            client,
            blocking: OnceLock::new(),
        })
    }

    fn resolve(&self, location: &str) -> Result<Url> {
        self.base
            .join(location)
            .map_err(|e| Error::Http(format!("invalid location '{location}': {e}")))
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }
        let built = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(self.blocking.get_or_init(|| built))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, location: &str) -> Result<String> {
        let url = self.resolve(location)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Http(format!("GET {url} returned {}", response.status())));
        }
        response.text().await.map_err(|e| Error::Http(e.to_string()))
    }

    fn fetch_blocking(&self, location: &str) -> Result<String> {
        let url = self.resolve(location)?;
        debug!(%url, "GET (blocking)");
        let response = self
            .blocking_client()?
            .get(url.clone())
            .send()
            .map_err(|e| Error::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Http(format!("GET {url} returned {}", response.status())));
        }
        response.text().map_err(|e| Error::Http(e.to_string()))
    }
}

// ============================================================================
// MemoryTransport
// ============================================================================

/// In-memory resource map: merged bundles shipped with the binary, and the
/// standard fake for tests.
#[derive(Default)]
pub struct MemoryTransport {
    resources: RwLock<HashMap<String, String>>,
    fetch_count: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 패턴: 리소스 추가
    pub fn with_resource(self, location: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(location, body);
        self
    }

    pub fn insert(&self, location: impl Into<String>, body: impl Into<String>) {
        self.resources.write().insert(location.into(), body.into());
    }

    /// Total fetches served (or refused), across both modes.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    fn lookup(&self, location: &str) -> Result<String> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.resources
            .read()
            .get(location)
            .cloned()
            .ok_or_else(|| Error::Http(format!("no such resource: {location}")))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch(&self, location: &str) -> Result<String> {
        self.lookup(location)
    }

    fn fetch_blocking(&self, location: &str) -> Result<String> {
        self.lookup(location)
    }
}
