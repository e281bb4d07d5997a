use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::normalizer::canonicalize;
use crate::models::Store;

/// Errors that can occur when fetching the store directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Store directory returned status {0}")]
    ApiError(u16),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Failed to read store file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse store file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl DirectoryError {
    pub fn is_transient(&self) -> bool {
        match self {
            DirectoryError::RequestError(e) => e.is_timeout() || e.is_connect(),
            DirectoryError::ApiError(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Upstream that publishes the full list of stores
#[async_trait]
pub trait StoreSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_stores(&self) -> Result<Vec<Store>, DirectoryError>;
}

/// Stores read from a TOML file of `[[stores]]` tables
pub struct FileStoreSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct StoreFile {
    #[serde(default)]
    stores: Vec<Store>,
}

impl FileStoreSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(contents: &str) -> Result<Vec<Store>, DirectoryError> {
        let file: StoreFile = toml::from_str(contents)?;
        Ok(file.stores)
    }
}

#[async_trait]
impl StoreSource for FileStoreSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_stores(&self) -> Result<Vec<Store>, DirectoryError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Self::parse(&contents)
    }
}

/// Stores fetched from a JSON endpoint
///
/// Accepts a bare array, `{"stores": [...]}` or a document listing
/// `{"documents": [{"data": {...}}]}`.
pub struct HttpStoreSource {
    url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpStoreSource {
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { url, api_key, client })
    }
}

#[async_trait]
impl StoreSource for HttpStoreSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_stores(&self) -> Result<Vec<Store>, DirectoryError> {
        let mut request = self.client.get(&self.url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(DirectoryError::ApiError(response.status().as_u16()));
        }

        let json: Value = response.json().await?;

        let documents = match &json {
            Value::Array(items) => items,
            Value::Object(obj) => obj
                .get("stores")
                .or_else(|| obj.get("documents"))
                .and_then(|d| d.as_array())
                .ok_or_else(|| DirectoryError::InvalidResponse("Missing stores array".into()))?,
            _ => return Err(DirectoryError::InvalidResponse("Expected array or object".into())),
        };

        let stores: Vec<Store> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                match serde_json::from_value(data.clone()) {
                    Ok(store) => Some(store),
                    Err(e) => {
                        tracing::warn!("Skipping malformed store entry: {}", e);
                        None
                    }
                }
            })
            .collect();

        tracing::debug!("Fetched {} stores from {}", stores.len(), self.url);

        Ok(stores)
    }
}

/// Immutable point-in-time copy of the store directory
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    stores: Vec<Store>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl DirectorySnapshot {
    pub fn empty() -> Self {
        Self {
            stores: Vec::new(),
            refreshed_at: None,
        }
    }

    /// Snapshot of `stores` with stock ids cleaned like request tokens
    pub fn new(mut stores: Vec<Store>) -> Self {
        for store in &mut stores {
            if let Some(stock) = store.stock.take() {
                store.stock = Some(
                    stock
                        .iter()
                        .map(|item| canonicalize(item.as_str()))
                        .filter(|item| !item.is_empty())
                        .collect(),
                );
            }
        }

        Self {
            stores,
            refreshed_at: Some(Utc::now()),
        }
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

/// Store directory served from a swappable snapshot
///
/// Readers load an `Arc` of the current snapshot and keep it for the whole
/// request. A refresh builds a complete new snapshot and swaps it in, so a
/// reader never sees a half-updated list.
pub struct StoreDirectory {
    source: Arc<dyn StoreSource>,
    snapshot: ArcSwap<DirectorySnapshot>,
    retry_backoff: Duration,
}

impl StoreDirectory {
    pub fn new(source: Arc<dyn StoreSource>, retry_backoff: Duration) -> Self {
        Self {
            source,
            snapshot: ArcSwap::from_pointee(DirectorySnapshot::empty()),
            retry_backoff,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.snapshot.load_full()
    }

    /// Pull the source and swap in a new snapshot
    ///
    /// Transient failures are retried once. On error the previous snapshot
    /// stays in place.
    pub async fn refresh(&self) -> Result<usize, DirectoryError> {
        let stores = match self.source.fetch_stores().await {
            Err(e) if e.is_transient() => {
                tracing::debug!("Transient store directory failure, retrying: {}", e);
                tokio::time::sleep(self.retry_backoff).await;
                self.source.fetch_stores().await?
            }
            other => other?,
        };

        let count = stores.len();
        self.snapshot.store(Arc::new(DirectorySnapshot::new(stores)));

        tracing::info!("Store directory refreshed from {} source: {} stores", self.source.name(), count);
        Ok(count)
    }

    pub fn start_background_refresh(self: Arc<Self>, interval_secs: u64) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            // The first tick completes immediately; startup already refreshed
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh().await {
                    tracing::error!("Store directory refresh failed, keeping previous snapshot: {}", e);
                }
            }
        });
    }
}
