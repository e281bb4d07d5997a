use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinates;
use crate::services::cache::{CacheKey, CacheManager};

/// Errors that can occur when talking to the geocoder
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Geocoder returned status {0}")]
    ApiError(u16),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl GeocodeError {
    /// Whether a second attempt has a reasonable chance to succeed
    pub fn is_transient(&self) -> bool {
        match self {
            GeocodeError::RequestError(e) => e.is_timeout() || e.is_connect(),
            GeocodeError::ApiError(status) => *status == 429 || *status >= 500,
            GeocodeError::InvalidResponse(_) => false,
        }
    }
}

/// Resolves free-text locations to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the geocoder answered but found nothing
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Geocode with one retry after `backoff` on transient failures
pub async fn geocode_with_retry(
    geocoder: &dyn Geocoder,
    query: &str,
    backoff: Duration,
) -> Result<Option<Coordinates>, GeocodeError> {
    match geocoder.geocode(query).await {
        Err(e) if e.is_transient() => {
            tracing::debug!("Transient geocoding failure for '{}', retrying: {}", query, e);
            tokio::time::sleep(backoff).await;
            geocoder.geocode(query).await
        }
        other => other,
    }
}

/// Client for a Nominatim-compatible search API
///
/// `GET {base_url}/search?q=...&format=json&limit=1`
pub struct HttpGeocoder {
    base_url: String,
    user_agent: String,
    client: Client,
}

impl HttpGeocoder {
    pub fn new(base_url: String, user_agent: String, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            user_agent,
            client,
        })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        );

        tracing::debug!("Geocoding '{}'", query);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::ApiError(response.status().as_u16()));
        }

        let json: Value = response.json().await?;

        let results = json
            .as_array()
            .ok_or_else(|| GeocodeError::InvalidResponse("Expected a JSON array".into()))?;

        let Some(first) = results.first() else {
            return Ok(None);
        };

        let latitude = coordinate(first, "lat")?;
        let longitude = coordinate(first, "lon")?;
        let coords = Coordinates::new(latitude, longitude);

        if !coords.is_valid() {
            return Err(GeocodeError::InvalidResponse(format!(
                "Coordinates out of range: {}, {}",
                latitude, longitude
            )));
        }

        Ok(Some(coords))
    }
}

/// Nominatim sends coordinates as strings; accept numbers too
fn coordinate(result: &Value, field: &str) -> Result<f64, GeocodeError> {
    let value = result
        .get(field)
        .ok_or_else(|| GeocodeError::InvalidResponse(format!("Missing '{}'", field)))?;

    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| GeocodeError::InvalidResponse(format!("Invalid '{}': {}", field, value)))
}

/// Geocoder decorator that caches answers, including "not found"
pub struct CachedGeocoder {
    inner: Arc<dyn Geocoder>,
    cache: Arc<CacheManager>,
}

impl CachedGeocoder {
    pub fn new(inner: Arc<dyn Geocoder>, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl Geocoder for CachedGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let key = CacheKey::geocode(query);

        match self.cache.get::<Option<Coordinates>>(&key).await {
            Ok(hit) => return Ok(hit),
            Err(crate::services::CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Geocode cache read failed for '{}': {}", key, e),
        }

        let result = self.inner.geocode(query).await?;

        if let Err(e) = self.cache.set(&key, &result).await {
            tracing::warn!("Geocode cache write failed for '{}': {}", key, e);
        }

        Ok(result)
    }
}
