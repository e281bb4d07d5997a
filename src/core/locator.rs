use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::core::{
    distance::{calculate_bounding_box, haversine_distance},
    filters::{placement, stock_annotation, within_search_area, Placement},
    normalizer::SynonymTable,
};
use crate::error::RecommendError;
use crate::models::{Coordinates, Location, Store, StoreMatch};
use crate::services::{geocode_with_retry, Geocoder, StoreDirectory};

/// Tunables for store lookup
#[derive(Debug, Clone)]
pub struct LocatorSettings {
    /// Stores farther than this are not returned
    pub max_distance_km: f64,
    /// Deadline for all external lookups of one request
    pub request_timeout: Duration,
    /// Pause before the single retry of a transient failure
    pub retry_backoff: Duration,
    /// Store addresses geocoded at the same time
    pub concurrency: usize,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            max_distance_km: 25.0,
            request_timeout: Duration::from_millis(3000),
            retry_backoff: Duration::from_millis(200),
            concurrency: 8,
        }
    }
}

/// Stores ranked for one request
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedStores {
    pub origin: Coordinates,
    pub stores: Vec<StoreMatch>,
    /// The deadline passed before every store address was geocoded
    pub partial: bool,
}

/// Finds stores near a location that could supply missing ingredients
#[derive(Clone)]
pub struct StoreLocator {
    directory: Arc<StoreDirectory>,
    geocoder: Arc<dyn Geocoder>,
    settings: LocatorSettings,
    synonyms: Arc<SynonymTable>,
}

impl StoreLocator {
    pub fn new(directory: Arc<StoreDirectory>, geocoder: Arc<dyn Geocoder>, settings: LocatorSettings) -> Self {
        Self {
            directory,
            geocoder,
            settings,
            synonyms: Arc::new(SynonymTable::default()),
        }
    }

    /// Resolve store stock through the catalog's spellings
    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = Arc::new(synonyms);
        self
    }

    pub fn directory(&self) -> &Arc<StoreDirectory> {
        &self.directory
    }

    /// Rank stores around `location` by great-circle distance
    ///
    /// The location is geocoded at most once (plus one retry on transient
    /// failure). Store addresses without coordinates are geocoded
    /// concurrently; when the request deadline passes, those lookups are
    /// dropped and the stores placed so far are returned with `partial` set.
    pub async fn locate(
        &self,
        location: &Location,
        needed: &BTreeSet<String>,
    ) -> Result<LocatedStores, RecommendError> {
        let deadline = Instant::now() + self.settings.request_timeout;
        let origin = self.resolve_location(location, deadline).await?;

        let snapshot = self.directory.snapshot();
        let bbox = calculate_bounding_box(origin, self.settings.max_distance_km);

        let mut ranked = Vec::new();
        let mut pending = Vec::new();

        for store in snapshot.stores() {
            match placement(store) {
                Placement::Known(coords) => {
                    if within_search_area(coords, &bbox) {
                        ranked.extend(self.rank_store(store, origin, coords, needed));
                    }
                }
                Placement::NeedsGeocoding(address) => pending.push((store, address)),
                Placement::Unplaceable => {
                    tracing::debug!("Store '{}' has neither coordinates nor address", store.id);
                }
            }
        }

        let partial = if pending.is_empty() {
            false
        } else {
            let total = pending.len();
            let geocoder = &self.geocoder;
            let backoff = self.settings.retry_backoff;

            let mut lookups = stream::iter(pending)
                .map(move |(store, address)| async move {
                    let result = geocode_with_retry(geocoder.as_ref(), &address, backoff).await;
                    (store, result)
                })
                .buffer_unordered(self.settings.concurrency.max(1));

            let mut resolved = 0usize;
            let finished = timeout_at(deadline, async {
                while let Some((store, result)) = lookups.next().await {
                    resolved += 1;
                    match result {
                        Ok(Some(coords)) => ranked.extend(self.rank_store(store, origin, coords, needed)),
                        Ok(None) => tracing::debug!("No coordinates for store '{}'", store.id),
                        Err(e) => tracing::warn!("Failed to geocode store '{}': {}", store.id, e),
                    }
                }
            })
            .await
            .is_ok();

            // Dropping the stream cancels lookups still in flight
            drop(lookups);

            if !finished {
                tracing::warn!(
                    "Store lookup deadline reached: {} of {} store addresses resolved",
                    resolved,
                    total
                );
            }
            !finished
        };

        ranked.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });

        tracing::debug!("Located {} stores (partial: {})", ranked.len(), partial);

        Ok(LocatedStores {
            origin,
            stores: ranked,
            partial,
        })
    }

    async fn resolve_location(
        &self,
        location: &Location,
        deadline: Instant,
    ) -> Result<Coordinates, RecommendError> {
        let address = match location {
            Location::Coordinates(coords) => return Ok(*coords),
            Location::Address(address) => address,
        };

        let lookup = geocode_with_retry(self.geocoder.as_ref(), address, self.settings.retry_backoff);

        match timeout_at(deadline, lookup).await {
            Err(_) => Err(RecommendError::UpstreamTimeout("geocoder".to_string())),
            Ok(Ok(Some(coords))) if coords.is_valid() => Ok(coords),
            Ok(Ok(_)) => Err(RecommendError::LocationResolution(format!(
                "no match for '{}'",
                address
            ))),
            Ok(Err(e)) => Err(RecommendError::LocationResolution(e.to_string())),
        }
    }

    fn rank_store(
        &self,
        store: &Store,
        origin: Coordinates,
        coords: Coordinates,
        needed: &BTreeSet<String>,
    ) -> Option<StoreMatch> {
        let distance_km = haversine_distance(origin, coords);
        if distance_km > self.settings.max_distance_km {
            return None;
        }

        Some(StoreMatch {
            id: store.id.clone(),
            name: store.name.clone(),
            address: store.address.clone(),
            distance_km,
            carries: stock_annotation(store, needed, &self.synonyms),
        })
    }
}
