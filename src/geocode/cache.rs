//! Memoizing geocoder.
//!
//! Keys are normalized addresses. Hits never touch the network; a miss costs
//! exactly one provider call and one durable store write.

use chrono::{Duration, Utc};
use hashbrown::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::provider::GeocodeProvider;
use super::store::{CacheStore, CachedLocation};
use crate::error::GeocodeError;
use crate::models::GeoPoint;

pub struct GeocodeCache {
    entries: HashMap<String, CachedLocation>,
    store: Box<dyn CacheStore>,
    provider: Arc<dyn GeocodeProvider>,
    /// How long a provider failure stays cached; `None` keeps it forever
    failure_retry: Option<Duration>,
}

impl GeocodeCache {
    /// Load every persisted entry from `store`
    pub fn open(
        store: Box<dyn CacheStore>,
        provider: Arc<dyn GeocodeProvider>,
        failure_retry: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let entries = store.load_all()?;
        info!("Geocode cache loaded with {} entries", entries.len());
        Ok(Self {
            entries,
            store,
            provider,
            failure_retry,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&CachedLocation> {
        self.entries.get(address)
    }

    /// Resolve a normalized address, consulting the provider only on a miss.
    ///
    /// Provider failures resolve to `None` and are cached like a miss.
    pub async fn resolve(&mut self, address: &str) -> Option<GeoPoint> {
        if let Some(entry) = self.entries.get(address) {
            if !self.is_expired(entry) {
                return entry.point();
            }
            debug!("Retrying failed lookup for {}", address);
        }

        let entry = self.lookup(address).await;
        self.entries.insert(address.to_string(), entry);
        if let Err(e) = self.store.store(address, &entry) {
            warn!("Failed to persist geocode result for {}: {:#}", address, e);
        }
        entry.point()
    }

    fn is_expired(&self, entry: &CachedLocation) -> bool {
        match (entry, self.failure_retry) {
            (CachedLocation::Unavailable { at }, Some(retry)) => Utc::now() - *at >= retry,
            _ => false,
        }
    }

    async fn lookup(&self, address: &str) -> CachedLocation {
        let limit = self.provider.timeout();
        let result = match tokio::time::timeout(limit, self.provider.lookup(address)).await {
            Ok(result) => result,
            Err(_) => Err(GeocodeError::Timeout(limit)),
        };

        match result {
            Ok(Some(point)) => {
                debug!("Geocoded {} to {}", address, point);
                CachedLocation::Found(point)
            }
            Ok(None) => {
                debug!("No geocoding match for {}", address);
                CachedLocation::NotFound
            }
            Err(e) => {
                warn!("Geocoding {} failed: {}", address, e);
                CachedLocation::Unavailable { at: Utc::now() }
            }
        }
    }
}
