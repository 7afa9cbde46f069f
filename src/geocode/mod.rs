//! Address normalization and cached geocoding.

mod cache;
mod normalize;
mod provider;
mod store;

pub use cache::GeocodeCache;
pub use normalize::normalize_address;
pub use provider::{GeocodeProvider, NominatimProvider};
pub use store::{CacheStore, CachedLocation, JsonFileStore, MemoryStore, SledStore};

#[cfg(test)]
pub(crate) use cache::tests::CountingProvider;

use std::sync::Arc;

use crate::config::{CacheBackend, Config};

/// Build the production cache described by `config`
pub fn open_cache(config: &Config) -> anyhow::Result<GeocodeCache> {
    let path = config.cache_path();
    let store: Box<dyn CacheStore> = match config.geocoder.cache_backend {
        CacheBackend::Sled => Box::new(SledStore::open(&path)?),
        CacheBackend::Json => Box::new(JsonFileStore::open(&path)?),
    };
    let provider = Arc::new(NominatimProvider::new(&config.geocoder)?);
    GeocodeCache::open(store, provider, config.geocoder.failure_retry())
}
