//! Core data models for the real-estate dashboard.

pub mod city;
pub mod geo;
pub mod record;

pub use city::{City, CityRegistry};
pub use geo::GeoPoint;
pub use record::{maps_link, EnrichedRecord, PriceRange, TransactionRecord, PRICE_UNIT_FACTOR};
