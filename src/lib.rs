//! lvrmap - a dashboard over Taiwan's real-estate transaction open data
//!
//! This library provides the query pipeline (load, filter, enrich, render),
//! the cached geocoder and the auxiliary loan, news and weather views shared by
//! the server and refresh binaries.

pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod geocode;
pub mod loan;
pub mod models;
pub mod news;
pub mod render;
pub mod weather;

pub use config::Config;
pub use dashboard::Dashboard;
pub use models::{City, CityRegistry, GeoPoint, PriceRange, TransactionRecord};
