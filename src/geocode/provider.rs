//! External geocoding providers.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::GeocoderConfig;
use crate::error::GeocodeError;
use crate::models::GeoPoint;

/// Resolves a free-text address to a coordinate.
///
/// `Ok(None)` means the provider answered and had no match; `Err` means it
/// could not be asked.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn lookup(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError>;

    /// Upper bound for a single lookup
    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }
}

/// Nominatim search API client
pub struct NominatimProvider {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimProvider {
    pub fn new(config: &GeocoderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            timeout: config.timeout(),
        })
    }

    fn search_url(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json")
            .append_pair("limit", "1");
        url
    }
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
    async fn lookup(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let response = self
            .client
            .get(self.search_url(address))
            .send()
            .await?
            .error_for_status()?;

        let places: Vec<NominatimPlace> = response.json().await?;
        debug!("Nominatim returned {} results for {}", places.len(), address);

        places
            .first()
            .map(parse_place)
            .transpose()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_place(place: &NominatimPlace) -> Result<GeoPoint, GeocodeError> {
    let lat = place.lat.trim().parse::<f64>();
    let lon = place.lon.trim().parse::<f64>();
    match (lat, lon) {
        (Ok(lat), Ok(lon)) => {
            let point = GeoPoint::new(lat, lon);
            if point.is_valid() {
                Ok(point)
            } else {
                Err(GeocodeError::Decode(format!("coordinate out of range: {}", point)))
            }
        }
        _ => Err(GeocodeError::Decode(format!(
            "unparseable coordinate ({}, {})",
            place.lat, place.lon
        ))),
    }
}
