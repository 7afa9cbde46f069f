//! Island-wide weather map from the Central Weather Administration
//! 36-hour forecast.
//!
//! One request fetches every location; each supported city gets a marker
//! whose tooltip carries the first forecast period.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::models::{City, CityRegistry, GeoPoint};
use crate::render::{escape_html, leaflet_map, Marker};

const TAIWAN_CENTER: GeoPoint = GeoPoint::new(23.6978, 120.9605);
const ZOOM: u8 = 8;

const ELEMENT_DESCRIPTION: &str = "Wx";
const ELEMENT_MAX_TEMP: &str = "MaxT";
const ELEMENT_MIN_TEMP: &str = "MinT";

/// First-period forecast for one location
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub location: String,
    pub description: String,
    pub max_temp: String,
    pub min_temp: String,
}

impl Forecast {
    pub fn summary(&self) -> String {
        format!(
            "{} 的天氣狀況：{}\n最高溫度：{}°C\n最低溫度：{}°C",
            self.location, self.description, self.max_temp, self.min_temp
        )
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    records: ForecastRecords,
}

#[derive(Debug, Deserialize)]
struct ForecastRecords {
    #[serde(default)]
    location: Vec<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    location_name: String,
    #[serde(default)]
    weather_element: Vec<WeatherElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherElement {
    element_name: String,
    #[serde(default)]
    time: Vec<TimeSlot>,
}

#[derive(Debug, Deserialize)]
struct TimeSlot {
    parameter: Parameter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Parameter {
    parameter_name: String,
}

impl Location {
    fn value(&self, element: &str) -> Option<String> {
        self.weather_element
            .iter()
            .find(|e| e.element_name == element)?
            .time
            .first()
            .map(|slot| slot.parameter.parameter_name.clone())
    }

    /// `None` unless all three elements are present
    fn forecast(&self) -> Option<Forecast> {
        Some(Forecast {
            location: self.location_name.clone(),
            description: self.value(ELEMENT_DESCRIPTION)?,
            max_temp: self.value(ELEMENT_MAX_TEMP)?,
            min_temp: self.value(ELEMENT_MIN_TEMP)?,
        })
    }
}

pub struct WeatherClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
        })
    }

    /// Forecasts for every location the service reports
    pub async fn forecasts(&self) -> Result<Vec<Forecast>, WeatherError> {
        let key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("Authorization", key);

        info!("Fetching weather forecast from {}", self.endpoint);
        let response: ForecastResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let forecasts: Vec<Forecast> = response
            .records
            .location
            .iter()
            .filter_map(Location::forecast)
            .collect();
        debug!("Received forecasts for {} locations", forecasts.len());
        Ok(forecasts)
    }

    /// Weather map over every supported city, or the failure message
    pub async fn query(&self, registry: &CityRegistry) -> String {
        render_weather_map(registry, self.forecasts().await)
    }
}

/// One marker per city. A failed request still draws the map, with the
/// failure in every tooltip; a missing key yields only the message.
pub fn render_weather_map(
    registry: &CityRegistry,
    forecasts: Result<Vec<Forecast>, WeatherError>,
) -> String {
    let forecasts = match forecasts {
        Ok(forecasts) => Ok(forecasts),
        Err(WeatherError::MissingApiKey) => {
            warn!("Weather query without a configured API key");
            return WeatherError::MissingApiKey.to_string();
        }
        Err(e) => {
            warn!("Weather forecast request failed: {}", e);
            Err(e.to_string())
        }
    };

    let markers: Vec<Marker> = registry
        .all()
        .iter()
        .map(|city| {
            let text = match &forecasts {
                Ok(forecasts) => city_text(forecasts, city),
                Err(message) => message.clone(),
            };
            Marker {
                lat: city.center.lat,
                lon: city.center.lon,
                popup: escape_html(city.name),
                tooltip: escape_html(&text).replace('\n', "<br>"),
            }
        })
        .collect();

    leaflet_map(TAIWAN_CENTER, ZOOM, &markers)
}

fn city_text(forecasts: &[Forecast], city: &City) -> String {
    match forecasts.iter().find(|f| f.location == city.name) {
        Some(forecast) => forecast.summary(),
        None => format!("無法取得 {} 的天氣資料。", city.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Router};
    use hashbrown::HashMap;

    const FORECAST_JSON: &str = r#"{
        "success": "true",
        "records": {
            "datasetDescription": "三十六小時天氣預報",
            "location": [
                {
                    "locationName": "臺北市",
                    "weatherElement": [
                        {"elementName": "Wx", "time": [
                            {"startTime": "2026-10-16 12:00:00", "endTime": "2026-10-16 18:00:00",
                             "parameter": {"parameterName": "多雲時晴", "parameterValue": "3"}}
                        ]},
                        {"elementName": "PoP", "time": [
                            {"parameter": {"parameterName": "20", "parameterUnit": "百分比"}}
                        ]},
                        {"elementName": "MinT", "time": [
                            {"parameter": {"parameterName": "24", "parameterUnit": "C"}}
                        ]},
                        {"elementName": "MaxT", "time": [
                            {"parameter": {"parameterName": "30", "parameterUnit": "C"}}
                        ]}
                    ]
                },
                {
                    "locationName": "花蓮縣",
                    "weatherElement": [
                        {"elementName": "Wx", "time": [
                            {"parameter": {"parameterName": "陰短暫雨"}}
                        ]}
                    ]
                }
            ]
        }
    }"#;

    const TAIPEI_TOOLTIP: &str = "臺北市 的天氣狀況：多雲時晴<br>最高溫度：30°C<br>最低溫度：24°C";

    async fn serve() -> String {
        let app = Router::new().route(
            "/api/v1/rest/datastore/F-C0032-001",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("Authorization").map(String::as_str) {
                    Some("test-key") => (StatusCode::OK, FORECAST_JSON),
                    _ => (StatusCode::UNAUTHORIZED, "{}"),
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v1/rest/datastore/F-C0032-001", addr)
    }

    fn client(endpoint: String, api_key: Option<&str>) -> WeatherClient {
        WeatherClient::new(&WeatherConfig {
            endpoint,
            api_key: api_key.map(str::to_string),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_forecast_elements_found_by_name() {
        let response: ForecastResponse = serde_json::from_str(FORECAST_JSON).unwrap();
        let forecasts: Vec<_> = response
            .records
            .location
            .iter()
            .filter_map(Location::forecast)
            .collect();
        assert_eq!(
            forecasts,
            vec![Forecast {
                location: "臺北市".into(),
                description: "多雲時晴".into(),
                max_temp: "30".into(),
                min_temp: "24".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_weather_map_from_local_service() {
        let endpoint = serve().await;
        let registry = CityRegistry::new();

        let html = client(endpoint, Some("test-key")).query(&registry).await;
        assert_eq!(html.matches("\"tooltip\":").count(), registry.len());
        assert!(html.contains(TAIPEI_TOOLTIP));
        assert!(html.contains("無法取得 花蓮縣 的天氣資料。"));
        assert!(html.contains("無法取得 高雄市 的天氣資料。"));
        assert!(html.contains("setView([23.6978, 120.9605], 8)"));
    }

    #[tokio::test]
    async fn test_rejected_request_fills_every_tooltip() {
        let endpoint = serve().await;
        let registry = CityRegistry::new();

        let html = client(endpoint, Some("wrong-key")).query(&registry).await;
        assert_eq!(
            html.matches("API 請求失敗，請稍後再試。").count(),
            registry.len()
        );
    }

    #[tokio::test]
    async fn test_missing_key_skips_request() {
        let registry = CityRegistry::new();
        let client = client("http://127.0.0.1:9/unused".into(), Some("  "));
        assert!(matches!(
            client.forecasts().await,
            Err(WeatherError::MissingApiKey)
        ));
        assert_eq!(
            client.query(&registry).await,
            "尚未設定氣象資料開放平臺授權碼，無法查詢天氣"
        );
    }
}
