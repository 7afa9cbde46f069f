//! Leaflet map with one marker per geocoded transaction.

use serde::Serialize;
use tracing::debug;

use super::format::{escape_html, thousands_trunc};
use crate::geocode::{normalize_address, GeocodeCache};
use crate::models::{GeoPoint, TransactionRecord};

/// Upper bound on markers and on the source row index considered
pub const MAP_MARKER_LIMIT: usize = 100;

const ZOOM: u8 = 12;
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

/// A map pin; `popup` and `tooltip` are inserted as HTML, so escape them first
#[derive(Debug, Serialize)]
pub(crate) struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub popup: String,
    pub tooltip: String,
}

/// Geocode up to [`MAP_MARKER_LIMIT`] records and render them around `center`.
///
/// Iteration stops once the limit of markers is placed or a record's source row
/// reaches the limit. Unresolvable addresses are skipped.
pub async fn render_map(
    records: &[TransactionRecord],
    center: GeoPoint,
    cache: &mut GeocodeCache,
) -> String {
    let mut markers = Vec::new();
    for record in records {
        if markers.len() >= MAP_MARKER_LIMIT || record.row >= MAP_MARKER_LIMIT {
            break;
        }
        let (Some(address), Some(price)) = (record.address.as_deref(), record.total_price) else {
            continue;
        };
        let Some(point) = cache.resolve(&normalize_address(address)).await else {
            debug!("No coordinate for row {}, skipping marker", record.row);
            continue;
        };
        let label = escape_html(&format!(
            "門牌:{}{}, 金額 :{}",
            record.district.as_deref().unwrap_or(""),
            address,
            thousands_trunc(price)
        ));
        markers.push(Marker {
            lat: point.lat,
            lon: point.lon,
            popup: label.clone(),
            tooltip: label,
        });
    }

    debug!("Placed {} markers", markers.len());
    leaflet_map(center, ZOOM, &markers)
}

/// Standalone Leaflet page fragment with `markers` over OpenStreetMap tiles
pub(crate) fn leaflet_map(center: GeoPoint, zoom: u8, markers: &[Marker]) -> String {
    // Marker JSON is embedded in a <script>; never let it close the tag
    let markers_json = serde_json::to_string(markers)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/");

    let mut html = String::new();
    html.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">\n", LEAFLET_CSS));
    html.push_str(&format!("<script src=\"{}\"></script>\n", LEAFLET_JS));
    html.push_str("<div id=\"lvr-map\" style=\"width: 100%; height: 600px;\"></div>\n");
    html.push_str("<script>\n");
    html.push_str(&format!(
        "var map = L.map('lvr-map').setView([{}, {}], {});\n",
        center.lat, center.lon, zoom
    ));
    html.push_str(&format!(
        "L.tileLayer('{}', {{ maxZoom: 19, attribution: '{}' }}).addTo(map);\n",
        TILE_URL, TILE_ATTRIBUTION
    ));
    html.push_str(&format!("var markers = {};\n", markers_json));
    html.push_str(
        "markers.forEach(function (m) {\n  L.marker([m.lat, m.lon]).bindPopup(m.popup).bindTooltip(m.tooltip).addTo(map);\n});\n",
    );
    html.push_str("</script>");
    html
}
