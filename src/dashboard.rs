//! Caller-facing query operations.
//!
//! Each operation takes a city name and a price range in millions and returns
//! an HTML fragment. Every failure is folded into its user-facing message, so
//! callers always get a string back.

use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::dataset::{enrich, filter_by_price, load_city};
use crate::error::QueryError;
use crate::geocode::GeocodeCache;
use crate::models::{City, CityRegistry, PriceRange, TransactionRecord};
use crate::render::{escape_html, render_bubble_chart, render_map, render_table};

pub struct Dashboard {
    data_dir: PathBuf,
    registry: CityRegistry,
    /// Single writer for the geocode cache and its backing store
    geocoder: Mutex<GeocodeCache>,
}

impl Dashboard {
    pub fn new(data_dir: impl Into<PathBuf>, geocoder: GeocodeCache) -> Self {
        Self {
            data_dir: data_dir.into(),
            registry: CityRegistry::new(),
            geocoder: Mutex::new(geocoder),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry(&self) -> &CityRegistry {
        &self.registry
    }

    /// Selected records as an HTML table
    pub fn query_table(&self, city: &str, min_millions: f64, max_millions: f64) -> String {
        let range = PriceRange::from_millions(min_millions, max_millions);
        match self.select(city, &range) {
            Ok((_, records)) => render_table(&records, &range),
            Err(e) => report(city, e),
        }
    }

    /// Selected records as an embedded bubble chart
    pub fn query_bubble_chart(&self, city: &str, min_millions: f64, max_millions: f64) -> String {
        let range = PriceRange::from_millions(min_millions, max_millions);
        let result = self.select(city, &range).and_then(|(city, records)| {
            let enriched = enrich(&records)?;
            render_bubble_chart(&enriched, city.name)
        });
        result.unwrap_or_else(|e| report(city, e))
    }

    /// Selected records as a map with geocoded markers
    pub async fn query_map(&self, city: &str, min_millions: f64, max_millions: f64) -> String {
        let range = PriceRange::from_millions(min_millions, max_millions);
        let (city, records) = match self.select(city, &range) {
            Ok(selection) => selection,
            Err(e) => return report(city, e),
        };

        let mut geocoder = self.geocoder.lock().await;
        render_map(&records, city.center, &mut geocoder).await
    }

    /// Resolve the city, load its dataset and keep the rows inside `range`
    fn select(
        &self,
        city: &str,
        range: &PriceRange,
    ) -> Result<(&'static City, Vec<TransactionRecord>), QueryError> {
        let city = self
            .registry
            .lookup(city)
            .ok_or_else(|| QueryError::CityNotSupported {
                city: city.to_string(),
            })?;
        if !range.is_finite() {
            return Err(QueryError::InvalidPriceRange);
        }

        let records = load_city(&self.data_dir, city)?;
        let selected = filter_by_price(records, range);
        info!(
            "{} records in {} within {} million",
            selected.len(),
            city.name,
            range
        );

        if selected.is_empty() {
            return Err(QueryError::NoMatchingRecords { range: *range });
        }
        Ok((city, selected))
    }
}

fn report(city: &str, error: QueryError) -> String {
    match &error {
        QueryError::DatasetUnreadable { .. } | QueryError::Render(_) => {
            warn!("Query for {} failed: {}", city, error)
        }
        _ => info!("Query for {} returned no result: {}", city, error),
    }
    escape_html(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{CountingProvider, MemoryStore};
    use std::fs;
    use std::sync::Arc;

    const HEADER: &str = "鄉鎮市區,交易標的,土地位置建物門牌,總價元,建物移轉總面積平方公尺,單價元平方公尺";
    const ENGLISH_HEADER: &str = "The villages and towns urban district,transaction sign,land sector position building sector house number plate,total price NTD,building shifting total area,the unit price (NTD / square meter)";

    fn dashboard(rows: &[&str]) -> (tempfile::TempDir, Arc<CountingProvider>, Dashboard) {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = format!("{}\n{}\n", HEADER, ENGLISH_HEADER);
        for row in rows {
            csv.push_str(row);
            csv.push('\n');
        }
        fs::write(dir.path().join("a_lvr_land_a.csv"), csv).unwrap();

        let provider = CountingProvider::new();
        let cache =
            GeocodeCache::open(Box::new(MemoryStore::new()), provider.clone(), None).unwrap();
        let dashboard = Dashboard::new(dir.path(), cache);
        (dir, provider, dashboard)
    }

    fn sample() -> (tempfile::TempDir, Arc<CountingProvider>, Dashboard) {
        dashboard(&[
            "X,房地,臺北市X區一路1號,2000000,30,",
            "X,房地,臺北市X區二路2號,5000000,40,",
            "Y,房地,臺北市Y區三路3號,9000000,45,",
        ])
    }

    #[test]
    fn test_selection_counts_within_range() {
        let (_dir, _, dashboard) = sample();
        let (_, records) = dashboard
            .select("臺北市", &PriceRange::from_millions(3.0, 8.0))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_price, Some(5_000_000.0));

        let enriched = enrich(&records).unwrap();
        assert_eq!(enriched[0].district, "X");
        assert_eq!(enriched[0].district_count, 1);
        assert_eq!(enriched[0].unit_price, 125_000.0);
    }

    #[test]
    fn test_table_query() {
        let (_dir, _, dashboard) = sample();
        let html = dashboard.query_table("臺北市", 3.0, 8.0);
        assert!(html.contains("<table"));
        assert!(html.contains("5,000,000"));
        assert!(html.contains("125,000"));
        assert!(!html.contains("9,000,000"));
    }

    #[test]
    fn test_unsupported_city_message() {
        let (_dir, _, dashboard) = sample();
        assert_eq!(
            dashboard.query_table("東京都", 0.0, 10.0),
            "抱歉，目前不支援 東京都 的資料查詢"
        );
        assert_eq!(
            dashboard.query_bubble_chart("東京都", 0.0, 10.0),
            "抱歉，目前不支援 東京都 的資料查詢"
        );
    }

    #[test]
    fn test_city_name_is_escaped_in_message() {
        let (_dir, _, dashboard) = sample();
        let message = dashboard.query_table("<script>", 0.0, 10.0);
        assert!(message.contains("&lt;script&gt;"));
        assert!(!message.contains("<script>"));
    }

    #[test]
    fn test_missing_dataset_suggests_refresh() {
        let (_dir, _, dashboard) = sample();
        let message = dashboard.query_table("高雄市", 0.0, 10.0);
        assert!(message.contains("e_lvr_land_a.csv"));
        assert!(message.contains("下載實價登錄資訊"));
    }

    #[test]
    fn test_no_matching_records() {
        let (_dir, _, dashboard) = sample();
        assert_eq!(
            dashboard.query_table("臺北市", 100.0, 200.0),
            "沒有符合價格範圍 100 - 200 佰萬元的交易資料。"
        );
        // Inverted range selects nothing
        assert_eq!(
            dashboard.query_bubble_chart("臺北市", 8.0, 3.0),
            "沒有符合價格範圍 8 - 3 佰萬元的交易資料。"
        );
    }

    #[tokio::test]
    async fn test_non_finite_range_rejected() {
        let (_dir, provider, dashboard) = sample();
        let message = "價格範圍必須為有效數字";
        assert_eq!(dashboard.query_table("臺北市", f64::NAN, 10.0), message);
        assert_eq!(
            dashboard.query_bubble_chart("臺北市", 0.0, f64::INFINITY),
            message
        );
        assert_eq!(
            dashboard.query_map("臺北市", f64::NEG_INFINITY, 10.0).await,
            message
        );
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_bubble_chart_query() {
        let (_dir, _, dashboard) = sample();
        let html = dashboard.query_bubble_chart("台北市", 0.0, 10.0);
        assert!(html.starts_with("<img src=\"data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_bubble_chart_without_valid_rows() {
        let (_dir, _, dashboard) = dashboard(&["X,房地,臺北市X區一路1號,5000000,0,"]);
        assert_eq!(
            dashboard.query_bubble_chart("臺北市", 0.0, 10.0),
            "無有效數據，無法繪製泡泡圖。"
        );
    }

    #[test]
    fn test_bubble_chart_skips_overflowing_unit_price() {
        let (_dir, _, dashboard) = dashboard(&["X,房地,臺北市X區一路1號,5000000,1e-320,"]);
        assert_eq!(
            dashboard.query_bubble_chart("臺北市", 0.0, 10.0),
            "無有效數據，無法繪製泡泡圖。"
        );
    }

    #[tokio::test]
    async fn test_map_query_geocodes_once_per_address() {
        let (_dir, provider, dashboard) = sample();

        let html = dashboard.query_map("臺北市", 0.0, 10.0).await;
        assert_eq!(html.matches("\"popup\":").count(), 3);
        assert!(html.contains("setView([25.0375, 121.5637], 12)"));
        assert_eq!(provider.calls(), 3);

        dashboard.query_map("臺北市", 0.0, 10.0).await;
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_map_query_no_matches() {
        let (_dir, provider, dashboard) = sample();
        let message = dashboard.query_map("臺北市", 50.0, 60.0).await;
        assert_eq!(message, "沒有符合價格範圍 50 - 60 佰萬元的交易資料。");
        assert_eq!(provider.calls(), 0);
    }
}
