//! Error taxonomy for the query pipeline, the geocoder and the data refresh.
//!
//! `QueryError` renders as the message shown to the user, so the dashboard
//! can fold every failure into a plain string at its boundary.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::models::PriceRange;

/// Failures of a real-estate query, each with a user-facing message
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("抱歉，目前不支援 {city} 的資料查詢")]
    CityNotSupported { city: String },
    #[error("抱歉，{city} 的 {file} 資料檔案不存在，請執行『下載實價登錄資訊』")]
    DatasetNotFound { city: String, file: String },
    #[error("抱歉，{file} 資料檔案無法讀取：{reason}")]
    DatasetUnreadable { file: String, reason: String },
    #[error("價格範圍必須為有效數字")]
    InvalidPriceRange,
    #[error("沒有符合價格範圍 {range} 佰萬元的交易資料。")]
    NoMatchingRecords { range: PriceRange },
    #[error("無有效數據，無法繪製泡泡圖。")]
    NoValidData,
    #[error("圖表產生失敗：{0}")]
    Render(String),
}

/// Failures parsing a transaction CSV; surfaced as `QueryError::DatasetUnreadable`
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("缺少欄位 {0}")]
    MissingColumn(&'static str),
    #[error("CSV 格式錯誤：{0}")]
    Csv(#[from] csv::Error),
}

/// Geocoding provider failures; recovered inside the cache, never surfaced
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected geocoding response: {0}")]
    Decode(String),
}

/// Failures fetching the regional news list
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("抱歉，目前不支援 {0} 的新聞查詢")]
    CityNotSupported(String),
    #[error("新聞擷取失敗：{0}")]
    Http(#[from] reqwest::Error),
    #[error("新聞網址錯誤：{0}")]
    Url(#[from] url::ParseError),
    #[error("新聞頁面解析失敗：{0}")]
    Parse(String),
}

/// Failures fetching the weather forecast
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("尚未設定氣象資料開放平臺授權碼，無法查詢天氣")]
    MissingApiKey,
    #[error("API 請求失敗，請稍後再試。")]
    Http(#[from] reqwest::Error),
}

/// Failures of the dataset refresh (download and extract)
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("download from {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build download client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("download from {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("archive extraction failed: {0}")]
    Archive(#[from] zip::result::ZipError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matching_records_echoes_range() {
        let err = QueryError::NoMatchingRecords {
            range: PriceRange::from_millions(3.0, 8.0),
        };
        assert_eq!(err.to_string(), "沒有符合價格範圍 3 - 8 佰萬元的交易資料。");
    }

    #[test]
    fn test_dataset_not_found_suggests_refresh() {
        let err = QueryError::DatasetNotFound {
            city: "臺北市".into(),
            file: "a_lvr_land_a.csv".into(),
        };
        let message = err.to_string();
        assert!(message.contains("a_lvr_land_a.csv"));
        assert!(message.contains("下載實價登錄資訊"));
    }

    #[test]
    fn test_no_valid_data_is_distinct_from_no_matches() {
        let no_valid = QueryError::NoValidData.to_string();
        let no_match = QueryError::NoMatchingRecords {
            range: PriceRange::from_millions(1.0, 2.0),
        }
        .to_string();
        assert_ne!(no_valid, no_match);
    }
}
