//! CSV loader for the published transaction files.
//!
//! Column names are resolved once from the header row; everything past this
//! module works on `TransactionRecord`.

use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{LoadError, QueryError};
use crate::models::{City, TransactionRecord};

const COL_DISTRICT: &str = "鄉鎮市區";
const COL_ADDRESS: &str = "土地位置建物門牌";
const COL_TOTAL_PRICE: &str = "總價元";
const COL_FLOOR_AREA: &str = "建物移轉總面積平方公尺";
const COL_UNIT_PRICE: &str = "單價元平方公尺";

/// Column positions resolved from the header row
struct Columns {
    district: usize,
    address: usize,
    total_price: usize,
    floor_area: Option<usize>,
    unit_price: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        let position = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        let required =
            |name: &'static str| position(name).ok_or(LoadError::MissingColumn(name));

        Ok(Self {
            district: required(COL_DISTRICT)?,
            address: required(COL_ADDRESS)?,
            total_price: required(COL_TOTAL_PRICE)?,
            floor_area: position(COL_FLOOR_AREA),
            unit_price: position(COL_UNIT_PRICE),
        })
    }
}

/// Load a city's dataset from the data directory
pub fn load_city(data_dir: &Path, city: &City) -> Result<Vec<TransactionRecord>, QueryError> {
    let path = data_dir.join(city.dataset_file);
    if !path.exists() {
        info!("Dataset {} not found", path.display());
        return Err(QueryError::DatasetNotFound {
            city: city.name.to_string(),
            file: city.dataset_file.to_string(),
        });
    }

    let unreadable = |reason: String| QueryError::DatasetUnreadable {
        file: city.dataset_file.to_string(),
        reason,
    };

    let file = File::open(&path).map_err(|e| unreadable(e.to_string()))?;
    let records = read_records(file).map_err(|e| unreadable(e.to_string()))?;
    info!("Loaded {} rows from {}", records.len(), city.dataset_file);
    Ok(records)
}

/// Parse transaction records from any CSV source
pub fn read_records<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, LoadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut records = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        records.push(TransactionRecord {
            row,
            district: text_cell(&record, columns.district),
            address: text_cell(&record, columns.address),
            total_price: numeric_cell(&record, columns.total_price),
            floor_area: columns.floor_area.and_then(|i| numeric_cell(&record, i)),
            listed_unit_price: columns.unit_price.and_then(|i| numeric_cell(&record, i)),
        });
    }

    let unpriced = records.iter().filter(|r| r.total_price.is_none()).count();
    if unpriced > 0 {
        debug!("{} rows have no numeric total price", unpriced);
    }

    Ok(records)
}

fn text_cell(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric coercion: anything unparseable or non-finite is missing
fn numeric_cell(record: &StringRecord, index: usize) -> Option<f64> {
    record
        .get(index)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
