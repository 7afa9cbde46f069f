//! Loading, filtering and enriching a city's transaction dataset, plus the
//! archive refresh that keeps the data directory populated.

mod download;
mod enrich;
mod filter;
mod loader;

pub use download::{download_client, extract_archive, refresh_dataset, RefreshSummary, ARCHIVE_NAME};
pub use enrich::{districts_in_order, enrich};
pub use filter::filter_by_price;
pub use loader::{load_city, read_records};
