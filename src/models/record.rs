//! Transaction records and the derived per-row view used by the renderers.

use serde::Serialize;

const GOOGLE_MAPS_SEARCH: &str = "https://www.google.com/maps/search/?api=1&query=";

/// Multiplier between the human-facing price unit and NT dollars
pub const PRICE_UNIT_FACTOR: f64 = 1_000_000.0;

/// One row of a city's dataset.
///
/// Missing or unparseable cells are `None`; rows are never rejected at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Zero-based data row position in the source file
    pub row: usize,
    pub district: Option<String>,
    pub address: Option<String>,
    /// NT dollars
    pub total_price: Option<f64>,
    /// Square meters
    pub floor_area: Option<f64>,
    /// Unit price as published in the file, NT dollars per square meter
    pub listed_unit_price: Option<f64>,
}

impl TransactionRecord {
    /// Derived unit price, only when both price and area are positive
    pub fn unit_price(&self) -> Option<f64> {
        match (self.total_price, self.floor_area) {
            (Some(price), Some(area)) if price > 0.0 && area > 0.0 => Some(price / area),
            _ => None,
        }
    }

    /// Unit price for display: the published value, else the derived one
    pub fn display_unit_price(&self) -> Option<f64> {
        self.listed_unit_price.or_else(|| self.unit_price())
    }

    pub fn maps_link(&self) -> Option<String> {
        self.address.as_deref().map(maps_link)
    }
}

/// A record that passed validation, with every derived field populated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub row: usize,
    pub district: String,
    pub address: Option<String>,
    pub total_price: f64,
    pub floor_area: f64,
    pub unit_price: f64,
    pub maps_link: Option<String>,
    /// Records sharing this district within the current selection
    pub district_count: usize,
    /// Chart sizing weight, equal to `district_count`
    pub bubble_weight: usize,
}

/// Google Maps search link for a free-text address
pub fn maps_link(address: &str) -> String {
    format!("{}{}", GOOGLE_MAPS_SEARCH, urlencoding::encode(address))
}

/// Inclusive price window expressed in millions of NT dollars
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min_millions: f64,
    pub max_millions: f64,
}

impl PriceRange {
    pub fn from_millions(min_millions: f64, max_millions: f64) -> Self {
        Self {
            min_millions,
            max_millions,
        }
    }

    /// Raw bounds in NT dollars
    pub fn bounds(&self) -> (f64, f64) {
        (
            self.min_millions * PRICE_UNIT_FACTOR,
            self.max_millions * PRICE_UNIT_FACTOR,
        )
    }

    /// Both bounds are real numbers
    pub fn is_finite(&self) -> bool {
        self.min_millions.is_finite() && self.max_millions.is_finite()
    }

    pub fn contains(&self, total_price: f64) -> bool {
        let (min, max) = self.bounds();
        total_price >= min && total_price <= max
    }
}

impl std::fmt::Display for PriceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.min_millions, self.max_millions)
    }
}
