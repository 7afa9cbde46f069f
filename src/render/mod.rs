//! HTML fragment renderers for the three query views.

mod bubble;
mod format;
mod map;
mod table;

pub use bubble::{district_color, render_bubble_chart, render_svg, PING_DIVISOR, UNIT_PRICE_DIVISOR};
pub use format::{escape_html, thousands, thousands_opt, thousands_trunc, BOOTSTRAP_CSS};
pub use map::{render_map, MAP_MARKER_LIMIT};
pub(crate) use map::{leaflet_map, Marker};
pub use table::render_table;
