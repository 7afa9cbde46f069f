use super::format::{escape_html, thousands_opt, BOOTSTRAP_CSS};
use crate::error::QueryError;
use crate::models::{PriceRange, TransactionRecord};

const TABLE_STYLE: &str = r#"
<style>
    th, td { text-align: center; }
    td:nth-child(3) { text-align: right; }
    td:nth-child(4) { text-align: right; }
</style>
"#;

const HEADERS: [&str; 4] = ["鄉鎮市區", "土地位置建物門牌", "總價", "單價元平方公尺"];

/// Render the selected records as a striped HTML table.
///
/// An empty selection yields the no-data message, never an empty table.
pub fn render_table(records: &[TransactionRecord], range: &PriceRange) -> String {
    if records.is_empty() {
        return QueryError::NoMatchingRecords { range: *range }.to_string();
    }

    let mut html = String::new();
    html.push_str(&format!("<link href=\"{}\" rel=\"stylesheet\">", BOOTSTRAP_CSS));
    html.push_str(TABLE_STYLE);
    html.push_str("<table border=\"1\" class=\"dataframe table table-striped\">\n");
    html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
    for header in HEADERS {
        html.push_str(&format!("      <th>{}</th>\n", header));
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for record in records {
        html.push_str("    <tr>\n");
        let cells = [
            escape_html(record.district.as_deref().unwrap_or("")),
            address_cell(record),
            thousands_opt(record.total_price),
            thousands_opt(record.display_unit_price()),
        ];
        for cell in cells {
            html.push_str(&format!("      <td>{}</td>\n", cell));
        }
        html.push_str("    </tr>\n");
    }

    html.push_str("  </tbody>\n</table>");
    html
}

fn address_cell(record: &TransactionRecord) -> String {
    match (record.address.as_deref(), record.maps_link()) {
        (Some(address), Some(link)) => format!(
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            escape_html(&link),
            escape_html(address)
        ),
        _ => String::new(),
    }
}
