//! Bubble chart of unit price against floor area, one colour per district.
//!
//! The chart is drawn to SVG and embedded as a base64 data URI, so the
//! returned fragment references no files.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use plotters::prelude::*;

use crate::dataset::districts_in_order;
use crate::error::QueryError;
use crate::models::EnrichedRecord;

/// Square meters per ping
pub const PING_DIVISOR: f64 = 3.3058;
/// Unit price plotted in units of 10,000 NT dollars
pub const UNIT_PRICE_DIVISOR: f64 = 10_000.0;

const CHART_SIZE: (u32, u32) = (1100, 700);
const BUBBLE_SCALE: f64 = 10.0;
const BUBBLE_ALPHA: f64 = 0.5;

/// Categorical palette (tab20)
const PALETTE: [RGBColor; 20] = [
    RGBColor(31, 119, 180),
    RGBColor(174, 199, 232),
    RGBColor(255, 127, 14),
    RGBColor(255, 187, 120),
    RGBColor(44, 160, 44),
    RGBColor(152, 223, 138),
    RGBColor(214, 39, 40),
    RGBColor(255, 152, 150),
    RGBColor(148, 103, 189),
    RGBColor(197, 176, 213),
    RGBColor(140, 86, 75),
    RGBColor(196, 156, 148),
    RGBColor(227, 119, 194),
    RGBColor(247, 182, 210),
    RGBColor(127, 127, 127),
    RGBColor(199, 199, 199),
    RGBColor(188, 189, 34),
    RGBColor(219, 219, 141),
    RGBColor(23, 190, 207),
    RGBColor(158, 218, 229),
];

/// Colour for the i-th district; past the palette, hues step by the golden angle
pub fn district_color(index: usize) -> RGBColor {
    if let Some(color) = PALETTE.get(index) {
        return *color;
    }
    let hue = ((index - PALETTE.len()) as f64 * 0.381_966_011).fract();
    let (r, g, b) = HSLColor(hue, 0.65, 0.5).rgb();
    RGBColor(r, g, b)
}

/// Plot coordinates and radius for one record
fn bubble(record: &EnrichedRecord) -> (f64, f64, i32) {
    let x = record.floor_area / PING_DIVISOR;
    let y = record.unit_price / UNIT_PRICE_DIVISOR;
    let radius = (record.bubble_weight as f64 * BUBBLE_SCALE).sqrt().round().max(1.0) as i32;
    (x, y, radius)
}

/// Draw the chart and return it as SVG markup
pub fn render_svg(records: &[EnrichedRecord], city: &str) -> Result<String, QueryError> {
    if records.is_empty() {
        return Err(QueryError::NoValidData);
    }
    let mut svg = String::new();
    draw(records, city, &mut svg).map_err(|e| QueryError::Render(e.to_string()))?;
    Ok(svg)
}

/// Draw the chart and wrap it in a self-contained `<img>` tag
pub fn render_bubble_chart(records: &[EnrichedRecord], city: &str) -> Result<String, QueryError> {
    let svg = render_svg(records, city)?;
    Ok(format!(
        "<img src=\"data:image/svg+xml;base64,{}\" alt=\"Bubble Chart\">",
        BASE64.encode(svg.as_bytes())
    ))
}

fn draw(
    records: &[EnrichedRecord],
    city: &str,
    out: &mut String,
) -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<(f64, f64, i32)> = records.iter().map(bubble).collect();
    let x_max = points.iter().map(|p| p.0).fold(0.0, f64::max) * 1.1;
    let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max) * 1.1;
    if !(x_max.is_finite() && y_max.is_finite() && x_max > 0.0 && y_max > 0.0) {
        return Err(format!("axis range out of bounds: x {} y {}", x_max, y_max).into());
    }

    let root = SVGBackend::with_string(out, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!("{} --> 各區域房屋_交易數據", city);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("建物移轉總面積 (坪)")
        .y_desc("單價 (萬/平方公尺)")
        .draw()?;

    for (i, district) in districts_in_order(records).into_iter().enumerate() {
        let color = district_color(i);
        let style = color.mix(BUBBLE_ALPHA).filled();
        let series = records
            .iter()
            .zip(&points)
            .filter(|(r, _)| r.district == district)
            .map(|(_, &(x, y, radius))| Circle::new((x, y), radius, style.clone()));

        chart
            .draw_series(series)?
            .label(district)
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
