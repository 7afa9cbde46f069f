/// Bootstrap stylesheet linked by every tabular fragment
pub const BOOTSTRAP_CSS: &str =
    "https://stackpath.bootstrapcdn.com/bootstrap/4.5.2/css/bootstrap.min.css";

/// Round to an integer and group thousands with commas: 12345678.4 -> "12,345,678"
pub fn thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) if rest.chars().any(|c| c != '0') => ("-", rest),
        Some(rest) => ("", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}

/// Missing values render as an empty string
pub fn thousands_opt(value: Option<f64>) -> String {
    value.map(thousands).unwrap_or_default()
}

/// Truncate toward zero, then group thousands
pub fn thousands_trunc(value: f64) -> String {
    thousands(value.trunc())
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
