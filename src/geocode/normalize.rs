use regex::Regex;
use std::sync::LazyLock;

/// A numeral run (Arabic, Chinese or full-width) followed by a lane, number or floor marker
static UNIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9一二三四五六七八九十０-９]+[弄號樓]").expect("valid unit pattern")
});

/// Sub-unit separator; it and everything after it is dropped
const SUB_UNIT: char = '之';

/// Strip the address components that geocoders resolve poorly.
///
/// Lane, number and floor parts are removed wherever they appear, then the
/// string is cut at the first sub-unit separator. Applying it twice gives the
/// same result as applying it once.
pub fn normalize_address(address: &str) -> String {
    let stripped = UNIT_SUFFIX.replace_all(address, "");
    match stripped.find(SUB_UNIT) {
        Some(idx) => stripped[..idx].to_string(),
        None => stripped.into_owned(),
    }
}
