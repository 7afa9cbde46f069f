//! Static registry of supported cities.
//!
//! Each entry maps a display name to the dataset file inside the extracted
//! open-data archive, a reference coordinate for map centering and the
//! regional news section slug.

use super::GeoPoint;

/// A supported city
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    /// Display name, e.g. "臺北市"
    pub name: &'static str,
    /// CSV file name inside the data directory
    pub dataset_file: &'static str,
    /// Default map center
    pub center: GeoPoint,
    /// Breaking-news list section
    pub news_slug: &'static str,
}

const fn city(
    name: &'static str,
    dataset_file: &'static str,
    lat: f64,
    lon: f64,
    news_slug: &'static str,
) -> City {
    City {
        name,
        dataset_file,
        center: GeoPoint::new(lat, lon),
        news_slug,
    }
}

static CITIES: &[City] = &[
    city("臺北市", "a_lvr_land_a.csv", 25.0375, 121.5637, "Taipei"),
    city("新北市", "f_lvr_land_a.csv", 25.0120, 121.4657, "NewTaipei"),
    city("桃園市", "h_lvr_land_a.csv", 24.9936, 121.3010, "Taoyuan"),
    city("臺中市", "b_lvr_land_a.csv", 24.1477, 120.6736, "Taichung"),
    city("臺南市", "d_lvr_land_a.csv", 22.9999, 120.2270, "Tainan"),
    city("高雄市", "e_lvr_land_a.csv", 22.6273, 120.3014, "Kaohsiung"),
    city("基隆市", "c_lvr_land_a.csv", 25.1276, 121.7392, "Keelung"),
    city("新竹市", "o_lvr_land_a.csv", 24.8138, 120.9675, "Hsinchu"),
    city("嘉義市", "i_lvr_land_a.csv", 23.4801, 120.4491, "Chiayi"),
    city("新竹縣", "j_lvr_land_a.csv", 24.8387, 121.0177, "HsinchuCounty"),
    city("苗栗縣", "k_lvr_land_a.csv", 24.5602, 120.8214, "Miaoli"),
    city("彰化縣", "n_lvr_land_a.csv", 24.0518, 120.5161, "Changhua"),
    city("南投縣", "m_lvr_land_a.csv", 23.9610, 120.9719, "Nantou"),
    city("雲林縣", "p_lvr_land_a.csv", 23.7092, 120.4313, "Yunlin"),
    city("嘉義縣", "q_lvr_land_a.csv", 23.4518, 120.2555, "ChiayiCounty"),
    city("屏東縣", "t_lvr_land_a.csv", 22.5519, 120.5488, "Pingtung"),
    city("宜蘭縣", "g_lvr_land_a.csv", 24.7021, 121.7378, "Yilan"),
    city("花蓮縣", "u_lvr_land_a.csv", 23.9872, 121.6016, "Hualien"),
    city("臺東縣", "v_lvr_land_a.csv", 22.7583, 121.1444, "Taitung"),
    city("澎湖縣", "x_lvr_land_a.csv", 23.5711, 119.5793, "Penghu"),
    city("金門縣", "w_lvr_land_a.csv", 24.4493, 118.3767, "Kinmen"),
    city("連江縣", "z_lvr_land_a.csv", 26.1602, 119.9517, "Matsu"),
];

/// Lookup table over the static city list
#[derive(Debug, Clone, Copy)]
pub struct CityRegistry {
    cities: &'static [City],
}

impl CityRegistry {
    /// Registry of every supported city
    pub fn new() -> Self {
        Self { cities: CITIES }
    }

    /// Find a city by display name. "台" is accepted for "臺".
    pub fn lookup(&self, name: &str) -> Option<&'static City> {
        let name = name.trim();
        let canonical = name.replace('台', "臺");
        self.cities.iter().find(|c| c.name == canonical)
    }

    pub fn all(&self) -> &'static [City] {
        self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl Default for CityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_known_city() {
        let registry = CityRegistry::new();
        let taipei = registry.lookup("臺北市").unwrap();
        assert_eq!(taipei.dataset_file, "a_lvr_land_a.csv");
        assert_eq!(taipei.news_slug, "Taipei");
    }

    #[test]
    fn test_lookup_accepts_simplified_tai() {
        let registry = CityRegistry::new();
        let city = registry.lookup("台中市").unwrap();
        assert_eq!(city.name, "臺中市");
    }

    #[test]
    fn test_lookup_unknown_city() {
        let registry = CityRegistry::new();
        assert!(registry.lookup("東京都").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_registry_entries_are_unique_and_valid() {
        let registry = CityRegistry::new();
        let names: HashSet<_> = registry.all().iter().map(|c| c.name).collect();
        let files: HashSet<_> = registry.all().iter().map(|c| c.dataset_file).collect();
        assert_eq!(names.len(), registry.len());
        assert_eq!(files.len(), registry.len());
        assert!(registry.all().iter().all(|c| c.center.is_valid()));
    }
}
