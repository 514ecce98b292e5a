//! Static city table used for home-entry labels and search.

use crate::types::CityData;

/// Read-only lookup over known cities
pub trait CityLookup: Send + Sync {
    /// First city whose timezone equals `timezone` exactly
    fn find_by_timezone(&self, timezone: &str) -> Option<CityData>;

    /// Case-insensitive substring search over city, country and timezone
    fn search(&self, query: &str, limit: usize) -> Vec<CityData>;
}

// (city, country, timezone)
const BUILTIN_CITIES: &[(&str, &str, &str)] = &[
    ("Dhaka", "Bangladesh", "Asia/Dhaka"),
    ("Kolkata", "India", "Asia/Kolkata"),
    ("Mumbai", "India", "Asia/Kolkata"),
    ("Karachi", "Pakistan", "Asia/Karachi"),
    ("Kathmandu", "Nepal", "Asia/Kathmandu"),
    ("Dubai", "United Arab Emirates", "Asia/Dubai"),
    ("Riyadh", "Saudi Arabia", "Asia/Riyadh"),
    ("Tehran", "Iran", "Asia/Tehran"),
    ("Bangkok", "Thailand", "Asia/Bangkok"),
    ("Jakarta", "Indonesia", "Asia/Jakarta"),
    ("Singapore", "Singapore", "Asia/Singapore"),
    ("Kuala Lumpur", "Malaysia", "Asia/Kuala_Lumpur"),
    ("Manila", "Philippines", "Asia/Manila"),
    ("Hong Kong", "China", "Asia/Hong_Kong"),
    ("Shanghai", "China", "Asia/Shanghai"),
    ("Beijing", "China", "Asia/Shanghai"),
    ("Taipei", "Taiwan", "Asia/Taipei"),
    ("Seoul", "South Korea", "Asia/Seoul"),
    ("Tokyo", "Japan", "Asia/Tokyo"),
    ("Sydney", "Australia", "Australia/Sydney"),
    ("Melbourne", "Australia", "Australia/Melbourne"),
    ("Brisbane", "Australia", "Australia/Brisbane"),
    ("Perth", "Australia", "Australia/Perth"),
    ("Auckland", "New Zealand", "Pacific/Auckland"),
    ("Honolulu", "United States", "Pacific/Honolulu"),
    ("Anchorage", "United States", "America/Anchorage"),
    ("Los Angeles", "United States", "America/Los_Angeles"),
    ("San Francisco", "United States", "America/Los_Angeles"),
    ("Vancouver", "Canada", "America/Vancouver"),
    ("Denver", "United States", "America/Denver"),
    ("Phoenix", "United States", "America/Phoenix"),
    ("Chicago", "United States", "America/Chicago"),
    ("Mexico City", "Mexico", "America/Mexico_City"),
    ("New York", "United States", "America/New_York"),
    ("Toronto", "Canada", "America/Toronto"),
    ("Bogota", "Colombia", "America/Bogota"),
    ("Lima", "Peru", "America/Lima"),
    ("Santiago", "Chile", "America/Santiago"),
    ("Buenos Aires", "Argentina", "America/Argentina/Buenos_Aires"),
    ("Sao Paulo", "Brazil", "America/Sao_Paulo"),
    ("St. John's", "Canada", "America/St_Johns"),
    ("Reykjavik", "Iceland", "Atlantic/Reykjavik"),
    ("London", "United Kingdom", "Europe/London"),
    ("Dublin", "Ireland", "Europe/Dublin"),
    ("Lisbon", "Portugal", "Europe/Lisbon"),
    ("Madrid", "Spain", "Europe/Madrid"),
    ("Paris", "France", "Europe/Paris"),
    ("Amsterdam", "Netherlands", "Europe/Amsterdam"),
    ("Berlin", "Germany", "Europe/Berlin"),
    ("Zurich", "Switzerland", "Europe/Zurich"),
    ("Rome", "Italy", "Europe/Rome"),
    ("Stockholm", "Sweden", "Europe/Stockholm"),
    ("Warsaw", "Poland", "Europe/Warsaw"),
    ("Athens", "Greece", "Europe/Athens"),
    ("Istanbul", "Turkey", "Europe/Istanbul"),
    ("Kyiv", "Ukraine", "Europe/Kyiv"),
    ("Moscow", "Russia", "Europe/Moscow"),
    ("Cairo", "Egypt", "Africa/Cairo"),
    ("Lagos", "Nigeria", "Africa/Lagos"),
    ("Nairobi", "Kenya", "Africa/Nairobi"),
    ("Johannesburg", "South Africa", "Africa/Johannesburg"),
    ("UTC", "", "UTC"),
];

/// City table backed by an in-memory list
#[derive(Debug, Clone)]
pub struct StaticCityTable {
    cities: Vec<CityData>,
}

impl StaticCityTable {
    pub fn new(cities: Vec<CityData>) -> Self {
        Self { cities }
    }

    /// The table of major world cities shipped with the crate
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_CITIES
                .iter()
                .map(|(city, country, tz)| CityData::new(*city, *country, *tz))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CityData> {
        self.cities.iter()
    }
}

impl Default for StaticCityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CityLookup for StaticCityTable {
    fn find_by_timezone(&self, timezone: &str) -> Option<CityData> {
        self.cities.iter().find(|c| c.timezone == timezone).cloned()
    }

    fn search(&self, query: &str, limit: usize) -> Vec<CityData> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.cities.iter().take(limit).cloned().collect();
        }

        // Exact city-name matches first, then everything else in table order
        let (mut exact, rest): (Vec<_>, Vec<_>) = self
            .cities
            .iter()
            .filter(|c| {
                c.city.to_lowercase().contains(&needle)
                    || c.country.to_lowercase().contains(&needle)
                    || c.timezone.to_lowercase().contains(&needle)
            })
            .partition(|c| c.city.to_lowercase() == needle);

        exact.extend(rest);
        exact.into_iter().take(limit).cloned().collect()
    }
}

/// Display label for a timezone with no table entry
///
/// `America/Argentina/Buenos_Aires` becomes `Buenos Aires`.
pub fn fallback_city_label(timezone: &str) -> String {
    match timezone.rsplit('/').next() {
        Some(last) if !last.is_empty() => last.replace('_', " "),
        _ => "Unknown Location".to_string(),
    }
}
