//! Upstream sources for LaGuardia and its runway 04 approach corridor.

pub const AIRPORT_CODE: &str = "LGA";

pub const ADVISORY_URL: &str = "https://datis.clowd.io/api/KLGA";

pub const WEATHER_URL: &str = "https://aviationweather.gov/api/data/metar?ids=KLGA&format=json";

pub const FLIGHT_FEED_URL: &str = "https://data-cloud.flightradar24.com/zones/fcgi/feed.js";

/// North, south, west, east. Covers the visible part of the final approach
/// with about a mile of margin.
pub const CORRIDOR_BOUNDS: &str = "40.756132,40.686813,-73.961956,-73.887739";

pub const FLIGHT_FEED_QUERY: &str = "&faa=1&satellite=1&mlat=1&flarm=1&adsb=1&gnd=0&air=1&vehicles=0&estimated=0&maxage=14400&gliders=0&stats=0&ems=1&limit=1";

pub const FLIGHT_FEED_HEADERS: [(&str, &str); 3] = [
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:106.0) Gecko/20100101 Firefox/106.0",
    ),
    (
        "cache-control",
        "no-store, no-cache, must-revalidate, post-check=0, pre-check=0",
    ),
    ("accept", "application/json"),
];

pub fn flight_feed_url(base: &str, bounds: &str, query: &str) -> String {
    format!("{base}?bounds={bounds}{query}")
}
