use std::sync::LazyLock;

use regex::Regex;

use crate::{error::FeedResult, response::first_text_field};

/// Field holding the raw observation in the weather response.
pub const REPORT_FIELD: &str = "rawOb";

pub const WEATHER_UNAVAILABLE: &str = "Weather unavailable";

pub fn parse_weather_response(body: &str) -> FeedResult<String> {
    first_text_field(body, REPORT_FIELD)
}

/// Short wind text for the first `dddss(s)KT` group of a report, e.g.
/// `18006KT` becomes `180@6kt`.
pub fn wind_summary(report: &str) -> String {
    static WIND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{3})(\d{2,3})KT").unwrap());

    if report.is_empty() {
        return "No wind data".to_string();
    }
    match WIND.captures(report) {
        Some(c) => {
            let speed = c[2].trim_start_matches('0');
            format!("{}@{}kt", &c[1], if speed.is_empty() { "0" } else { speed })
        }
        None => "Wind unavailable".to_string(),
    }
}
