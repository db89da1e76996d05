use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::{error::FeedResult, response::first_text_field};

/// Field holding the free-text advisory in the advisory response.
pub const ADVISORY_FIELD: &str = "datis";

/// A way an advisory can name a runway. The first capture group of the
/// pattern is the runway designator.
#[derive(Debug)]
pub struct RunwayRule {
    pub name: &'static str,
    pattern: Regex,
}

impl RunwayRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    /// Expects upper-cased advisory text.
    pub fn extract(&self, text: &str) -> Option<String> {
        self.pattern.captures(text).map(|c| c[1].to_string())
    }
}

/// Arrival rules in priority order. The first rule that matches decides the
/// runway; later rules are not consulted.
pub static ARRIVAL_RULES: LazyLock<[RunwayRule; 4]> = LazyLock::new(|| {
    [
        RunwayRule::new("landing abbreviated", r"LND\s+RW?Y\s+(\d+[LCR]?)"),
        RunwayRule::new("landing", r"LANDING\s+RW?Y\s+(\d+[LCR]?)"),
        RunwayRule::new(
            "ils approach in use",
            r"ILS\s+RW?Y\s+(\d+[LCR]?)\s+APCH\s+IN\s+USE",
        ),
        RunwayRule::new("approach in use", r"RW?Y\s+(\d+[LCR]?)\s+APCH\s+IN\s+USE"),
    ]
});

pub static DEPARTURE_RULE: LazyLock<RunwayRule> =
    LazyLock::new(|| RunwayRule::new("departure", r"(?:DEPART|DEP)\s+RW?Y\s+(\d+[LCR]?)"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveRunways {
    pub arrivals: Option<String>,
    pub departures: Option<String>,
}

impl ActiveRunways {
    pub fn from_advisory(advisory: &str) -> Self {
        let text = advisory.to_uppercase();
        Self {
            arrivals: find_arrivals_runway_in(&text),
            departures: DEPARTURE_RULE.extract(&text),
        }
    }

    /// Whether `monitored` is the runway arrivals are using.
    pub fn is_arriving_on(&self, monitored: &str) -> bool {
        self.arrivals
            .as_deref()
            .is_some_and(|arrivals| same_runway_number(arrivals, monitored))
    }
}

pub fn find_arrivals_runway(advisory: &str) -> Option<String> {
    find_arrivals_runway_in(&advisory.to_uppercase())
}

pub fn find_departures_runway(advisory: &str) -> Option<String> {
    DEPARTURE_RULE.extract(&advisory.to_uppercase())
}

fn find_arrivals_runway_in(text: &str) -> Option<String> {
    ARRIVAL_RULES.iter().find_map(|rule| {
        let runway = rule.extract(text)?;
        trace!(rule = rule.name, runway, "Arrival rule matched");
        Some(runway)
    })
}

/// Parses the advisory source's response body.
pub fn parse_advisory_response(body: &str) -> FeedResult<ActiveRunways> {
    let advisory = first_text_field(body, ADVISORY_FIELD)?;
    Ok(ActiveRunways::from_advisory(&advisory))
}

/// Drops a single trailing left/center/right letter.
pub fn strip_position_suffix(designator: &str) -> &str {
    designator
        .strip_suffix(['L', 'C', 'R'])
        .unwrap_or(designator)
}

/// Compares runway numbers ignoring the position letter, accepting both the
/// bare and the two digit form of `monitored` ("4" and "04").
pub fn same_runway_number(designator: &str, monitored: &str) -> bool {
    let number = strip_position_suffix(designator);
    let bare = strip_position_suffix(monitored).trim_start_matches('0');
    number == bare || number == format!("{bare:0>2}")
}
