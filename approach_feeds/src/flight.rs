use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{FeedError, FeedResult};

/// Keys of the live feed that carry metadata instead of a flight.
pub const METADATA_KEYS: [&str; 2] = ["version", "full_count"];

/// A positional record shorter than this is not a flight.
pub const MIN_RECORD_FIELDS: usize = 13;

const ALTITUDE: usize = 4;
const SPEED: usize = 5;
const AIRCRAFT_TYPE: usize = 8;
const ORIGIN: usize = 11;
const DESTINATION: usize = 12;
const FLIGHT_NUMBER: usize = 13;
const CALLSIGN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightRecord {
    pub id: String,
    pub callsign: String,
    pub aircraft_type: String,
    pub altitude_ft: i64,
    pub speed_kt: i64,
    pub origin: String,
    pub destination: String,
}

impl FlightRecord {
    pub fn from_fields(id: &str, fields: &[Value], default_destination: &str) -> FeedResult<Self> {
        if fields.len() < MIN_RECORD_FIELDS {
            return Err(FeedError::RecordTooShort { len: fields.len() });
        }
        Ok(Self {
            id: id.to_string(),
            callsign: text_at(fields, CALLSIGN)
                .or_else(|| text_at(fields, FLIGHT_NUMBER))
                .unwrap_or("Unknown")
                .to_string(),
            aircraft_type: text_at(fields, AIRCRAFT_TYPE).unwrap_or("Unknown").to_string(),
            altitude_ft: number_at(fields, ALTITUDE)?,
            speed_kt: number_at(fields, SPEED)?,
            origin: text_at(fields, ORIGIN).unwrap_or("???").to_string(),
            destination: text_at(fields, DESTINATION)
                .unwrap_or(default_destination)
                .to_string(),
        })
    }

    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}

fn text_at(fields: &[Value], index: usize) -> Option<&str> {
    fields
        .get(index)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn number_at(fields: &[Value], index: usize) -> FeedResult<i64> {
    fields
        .get(index)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
        .ok_or(FeedError::NotANumber { index })
}

/// One response of the live flight-position feed, in the order the upstream
/// source sent it.
#[derive(Debug, Clone, Default)]
pub struct FlightFeed {
    entries: IndexMap<String, Value>,
}

impl FromStr for FlightFeed {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            entries: serde_json::from_str(s)?,
        })
    }
}

impl FlightFeed {
    /// Positional records in feed order. Metadata keys and scalar values are
    /// left out.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries
            .iter()
            .filter(|(id, _)| !METADATA_KEYS.contains(&id.as_str()))
            .filter_map(|(id, value)| match value {
                Value::Array(fields) => Some((id.as_str(), fields.as_slice())),
                _ => None,
            })
    }

    /// The first record flying below `max_altitude_ft`. Selection is by feed
    /// order only, not by distance or altitude.
    pub fn first_below(
        &self,
        max_altitude_ft: i64,
        default_destination: &str,
    ) -> Option<FlightRecord> {
        self.candidates().find_map(|(id, fields)| {
            match FlightRecord::from_fields(id, fields, default_destination) {
                Ok(record) if record.altitude_ft < max_altitude_ft => Some(record),
                Ok(record) => {
                    debug!(id, altitude = record.altitude_ft, "Flight above approach altitude");
                    None
                }
                Err(e) => {
                    debug!(id, error = %e, "Skipping malformed flight record");
                    None
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.candidates().count()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates().next().is_none()
    }
}
