use std::{fs::File, path::Path, time::Duration};

use approach_feeds::{
    endpoints::{
        ADVISORY_URL, AIRPORT_CODE, CORRIDOR_BOUNDS, FLIGHT_FEED_HEADERS, FLIGHT_FEED_QUERY,
        FLIGHT_FEED_URL, WEATHER_URL, flight_feed_url,
    },
    flight::FlightFeed,
    response::first_text_field,
    runway::{ADVISORY_FIELD, ActiveRunways},
    weather::{parse_weather_response, wind_summary},
};
use futures::future::join3;
use indexmap::IndexSet;
use tracing::{info, warn};
use tracing_unwrap::ResultExt;

const MAX_APPROACH_ALTITUDE_FT: i64 = 5000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn get_text(request: reqwest::RequestBuilder) -> reqwest::Result<String> {
    request.send().await?.error_for_status()?.text().await
}

type FeedBodies = (
    reqwest::Result<String>,
    reqwest::Result<String>,
    reqwest::Result<String>,
);

/// Each source is fetched on its own so one failing feed does not hide the
/// others.
async fn get_feeds(client: &reqwest::Client) -> FeedBodies {
    let mut feed = client.get(flight_feed_url(
        FLIGHT_FEED_URL,
        CORRIDOR_BOUNDS,
        FLIGHT_FEED_QUERY,
    ));
    for (name, value) in FLIGHT_FEED_HEADERS {
        feed = feed.header(name, value);
    }
    join3(
        get_text(client.get(ADVISORY_URL)),
        get_text(client.get(WEATHER_URL)),
        get_text(feed),
    )
    .await
}

fn get_unmatched_advisories(path: &Path) -> IndexSet<String> {
    File::open(path)
        .ok()
        .and_then(|rdr| serde_json::from_reader(rdr).ok())
        .unwrap_or_default()
}

fn write_unmatched_advisories(path: &Path, unmatched: &IndexSet<String>) {
    let written = File::create(path)
        .map_err(serde_json::Error::io)
        .and_then(|file| serde_json::to_writer_pretty(file, unmatched));
    if let Err(e) = written {
        warn!(error = %e, path = %path.display(), "Could not write unmatched advisories");
    }
}

/// Re-tests every advisory recorded so far together with the current one and
/// keeps those where no arrival rule matches.
fn record_unmatched_advisories(advisory: Option<String>, path: &Path) {
    let mut unmatched = IndexSet::new();
    let mut to_test = get_unmatched_advisories(path);
    to_test.extend(advisory);
    for text in to_test {
        if text.trim().is_empty() {
            continue;
        }
        if ActiveRunways::from_advisory(&text).arrivals.is_none() {
            unmatched.insert(text);
        }
    }
    info!(count = unmatched.len(), path = %path.display(), "Unmatched advisories");
    write_unmatched_advisories(path, &unmatched);
}

fn read_advisory(body: reqwest::Result<String>) -> Option<String> {
    let body = body
        .inspect_err(|e| warn!(error = %e, "Advisory unavailable"))
        .ok()?;
    match first_text_field(&body, ADVISORY_FIELD) {
        Ok(text) => {
            let runways = ActiveRunways::from_advisory(&text);
            println!(
                "{AIRPORT_CODE} arrivals: {:?}, departures: {:?}",
                runways.arrivals, runways.departures
            );
            Some(text)
        }
        Err(e) => {
            warn!(error = %e, "Advisory response unreadable");
            None
        }
    }
}

fn print_weather(body: reqwest::Result<String>) {
    let Ok(body) = body.inspect_err(|e| warn!(error = %e, "Weather unavailable")) else {
        return;
    };
    match parse_weather_response(&body) {
        Ok(report) => println!("{report}\nWind: {}", wind_summary(&report)),
        Err(e) => warn!(error = %e, "Weather response unreadable"),
    }
}

fn print_first_flight(body: reqwest::Result<String>) {
    let Ok(body) = body.inspect_err(|e| warn!(error = %e, "Flight feed unavailable")) else {
        return;
    };
    match body.parse::<FlightFeed>() {
        Ok(feed) => match feed.first_below(MAX_APPROACH_ALTITUDE_FT, AIRPORT_CODE) {
            Some(flight) => println!(
                "{} {} at {} feet, {}",
                flight.callsign,
                flight.aircraft_type,
                flight.altitude_ft,
                flight.route()
            ),
            None => println!("No approach traffic among {} flights", feed.len()),
        },
        Err(e) => warn!(error = %e, "Flight feed unreadable"),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let client = reqwest::Client::builder()
        .connect_timeout(REQUEST_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_log();
    let (advisory_body, weather_body, feed_body) = get_feeds(&client).await;

    let advisory = read_advisory(advisory_body);
    print_weather(weather_body);
    print_first_flight(feed_body);
    record_unmatched_advisories(advisory, Path::new("unmatched_advisories.json"));
}
