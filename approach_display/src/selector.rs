use approach_feeds::flight::FlightRecord;
use jiff::Timestamp;
use tracing::debug;

use crate::{
    flight_finder::FlightFinder,
    runway_monitor::{RunwayMonitor, RunwayStatus},
    source::FeedSource,
    weather_monitor::{WeatherMonitor, WeatherSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DisplayState {
    Flight,
    NoFlights,
    Weather,
}

/// What the display should show for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DisplayIntent {
    Flight(FlightRecord),
    NoFlights(RunwayStatus),
    Weather(WeatherSnapshot),
}

impl DisplayIntent {
    pub fn state(&self) -> DisplayState {
        match self {
            Self::Flight(_) => DisplayState::Flight,
            Self::NoFlights(_) => DisplayState::NoFlights,
            Self::Weather(_) => DisplayState::Weather,
        }
    }

    /// Whether `self` shows the same thing as `previous`. Flights are compared
    /// by id only, so a flight moving along the approach is not redrawn.
    fn shows_same_as(&self, previous: &Self) -> bool {
        match (previous, self) {
            (Self::Flight(a), Self::Flight(b)) => a.id == b.id,
            (Self::NoFlights(a), Self::NoFlights(b)) => a.same_runways(b),
            (Self::Weather(a), Self::Weather(b)) => a.same_content(b),
            _ => false,
        }
    }
}

pub(crate) struct DisplaySelector<A, W, F> {
    runways: RunwayMonitor<A>,
    weather: WeatherMonitor<W>,
    flights: FlightFinder<F>,
}

impl<A, W, F> DisplaySelector<A, W, F>
where
    A: FeedSource,
    W: FeedSource,
    F: FeedSource,
{
    pub fn new(
        runways: RunwayMonitor<A>,
        weather: WeatherMonitor<W>,
        flights: FlightFinder<F>,
    ) -> Self {
        Self {
            runways,
            weather,
            flights,
        }
    }

    pub async fn refresh_runways(&mut self, now: Timestamp) -> RunwayStatus {
        self.runways.check(true, now).await
    }

    /// Traffic is only looked for while arrivals use the monitored runway;
    /// otherwise the weather is shown and the flight feed is not queried.
    pub async fn select(&mut self, now: Timestamp) -> DisplayIntent {
        let runways = self.runways.check(false, now).await;
        if runways.monitored_runway_active() {
            match self.flights.find().await {
                Some(flight) => DisplayIntent::Flight(flight),
                None => DisplayIntent::NoFlights(runways),
            }
        } else {
            DisplayIntent::Weather(self.weather.get(false, &runways, now).await)
        }
    }
}

/// Remembers what was last drawn so an unchanged intent is not drawn again.
#[derive(Debug, Default)]
pub(crate) struct RedrawFilter {
    shown: Option<DisplayIntent>,
}

impl RedrawFilter {
    pub fn shown_state(&self) -> Option<DisplayState> {
        self.shown.as_ref().map(DisplayIntent::state)
    }

    /// Records `intent` as shown and tells whether it needs drawing.
    pub fn needs_redraw(&mut self, intent: &DisplayIntent) -> bool {
        let unchanged = self
            .shown
            .as_ref()
            .is_some_and(|shown| intent.shows_same_as(shown));
        if unchanged {
            debug!(state = ?intent.state(), "Display unchanged");
        }
        self.shown = Some(intent.clone());
        !unchanged
    }

    /// Forget what is on the display, e.g. after it was cleared.
    pub fn reset(&mut self) {
        self.shown = None;
    }
}

#[cfg(test)]
mod tests {
    use approach_feeds::runway::ActiveRunways;

    use super::*;
    use crate::{
        flight_finder::tests::{feed_body, flight_fields},
        runway_monitor::tests::{advisory_body, secs, t0},
        source::tests::ScriptedSource,
        weather_monitor::tests::{METAR, weather_body},
    };

    struct Sources {
        advisory: ScriptedSource,
        weather: ScriptedSource,
        feed: ScriptedSource,
    }

    fn selector(
        sources: &Sources,
    ) -> DisplaySelector<ScriptedSource, ScriptedSource, ScriptedSource> {
        DisplaySelector::new(
            RunwayMonitor::new(sources.advisory.clone(), "04", secs(900)),
            WeatherMonitor::new(sources.weather.clone(), secs(300)),
            FlightFinder::new(sources.feed.clone(), 5000, "LGA"),
        )
    }

    fn sources(advisory: &str, flights: &[(&str, serde_json::Value)]) -> Sources {
        Sources {
            advisory: ScriptedSource::ok(advisory_body(advisory)),
            weather: ScriptedSource::ok(weather_body(METAR)),
            feed: ScriptedSource::ok(feed_body(flights)),
        }
    }

    fn flight(id: &str) -> DisplayIntent {
        let fields = flight_fields(3000, "JBU1922");
        DisplayIntent::Flight(
            FlightRecord::from_fields(id, fields.as_array().unwrap(), "LGA").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_runway_04_with_traffic_selects_flight() {
        let sources = sources(
            "LGA ATIS INFO K. ILS RY 04 APCH IN USE LND RY 04. DEPART RY 13.",
            &[("3b2a1002", flight_fields(3500, "JBU1922"))],
        );
        let intent = selector(&sources).select(t0()).await;
        let DisplayIntent::Flight(record) = intent else {
            panic!("expected a flight, got {intent:?}");
        };
        assert_eq!(record.id, "3b2a1002");
        assert_eq!(record.altitude_ft, 3500);
        assert_eq!(sources.weather.calls(), 0);
    }

    #[tokio::test]
    async fn test_other_runway_selects_weather() {
        let sources = sources("LND RY 22", &[("3b2a1002", flight_fields(3500, "JBU1922"))]);
        let intent = selector(&sources).select(t0()).await;
        let DisplayIntent::Weather(snapshot) = intent else {
            panic!("expected weather, got {intent:?}");
        };
        assert_eq!(snapshot.arrivals_runway.as_deref(), Some("22"));
        assert_eq!(snapshot.raw_report, METAR);
        assert_eq!(sources.feed.calls(), 0);
    }

    #[tokio::test]
    async fn test_runway_04_without_low_traffic_selects_no_flights() {
        let sources = sources("LND RY 04", &[("3b2a1001", flight_fields(8000, "DAL1420"))]);
        let intent = selector(&sources).select(t0()).await;
        let DisplayIntent::NoFlights(status) = intent else {
            panic!("expected no flights, got {intent:?}");
        };
        assert_eq!(status.arrivals_runway(), Some("04"));
        assert!(status.monitored_runway_active());
    }

    #[tokio::test]
    async fn test_unknown_runways_select_weather() {
        let sources = Sources {
            advisory: ScriptedSource::failing(),
            weather: ScriptedSource::failing(),
            feed: ScriptedSource::failing(),
        };
        let intent = selector(&sources).select(t0()).await;
        let DisplayIntent::Weather(snapshot) = intent else {
            panic!("expected weather, got {intent:?}");
        };
        assert_eq!(snapshot.raw_report, "Weather unavailable");
        assert_eq!(snapshot.arrivals_runway, None);
    }

    #[test]
    fn test_same_flight_is_not_redrawn() {
        let mut filter = RedrawFilter::default();
        assert!(filter.needs_redraw(&flight("3b2a1002")));
        assert!(!filter.needs_redraw(&flight("3b2a1002")));
        assert!(!filter.needs_redraw(&flight("3b2a1002")));
        assert!(filter.needs_redraw(&flight("3b2a1003")));
        assert_eq!(filter.shown_state(), Some(DisplayState::Flight));
    }

    #[test]
    fn test_state_change_is_redrawn() {
        let status = RunwayStatus::new(ActiveRunways::from_advisory("LND RY 04"), "04", t0());
        let mut filter = RedrawFilter::default();
        assert!(filter.needs_redraw(&flight("3b2a1002")));
        assert!(filter.needs_redraw(&DisplayIntent::NoFlights(status.clone())));
        assert!(filter.needs_redraw(&flight("3b2a1002")));
        filter.reset();
        assert_eq!(filter.shown_state(), None);
        assert!(filter.needs_redraw(&flight("3b2a1002")));
    }

    #[test]
    fn test_unchanged_no_flights_is_not_redrawn() {
        let first = RunwayStatus::new(ActiveRunways::from_advisory("LND RY 04"), "04", t0());
        let later = RunwayStatus::new(
            ActiveRunways::from_advisory("LND RY 04"),
            "04",
            t0() + secs(900),
        );
        let mut filter = RedrawFilter::default();
        assert!(filter.needs_redraw(&DisplayIntent::NoFlights(first)));
        assert!(!filter.needs_redraw(&DisplayIntent::NoFlights(later)));
    }

    #[test]
    fn test_new_weather_report_is_redrawn() {
        let snapshot = WeatherSnapshot {
            raw_report: METAR.to_string(),
            arrivals_runway: Some("22".to_string()),
            departures_runway: Some("13".to_string()),
            last_updated: t0(),
        };
        let refetched = WeatherSnapshot {
            last_updated: t0() + secs(300),
            ..snapshot.clone()
        };
        let updated = WeatherSnapshot {
            raw_report: "KLGA 160251Z 20008KT 10SM FEW050 27/21 A3003".to_string(),
            ..refetched.clone()
        };
        let mut filter = RedrawFilter::default();
        assert!(filter.needs_redraw(&DisplayIntent::Weather(snapshot)));
        assert!(!filter.needs_redraw(&DisplayIntent::Weather(refetched)));
        assert!(filter.needs_redraw(&DisplayIntent::Weather(updated)));
    }
}
