use std::io::Write;

use approach_feeds::flight::FlightRecord;
use tracing::trace;

use crate::{
    error::ApplicationResult, runway_monitor::RunwayStatus, selector::DisplayIntent,
    weather_monitor::WeatherSnapshot,
};

/// The display side. Gets one call per redraw and a liveness signal while the
/// loop sleeps.
pub(crate) trait Renderer {
    fn show_flight(&mut self, record: &FlightRecord) -> ApplicationResult<()>;
    fn show_no_flights(&mut self, runways: &RunwayStatus) -> ApplicationResult<()>;
    fn show_weather(&mut self, snapshot: &WeatherSnapshot) -> ApplicationResult<()>;
    fn clear(&mut self) -> ApplicationResult<()>;
    fn feed_liveness(&mut self);
}

/// Replaces whatever is on the display with `intent`.
pub(crate) fn draw<R: Renderer + ?Sized>(
    renderer: &mut R,
    intent: &DisplayIntent,
) -> ApplicationResult<()> {
    renderer.clear()?;
    match intent {
        DisplayIntent::Flight(record) => renderer.show_flight(record),
        DisplayIntent::NoFlights(runways) => renderer.show_no_flights(runways),
        DisplayIntent::Weather(snapshot) => renderer.show_weather(snapshot),
    }
}

const RULE: &str = "========================================";

/// Prints each screen as a text block. Used when no display hardware is
/// attached; there is no watchdog to feed.
pub(crate) struct ConsoleRenderer<W> {
    out: W,
    monitored_runway: String,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W, monitored_runway: impl Into<String>) -> Self {
        Self {
            out,
            monitored_runway: monitored_runway.into(),
        }
    }
}

impl<W: Write> Renderer for ConsoleRenderer<W> {
    fn show_flight(&mut self, record: &FlightRecord) -> ApplicationResult<()> {
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "FLIGHT DISPLAY")?;
        writeln!(self.out, "Callsign: {}", record.callsign)?;
        writeln!(
            self.out,
            "Aircraft: {} at {} feet, {} knots",
            record.aircraft_type, record.altitude_ft, record.speed_kt
        )?;
        writeln!(self.out, "Route: {}", record.route())?;
        writeln!(self.out, "{RULE}")?;
        Ok(self.out.flush()?)
    }

    fn show_no_flights(&mut self, _runways: &RunwayStatus) -> ApplicationResult<()> {
        writeln!(
            self.out,
            "RWY{} Active - No Approach Traffic",
            self.monitored_runway
        )?;
        Ok(self.out.flush()?)
    }

    fn show_weather(&mut self, snapshot: &WeatherSnapshot) -> ApplicationResult<()> {
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "WEATHER DISPLAY")?;
        writeln!(
            self.out,
            "Arrivals: RWY{}",
            snapshot.arrivals_runway.as_deref().unwrap_or("Unknown")
        )?;
        writeln!(
            self.out,
            "Departures: RWY{}",
            snapshot.departures_runway.as_deref().unwrap_or("Unknown")
        )?;
        writeln!(self.out, "Wind: {}", snapshot.wind())?;
        writeln!(self.out, "METAR: {}", snapshot.raw_report)?;
        writeln!(
            self.out,
            "Fetched: {}",
            snapshot.last_updated.strftime("%Y-%m-%d %H:%MZ")
        )?;
        writeln!(self.out, "{RULE}")?;
        Ok(self.out.flush()?)
    }

    fn clear(&mut self) -> ApplicationResult<()> {
        writeln!(self.out)?;
        Ok(self.out.flush()?)
    }

    fn feed_liveness(&mut self) {
        trace!("Liveness signal");
    }
}
