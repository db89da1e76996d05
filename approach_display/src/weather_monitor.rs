use approach_feeds::weather::{WEATHER_UNAVAILABLE, parse_weather_response, wind_summary};
use jiff::{SignedDuration, Timestamp};
use tracing::{debug, trace, warn};

use crate::{
    error::ApplicationResult,
    runway_monitor::{RunwayStatus, is_fresh},
    source::FeedSource,
};

/// Latest weather report together with the runways in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WeatherSnapshot {
    pub raw_report: String,
    pub arrivals_runway: Option<String>,
    pub departures_runway: Option<String>,
    /// When the report was fetched.
    pub last_updated: Timestamp,
}

impl WeatherSnapshot {
    pub fn wind(&self) -> String {
        wind_summary(&self.raw_report)
    }

    pub fn same_content(&self, other: &Self) -> bool {
        self.raw_report == other.raw_report
            && self.arrivals_runway == other.arrivals_runway
            && self.departures_runway == other.departures_runway
    }
}

#[derive(Debug, Clone)]
struct Report {
    raw: String,
    fetched: Timestamp,
}

/// Caches the weather report only. Runways come from the caller on every call
/// so they are never older than the runway monitor's own cache.
pub(crate) struct WeatherMonitor<S> {
    source: S,
    ttl: SignedDuration,
    cached: Option<Report>,
}

impl<S: FeedSource> WeatherMonitor<S> {
    pub fn new(source: S, ttl: SignedDuration) -> Self {
        Self {
            source,
            ttl,
            cached: None,
        }
    }

    pub async fn get(
        &mut self,
        force_refresh: bool,
        runways: &RunwayStatus,
        now: Timestamp,
    ) -> WeatherSnapshot {
        let report = self.report(force_refresh, now).await;
        WeatherSnapshot {
            raw_report: report.raw,
            arrivals_runway: runways.arrivals_runway().map(str::to_owned),
            departures_runway: runways.departures_runway().map(str::to_owned),
            last_updated: report.fetched,
        }
    }

    async fn report(&mut self, force_refresh: bool, now: Timestamp) -> Report {
        if !force_refresh
            && let Some(cached) = &self.cached
            && is_fresh(cached.fetched, now, self.ttl)
        {
            trace!("Weather report cache hit");
            return cached.clone();
        }
        debug!(force_refresh, "Refreshing weather report");

        match self.fetch_report(now).await {
            Ok(report) => {
                debug!(report = %report.raw, "Weather report updated");
                self.cached = Some(report.clone());
                report
            }
            Err(e) => match &self.cached {
                Some(cached) => {
                    warn!(
                        error = %e,
                        since = %cached.fetched,
                        "Weather report unavailable, keeping last report"
                    );
                    cached.clone()
                }
                None => {
                    warn!(error = %e, "Weather report unavailable and nothing cached");
                    Report {
                        raw: WEATHER_UNAVAILABLE.to_string(),
                        fetched: now,
                    }
                }
            },
        }
    }

    async fn fetch_report(&self, now: Timestamp) -> ApplicationResult<Report> {
        let body = self.source.fetch().await?;
        Ok(Report {
            raw: parse_weather_response(&body)?,
            fetched: now,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use approach_feeds::runway::ActiveRunways;

    use super::*;
    use crate::{
        runway_monitor::tests::{secs, t0},
        source::tests::ScriptedSource,
    };

    pub(crate) const METAR: &str =
        "KLGA 160151Z 18006KT 10SM FEW050 SCT250 27/22 A3004 RMK AO2 SLP173 T02670217";

    pub(crate) fn weather_body(report: &str) -> String {
        serde_json::json!([{ "icaoId": "KLGA", "rawOb": report }]).to_string()
    }

    fn runways(advisory: &str) -> RunwayStatus {
        RunwayStatus::new(ActiveRunways::from_advisory(advisory), "04", t0())
    }

    fn monitor(source: &ScriptedSource) -> WeatherMonitor<ScriptedSource> {
        WeatherMonitor::new(source.clone(), secs(300))
    }

    #[tokio::test]
    async fn test_snapshot_combines_report_and_runways() {
        let source = ScriptedSource::ok(weather_body(METAR));
        let snapshot = monitor(&source)
            .get(false, &runways("LND RY 22 DEP RY 13"), t0())
            .await;
        assert_eq!(
            snapshot,
            WeatherSnapshot {
                raw_report: METAR.to_string(),
                arrivals_runway: Some("22".to_string()),
                departures_runway: Some("13".to_string()),
                last_updated: t0(),
            }
        );
        assert_eq!(snapshot.wind(), "180@6kt");
    }

    #[tokio::test]
    async fn test_report_cached_for_ttl() {
        let source = ScriptedSource::ok(weather_body(METAR));
        let mut monitor = monitor(&source);
        let status = runways("LND RY 22");
        monitor.get(false, &status, t0()).await;
        monitor.get(false, &status, t0() + secs(299)).await;
        assert_eq!(source.calls(), 1);
        monitor.get(false, &status, t0() + secs(300)).await;
        assert_eq!(source.calls(), 2);
        monitor.get(true, &status, t0() + secs(301)).await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_clock_going_backwards_refetches_report() {
        let source = ScriptedSource::ok(weather_body(METAR));
        let mut monitor = monitor(&source);
        let status = runways("LND RY 22");
        monitor.get(false, &status, t0()).await;
        let snapshot = monitor.get(false, &status, t0() - secs(3600)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(snapshot.last_updated, t0() - secs(3600));
    }

    #[tokio::test]
    async fn test_runways_are_not_cached_with_report() {
        let source = ScriptedSource::ok(weather_body(METAR));
        let mut monitor = monitor(&source);
        monitor.get(false, &runways("LND RY 22"), t0()).await;
        let snapshot = monitor
            .get(false, &runways("LND RY 31"), t0() + secs(10))
            .await;
        assert_eq!(snapshot.arrivals_runway.as_deref(), Some("31"));
        assert_eq!(snapshot.last_updated, t0());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_report() {
        let source = ScriptedSource::new([Some(weather_body(METAR)), None]);
        let mut monitor = monitor(&source);
        let status = runways("LND RY 22");
        let first = monitor.get(false, &status, t0()).await;
        let second = monitor.get(true, &status, t0() + secs(400)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_unavailable() {
        let source = ScriptedSource::new([Some("not json".to_string())]);
        let mut monitor = monitor(&source);
        let snapshot = monitor.get(false, &runways("LND RY 22"), t0()).await;
        assert_eq!(snapshot.raw_report, "Weather unavailable");
        assert_eq!(snapshot.last_updated, t0());
        assert_eq!(snapshot.arrivals_runway.as_deref(), Some("22"));
        assert_eq!(snapshot.wind(), "Wind unavailable");
    }
}
