use approach_feeds::runway::{ActiveRunways, parse_advisory_response};
use jiff::{SignedDuration, Timestamp};
use tracing::{debug, info, trace, warn};

use crate::{error::ApplicationResult, source::FeedSource};

/// Active runways as read from one advisory. A refresh replaces the whole
/// status; it is never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunwayStatus {
    arrivals_runway: Option<String>,
    departures_runway: Option<String>,
    monitored_runway_active: bool,
    last_updated: Timestamp,
}

impl RunwayStatus {
    pub fn new(runways: ActiveRunways, monitored_runway: &str, last_updated: Timestamp) -> Self {
        Self {
            monitored_runway_active: runways.is_arriving_on(monitored_runway),
            arrivals_runway: runways.arrivals,
            departures_runway: runways.departures,
            last_updated,
        }
    }

    /// Used when the advisory has never been read successfully.
    pub fn unknown(now: Timestamp) -> Self {
        Self::new(ActiveRunways::default(), "", now)
    }

    pub fn arrivals_runway(&self) -> Option<&str> {
        self.arrivals_runway.as_deref()
    }

    pub fn departures_runway(&self) -> Option<&str> {
        self.departures_runway.as_deref()
    }

    /// Arrivals are landing on the monitored runway.
    pub fn monitored_runway_active(&self) -> bool {
        self.monitored_runway_active
    }

    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    /// Same runways in use, whenever they were read.
    pub fn same_runways(&self, other: &Self) -> bool {
        self.arrivals_runway == other.arrivals_runway
            && self.departures_runway == other.departures_runway
    }
}

/// Whether something fetched at `fetched` is younger than `ttl`. A fetch time
/// in the future means the clock went backwards; that counts as stale.
pub(crate) fn is_fresh(fetched: Timestamp, now: Timestamp, ttl: SignedDuration) -> bool {
    let age = now.duration_since(fetched);
    !age.is_negative() && age < ttl
}

pub(crate) struct RunwayMonitor<S> {
    source: S,
    monitored_runway: String,
    ttl: SignedDuration,
    cached: Option<RunwayStatus>,
}

impl<S: FeedSource> RunwayMonitor<S> {
    pub fn new(source: S, monitored_runway: impl Into<String>, ttl: SignedDuration) -> Self {
        Self {
            source,
            monitored_runway: monitored_runway.into(),
            ttl,
            cached: None,
        }
    }

    /// The cached status while it is younger than the TTL, otherwise a fresh
    /// one. A failed refresh falls back to the cache, and to
    /// [`RunwayStatus::unknown`] when nothing was cached yet.
    pub async fn check(&mut self, force_refresh: bool, now: Timestamp) -> RunwayStatus {
        if !force_refresh
            && let Some(cached) = &self.cached
            && is_fresh(cached.last_updated, now, self.ttl)
        {
            trace!(arrivals = ?cached.arrivals_runway, "Runway status cache hit");
            return cached.clone();
        }
        debug!(force_refresh, "Refreshing runway status");

        match self.fetch_status(now).await {
            Ok(status) => {
                let changed = self
                    .cached
                    .as_ref()
                    .is_none_or(|previous| !previous.same_runways(&status));
                if changed {
                    info!(
                        arrivals = ?status.arrivals_runway,
                        departures = ?status.departures_runway,
                        monitored_runway = %self.monitored_runway,
                        active = status.monitored_runway_active,
                        "Runways in use updated"
                    );
                }
                self.cached = Some(status.clone());
                status
            }
            Err(e) => match &self.cached {
                Some(cached) => {
                    warn!(
                        error = %e,
                        since = %cached.last_updated,
                        "Runway advisory unavailable, keeping last status"
                    );
                    cached.clone()
                }
                None => {
                    warn!(error = %e, "Runway advisory unavailable and nothing cached");
                    RunwayStatus::unknown(now)
                }
            },
        }
    }

    async fn fetch_status(&self, now: Timestamp) -> ApplicationResult<RunwayStatus> {
        let body = self.source.fetch().await?;
        let runways = parse_advisory_response(&body)?;
        if runways.arrivals.is_none() {
            debug!("No arrival rule matched the advisory");
        }
        Ok(RunwayStatus::new(runways, &self.monitored_runway, now))
    }
}
