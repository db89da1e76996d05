use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use tracing::{debug, error, info};

use crate::{
    config::PortalConfig,
    error::ApplicationResult,
    render::{Renderer, draw},
    runway_monitor::is_fresh,
    selector::{DisplaySelector, DisplayState, RedrawFilter},
    source::FeedSource,
};

#[derive(Debug, Clone, Copy)]
pub(crate) struct PollTiming {
    /// How often the runway advisory is re-read regardless of its cache.
    pub runway_check: SignedDuration,
    pub flight_poll: Duration,
    pub inactive_poll: Duration,
    pub error_backoff: Duration,
    pub liveness_slice: Duration,
}

impl PollTiming {
    pub fn from_config(config: &PortalConfig) -> Self {
        Self {
            runway_check: config.runway_ttl(),
            flight_poll: config.flight_poll_interval(),
            inactive_poll: config.inactive_poll_interval(),
            error_backoff: config.error_backoff(),
            liveness_slice: config.liveness_slice(),
        }
    }

    pub fn pause_after(&self, state: DisplayState) -> Duration {
        match state {
            DisplayState::Flight | DisplayState::NoFlights => self.flight_poll,
            DisplayState::Weather => self.inactive_poll,
        }
    }
}

/// Sleeps for `total`, signalling liveness before every slice of at most
/// `slice`.
pub(crate) async fn sleep_with_liveness<R: Renderer + ?Sized>(
    renderer: &mut R,
    total: Duration,
    slice: Duration,
) {
    let mut remaining = total;
    while !remaining.is_zero() {
        renderer.feed_liveness();
        let step = remaining.min(slice);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
}

pub(crate) struct PollLoop<A, W, F, R> {
    selector: DisplaySelector<A, W, F>,
    renderer: R,
    redraw: RedrawFilter,
    timing: PollTiming,
    last_runway_check: Option<Timestamp>,
}

impl<A, W, F, R> PollLoop<A, W, F, R>
where
    A: FeedSource,
    W: FeedSource,
    F: FeedSource,
    R: Renderer,
{
    pub fn new(selector: DisplaySelector<A, W, F>, renderer: R, timing: PollTiming) -> Self {
        Self {
            selector,
            renderer,
            redraw: RedrawFilter::default(),
            timing,
            last_runway_check: None,
        }
    }

    /// One pass: maybe re-read the runways, pick what to show and draw it if
    /// it changed.
    pub async fn run_cycle(&mut self, now: Timestamp) -> ApplicationResult<DisplayState> {
        if self
            .last_runway_check
            .is_none_or(|last| !is_fresh(last, now, self.timing.runway_check))
        {
            let status = self.selector.refresh_runways(now).await;
            debug!(
                arrivals = ?status.arrivals_runway(),
                active = status.monitored_runway_active(),
                as_of = %status.last_updated(),
                "Runway check done"
            );
            self.last_runway_check = Some(now);
        }

        let intent = self.selector.select(now).await;
        let state = intent.state();
        let previous = self.redraw.shown_state();
        if previous != Some(state) {
            info!(from = ?previous, to = ?state, "Display state changed");
        }
        if self.redraw.needs_redraw(&intent) {
            info!(?state, "Redrawing display");
            if let Err(e) = draw(&mut self.renderer, &intent) {
                // Whatever made it to the display is unknown now.
                self.redraw.reset();
                return Err(e);
            }
        } else {
            info!(?state, "Still showing the same display");
        }
        Ok(state)
    }

    /// Runs a cycle and returns how long to sleep after it. A failed cycle is
    /// logged and retried after the error backoff.
    pub async fn step(&mut self, now: Timestamp) -> Duration {
        match self.run_cycle(now).await {
            Ok(state) => self.timing.pause_after(state),
            Err(e) => {
                error!(error = %e, backoff = ?self.timing.error_backoff, "Display cycle failed");
                self.timing.error_backoff
            }
        }
    }

    /// Never returns; stop it by dropping the future.
    pub async fn run(&mut self) {
        loop {
            let pause = self.step(Timestamp::now()).await;
            sleep_with_liveness(&mut self.renderer, pause, self.timing.liveness_slice).await;
        }
    }

    pub fn shutdown(&mut self) -> ApplicationResult<()> {
        self.redraw.reset();
        self.renderer.clear()
    }
}
