use approach_feeds::flight::{FlightFeed, FlightRecord};
use tracing::{debug, warn};

use crate::{error::ApplicationResult, source::FeedSource};

/// Looks for approach traffic in the corridor covered by the feed source.
pub(crate) struct FlightFinder<S> {
    source: S,
    max_altitude_ft: i64,
    default_destination: String,
}

impl<S: FeedSource> FlightFinder<S> {
    pub fn new(source: S, max_altitude_ft: i64, default_destination: impl Into<String>) -> Self {
        Self {
            source,
            max_altitude_ft,
            default_destination: default_destination.into(),
        }
    }

    /// First flight in feed order below the altitude limit. A failed fetch
    /// counts as no traffic.
    pub async fn find(&self) -> Option<FlightRecord> {
        let feed = match self.fetch_feed().await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(error = %e, "Flight feed unavailable");
                return None;
            }
        };
        let found = feed.first_below(self.max_altitude_ft, &self.default_destination);
        debug!(
            candidates = feed.len(),
            found = ?found.as_ref().map(|f| &f.id),
            "Searched flight feed"
        );
        found
    }

    async fn fetch_feed(&self) -> ApplicationResult<FlightFeed> {
        let body = self.source.fetch().await?;
        Ok(body.parse::<FlightFeed>()?)
    }
}
