use std::sync::Arc;
use std::time::Duration;

use core_types::{AffiliateFeed, ServiceError};
use infra_clock::{Clock, CycleCalculator};
use observability::{REFRESH_FAIL, REFRESH_OK};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::query::load_board;
use crate::state::LeaderboardCache;

/// Keeps the current-cycle cache fresh. Runs once at spawn, then every
/// `period`; a slow refresh delays the next one instead of overlapping it.
pub(crate) struct RefreshScheduler {
    feed: Arc<dyn AffiliateFeed>,
    clock: Arc<dyn Clock>,
    calc: CycleCalculator,
    cache: Arc<LeaderboardCache>,
    period: Duration,
}

impl RefreshScheduler {
    pub(crate) fn new(
        feed: Arc<dyn AffiliateFeed>,
        clock: Arc<dyn Clock>,
        calc: CycleCalculator,
        cache: Arc<LeaderboardCache>,
        period: Duration,
    ) -> Self {
        Self {
            feed,
            clock,
            calc,
            cache,
            period,
        }
    }

    pub(crate) fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(&self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            // Failures are recorded on the cache status and logged.
            let _ = self.refresh_once().await;
        }
    }

    /// One fetch-transform-publish pass. On error the cache keeps its last
    /// good snapshot.
    pub(crate) async fn refresh_once(&self) -> Result<usize, ServiceError> {
        self.cache.mark_fetching();
        let now = self.clock.utc_now();
        let window = self.calc.compute_current_window(now);

        match load_board(self.feed.as_ref(), &window).await {
            Ok(entries) => {
                let count = entries.len();
                self.cache.publish(window, entries, self.clock.utc_now());
                metrics::counter!(REFRESH_OK).increment(1);
                tracing::info!(
                    start = %window.start_day(),
                    end = %window.end_day(),
                    entries = count,
                    "leaderboard updated"
                );
                Ok(count)
            }
            Err(err) => {
                self.cache.mark_failed(self.clock.utc_now(), err.to_string());
                metrics::counter!(REFRESH_FAIL).increment(1);
                tracing::warn!(
                    start = %window.start_day(),
                    end = %window.end_day(),
                    error = %err,
                    consecutive_failures = self.cache.status().consecutive_failures,
                    "leaderboard refresh failed; serving stale data"
                );
                Err(err)
            }
        }
    }
}
