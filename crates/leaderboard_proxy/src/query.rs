use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use core_types::{AffiliateFeed, CycleWindow, LeaderboardEntry, ServiceError};
use infra_clock::{Clock, CycleCalculator};
use observability::{PREV_FAIL, PREV_OK, UPSTREAM_FETCH_MS};

/// Fetch one window from upstream and rank it.
pub(crate) async fn load_board(
    feed: &dyn AffiliateFeed,
    window: &CycleWindow,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let started = Instant::now();
    let fetched = feed.fetch_window(window).await;
    metrics::histogram!(UPSTREAM_FETCH_MS).record(started.elapsed().as_secs_f64() * 1_000.0);
    Ok(leaderboard_rank::transform(fetched?)?)
}

/// Previous-cycle leaderboard, computed live on every call.
pub(crate) struct QueryService {
    feed: Arc<dyn AffiliateFeed>,
    clock: Arc<dyn Clock>,
    calc: CycleCalculator,
}

impl QueryService {
    pub(crate) fn new(
        feed: Arc<dyn AffiliateFeed>,
        clock: Arc<dyn Clock>,
        calc: CycleCalculator,
    ) -> Self {
        Self { feed, clock, calc }
    }

    pub(crate) async fn get_previous(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let window = self.calc.compute_previous_window(now);
        match load_board(self.feed.as_ref(), &window).await {
            Ok(entries) => {
                metrics::counter!(PREV_OK).increment(1);
                tracing::info!(
                    start = %window.start_day(),
                    end = %window.end_day(),
                    entries = entries.len(),
                    "served previous cycle"
                );
                Ok(entries)
            }
            Err(err) => {
                metrics::counter!(PREV_FAIL).increment(1);
                tracing::error!(
                    start = %window.start_day(),
                    end = %window.end_day(),
                    error = %err,
                    "previous cycle fetch failed"
                );
                Err(err)
            }
        }
    }

    pub(crate) async fn get_previous_now(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        self.get_previous(self.clock.utc_now()).await
    }
}
