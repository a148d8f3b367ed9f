use std::sync::Arc;

use chrono::{DateTime, Utc};
use core_types::{CycleWindow, LeaderboardEntry};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use serde::Serialize;

use crate::query::QueryService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) cache: Arc<LeaderboardCache>,
    pub(crate) query: Arc<QueryService>,
    pub(crate) prometheus: PrometheusHandle,
}

/// Immutable view of the current-cycle board. Replaced as a whole, never
/// edited in place.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct CacheSnapshot {
    pub(crate) window: Option<CycleWindow>,
    pub(crate) refreshed_at: Option<DateTime<Utc>>,
    pub(crate) entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RefreshState {
    #[default]
    Idle,
    Fetching,
    Updated,
    FailedKeepStale,
}

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct RefreshStatus {
    pub(crate) state: RefreshState,
    pub(crate) last_success_at: Option<DateTime<Utc>>,
    pub(crate) last_failure_at: Option<DateTime<Utc>>,
    pub(crate) last_error: Option<String>,
    pub(crate) consecutive_failures: u32,
    pub(crate) refreshes_ok: u64,
}

/// Current-cycle cache. One writer (the refresh task), any number of readers.
#[derive(Debug, Default)]
pub(crate) struct LeaderboardCache {
    snapshot: RwLock<Arc<CacheSnapshot>>,
    status: RwLock<RefreshStatus>,
}

impl LeaderboardCache {
    pub(crate) fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.snapshot.read().clone()
    }

    pub(crate) fn entries(&self) -> Vec<LeaderboardEntry> {
        self.snapshot().entries.clone()
    }

    pub(crate) fn status(&self) -> RefreshStatus {
        self.status.read().clone()
    }

    pub(crate) fn mark_fetching(&self) {
        self.status.write().state = RefreshState::Fetching;
    }

    pub(crate) fn publish(
        &self,
        window: CycleWindow,
        entries: Vec<LeaderboardEntry>,
        at: DateTime<Utc>,
    ) {
        let next = Arc::new(CacheSnapshot {
            window: Some(window),
            refreshed_at: Some(at),
            entries,
        });
        *self.snapshot.write() = next;

        let mut status = self.status.write();
        status.state = RefreshState::Updated;
        status.last_success_at = Some(at);
        status.consecutive_failures = 0;
        status.refreshes_ok += 1;
    }

    /// Records a failed refresh. The published snapshot is left untouched.
    pub(crate) fn mark_failed(&self, at: DateTime<Utc>, reason: String) {
        let mut status = self.status.write();
        status.state = RefreshState::FailedKeepStale;
        status.last_failure_at = Some(at);
        status.last_error = Some(reason);
        status.consecutive_failures = status.consecutive_failures.saturating_add(1);
    }
}
