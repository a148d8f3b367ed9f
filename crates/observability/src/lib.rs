use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const REFRESH_OK: &str = "leaderboard.refresh.ok";
pub const REFRESH_FAIL: &str = "leaderboard.refresh.fail";
pub const PREV_OK: &str = "leaderboard.prev.ok";
pub const PREV_FAIL: &str = "leaderboard.prev.fail";
pub const UPSTREAM_FETCH_MS: &str = "upstream.fetch_ms";
pub const KEEPALIVE_OK: &str = "keepalive.ping.ok";
pub const KEEPALIVE_FAIL: &str = "keepalive.ping.fail";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered lines are lost on exit.
pub fn init_tracing(service_name: &str) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{service_name}=info,info")));

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_target(true)
        .try_init();

    guard
}

/// Installs the Prometheus recorder once per process; later calls return the
/// same handle. Falls back to a detached recorder if another global recorder
/// is already installed.
pub fn init_metrics() -> PrometheusHandle {
    PROM_HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_ok() {
                describe_metrics();
            }
            handle
        })
        .clone()
}

fn describe_metrics() {
    describe_counter!(REFRESH_OK, "current-cycle refreshes that replaced the cache");
    describe_counter!(REFRESH_FAIL, "current-cycle refreshes that kept the stale cache");
    describe_counter!(PREV_OK, "previous-cycle queries served");
    describe_counter!(PREV_FAIL, "previous-cycle queries answered with an error");
    describe_histogram!(UPSTREAM_FETCH_MS, Unit::Milliseconds, "upstream affiliates latency");
    describe_counter!(KEEPALIVE_OK, "successful self-pings");
    describe_counter!(KEEPALIVE_FAIL, "failed self-pings");
}
