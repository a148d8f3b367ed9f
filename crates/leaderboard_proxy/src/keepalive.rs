use std::time::Duration;

use observability::{KEEPALIVE_FAIL, KEEPALIVE_OK};
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// GETs `url` every `every`, starting one period after spawn. Results are only
/// logged.
pub(crate) fn spawn_self_ping(http: Client, url: String, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match http.get(&url).send().await.and_then(|r| r.error_for_status()) {
                Ok(_) => {
                    metrics::counter!(KEEPALIVE_OK).increment(1);
                    tracing::debug!(%url, "self-ping ok");
                }
                Err(err) => {
                    metrics::counter!(KEEPALIVE_FAIL).increment(1);
                    tracing::warn!(%url, error = %err, "self-ping failed");
                }
            }
        }
    })
}
