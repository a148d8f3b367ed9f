use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use core_types::AffiliateFeed;
use feed_affiliates::AffiliateClient;
use infra_clock::{Clock, SystemClock};
use observability::{init_metrics, init_tracing};
use reqwest::Client;

use crate::config::Cli;
use crate::control_api;
use crate::keepalive::spawn_self_ping;
use crate::query::QueryService;
use crate::refresh::RefreshScheduler;
use crate::state::{AppState, LeaderboardCache};

pub(super) async fn async_main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing("leaderboard_proxy");
    let prometheus = init_metrics();

    let calc = cli.cycle_calculator()?;
    let affiliate_cfg = cli.affiliate_config();
    tracing::info!(
        endpoint = %affiliate_cfg.endpoint,
        epoch = %calc.epoch(),
        cycle_days = cli.cycle_days,
        refresh_sec = cli.refresh_period().as_secs(),
        "starting leaderboard proxy"
    );

    let feed: Arc<dyn AffiliateFeed> = Arc::new(AffiliateClient::new(affiliate_cfg));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(LeaderboardCache::default());

    let _refresh_task = Arc::new(RefreshScheduler::new(
        feed.clone(),
        clock.clone(),
        calc,
        cache.clone(),
        cli.refresh_period(),
    ))
    .spawn();

    if let Some((url, every)) = cli.self_ping() {
        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| Client::new());
        tracing::info!(%url, every_sec = every.as_secs(), "self-ping enabled");
        let _ping_task = spawn_self_ping(http, url, every);
    }

    let state = AppState {
        cache,
        query: Arc::new(QueryService::new(feed, clock, calc)),
        prometheus,
    };
    let app = control_api::build_router(state);

    let bind = cli.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    tracing::info!(%bind, "leaderboard api started");
    axum::serve(listener, app).await?;
    Ok(())
}
