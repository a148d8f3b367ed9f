use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use feed_affiliates::{AffiliateConfig, DEFAULT_ENDPOINT};
use infra_clock::CycleCalculator;

#[derive(Parser, Clone)]
#[command(
    name = "leaderboard-proxy",
    version,
    about = "Caching proxy for the affiliate wagering leaderboard"
)]
pub(crate) struct Cli {
    #[arg(long, env = "LEADERBOARD_HOST", default_value = "0.0.0.0")]
    pub(crate) host: String,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub(crate) port: u16,
    #[arg(long, env = "LEADERBOARD_API_KEY", hide_env_values = true)]
    pub(crate) api_key: String,
    #[arg(long, env = "LEADERBOARD_UPSTREAM_URL", default_value = DEFAULT_ENDPOINT)]
    pub(crate) upstream_url: String,
    #[arg(long, env = "LEADERBOARD_UPSTREAM_TIMEOUT_SEC", default_value_t = 15)]
    pub(crate) upstream_timeout_sec: u64,
    #[arg(long, env = "LEADERBOARD_REFRESH_INTERVAL_SEC", default_value_t = 300)]
    pub(crate) refresh_interval_sec: u64,
    /// Start of cycle 0, RFC 3339.
    #[arg(long, env = "LEADERBOARD_CYCLE_EPOCH", default_value = "2025-07-14T00:00:00Z")]
    pub(crate) cycle_epoch: DateTime<Utc>,
    #[arg(
        long,
        env = "LEADERBOARD_CYCLE_DAYS",
        default_value_t = 15,
        value_parser = clap::value_parser!(u32).range(1..=366)
    )]
    pub(crate) cycle_days: u32,
    /// Public URL to GET periodically so idle hosts keep the process warm.
    #[arg(long, env = "LEADERBOARD_SELF_PING_URL")]
    pub(crate) self_ping_url: Option<String>,
    #[arg(long, env = "LEADERBOARD_SELF_PING_INTERVAL_SEC", default_value_t = 270)]
    pub(crate) self_ping_interval_sec: u64,
}

impl fmt::Debug for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cli")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("upstream_url", &self.upstream_url)
            .field("upstream_timeout_sec", &self.upstream_timeout_sec)
            .field("refresh_interval_sec", &self.refresh_interval_sec)
            .field("cycle_epoch", &self.cycle_epoch)
            .field("cycle_days", &self.cycle_days)
            .field("self_ping_url", &self.self_ping_url)
            .field("self_ping_interval_sec", &self.self_ping_interval_sec)
            .finish()
    }
}

impl Cli {
    pub(crate) fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn cycle_calculator(&self) -> Result<CycleCalculator> {
        CycleCalculator::new(self.cycle_epoch, TimeDelta::days(i64::from(self.cycle_days)))
            .context("cycle configuration")
    }

    pub(crate) fn affiliate_config(&self) -> AffiliateConfig {
        AffiliateConfig {
            endpoint: self.upstream_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.upstream_timeout_sec.clamp(1, 120)),
        }
    }

    pub(crate) fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_sec.max(10))
    }

    pub(crate) fn self_ping(&self) -> Option<(String, Duration)> {
        let url = self
            .self_ping_url
            .as_deref()
            .map(str::trim)
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))?;
        Some((
            url.to_string(),
            Duration::from_secs(self.self_ping_interval_sec.max(30)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        let mut args = vec!["leaderboard-proxy", "--api-key", "k", "--port", "4000"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).expect("parse")
    }

    #[test]
    fn defaults_match_the_production_cycle() {
        let cli = parse(&[]);
        let calc = cli.cycle_calculator().expect("calc");
        assert_eq!(calc, CycleCalculator::default());
        assert_eq!(cli.refresh_period(), Duration::from_secs(300));
        assert_eq!(cli.bind_addr(), "0.0.0.0:4000");
        assert_eq!(cli.affiliate_config().endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cli.affiliate_config().timeout, Duration::from_secs(15));
        assert!(cli.self_ping().is_none());
    }

    #[test]
    fn intervals_are_clamped() {
        let cli = parse(&[
            "--refresh-interval-sec",
            "1",
            "--upstream-timeout-sec",
            "0",
            "--self-ping-url",
            "https://example.test/leaderboard/top14",
            "--self-ping-interval-sec",
            "2",
        ]);
        assert_eq!(cli.refresh_period(), Duration::from_secs(10));
        assert_eq!(cli.affiliate_config().timeout, Duration::from_secs(1));
        let (url, every) = cli.self_ping().expect("self ping");
        assert_eq!(url, "https://example.test/leaderboard/top14");
        assert_eq!(every, Duration::from_secs(30));
    }

    #[test]
    fn non_http_ping_url_disables_keepalive() {
        let cli = parse(&["--self-ping-url", "  "]);
        assert!(cli.self_ping().is_none());
    }

    #[test]
    fn custom_cycle_settings() {
        let cli = parse(&[
            "--cycle-epoch",
            "2024-01-01T00:00:00Z",
            "--cycle-days",
            "7",
        ]);
        let calc = cli.cycle_calculator().expect("calc");
        assert_eq!(calc.cycle(), TimeDelta::days(7));
        assert_eq!(calc.epoch().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_zero_day_cycles_and_bad_epochs() {
        let base = ["leaderboard-proxy", "--api-key", "k"];
        let mut zero = base.to_vec();
        zero.extend(["--cycle-days", "0"]);
        assert!(Cli::try_parse_from(zero).is_err());

        let mut bad_epoch = base.to_vec();
        bad_epoch.extend(["--cycle-epoch", "yesterday"]);
        assert!(Cli::try_parse_from(bad_epoch).is_err());
    }

    #[test]
    fn debug_output_redacts_key() {
        let cli = parse(&[]);
        let out = format!("{cli:?}");
        assert!(!out.contains("api_key: \"k\""));
        assert!(out.contains("<redacted>"));
    }
}
