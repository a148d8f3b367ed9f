use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Upper bound on the number of ranks published for any window.
pub const LEADERBOARD_SIZE: usize = 10;

/// One accounting window. `end_inclusive` is the last whole second before
/// `next_start`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleWindow {
    pub start: DateTime<Utc>,
    pub next_start: DateTime<Utc>,
    pub end_inclusive: DateTime<Utc>,
}

impl CycleWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.next_start
    }

    /// Calendar day of `start`, as sent to the upstream (`YYYY-MM-DD`, UTC).
    pub fn start_day(&self) -> String {
        utc_day(self.start)
    }

    /// Calendar day of `end_inclusive`, as sent to the upstream.
    pub fn end_day(&self) -> String {
        utc_day(self.end_inclusive)
    }
}

pub fn utc_day(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Affiliate record as reported upstream for a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    pub username: String,
    #[serde(deserialize_with = "decimal_as_string")]
    pub wagered_amount: String,
}

fn decimal_as_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Text(String),
        Number(f64),
    }

    Ok(match Decimal::deserialize(de)? {
        Decimal::Text(v) => v,
        Decimal::Number(v) => v.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub wagered: i64,
    pub weighted_wager: i64,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream payload malformed: {0}")]
    Payload(String),
    #[error("upstream payload has no `{0}` field")]
    MissingField(&'static str),
}

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("wagered amount {raw:?} for {username:?} is not a finite number")]
    NonNumericWager { username: String, raw: String },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[async_trait]
pub trait AffiliateFeed: Send + Sync {
    async fn fetch_window(&self, window: &CycleWindow) -> Result<Vec<RawEntry>, UpstreamError>;
}
