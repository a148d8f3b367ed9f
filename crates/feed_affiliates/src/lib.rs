use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use core_types::{AffiliateFeed, CycleWindow, RawEntry, UpstreamError};
use reqwest::{Client, Url};
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "https://services.rainbet.com/v1/external/affiliates";

#[derive(Clone)]
pub struct AffiliateConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl AffiliateConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl fmt::Debug for AffiliateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffiliateConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fetches per-window affiliate totals from the upstream wagering API.
#[derive(Debug, Clone)]
pub struct AffiliateClient {
    http: Client,
    cfg: AffiliateConfig,
}

impl AffiliateClient {
    pub fn new(cfg: AffiliateConfig) -> Self {
        let http = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, cfg }
    }

    pub fn request_url(&self, window: &CycleWindow) -> Result<Url, UpstreamError> {
        Url::parse_with_params(
            &self.cfg.endpoint,
            &[
                ("start_at", window.start_day()),
                ("end_at", window.end_day()),
                ("key", self.cfg.api_key.clone()),
            ],
        )
        .map_err(|err| UpstreamError::Transport(format!("invalid endpoint: {err}")))
    }
}

#[async_trait]
impl AffiliateFeed for AffiliateClient {
    async fn fetch_window(&self, window: &CycleWindow) -> Result<Vec<RawEntry>, UpstreamError> {
        let url = self.request_url(window)?;
        tracing::debug!(
            start_at = %window.start_day(),
            end_at = %window.end_day(),
            "requesting affiliates"
        );

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| UpstreamError::Transport(describe(err)))?;

        let status = res.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = res
            .text()
            .await
            .map_err(|err| UpstreamError::Transport(describe(err)))?;
        parse_affiliates(&body)
    }
}

#[derive(Debug, Deserialize)]
struct AffiliatesPayload {
    #[serde(default)]
    affiliates: Option<Vec<RawEntry>>,
}

pub fn parse_affiliates(body: &str) -> Result<Vec<RawEntry>, UpstreamError> {
    let payload: AffiliatesPayload =
        serde_json::from_str(body).map_err(|err| UpstreamError::Payload(err.to_string()))?;
    payload
        .affiliates
        .ok_or(UpstreamError::MissingField("affiliates"))
}

// reqwest errors embed the full URL, which carries the API key.
fn describe(err: reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connect failed"
    } else {
        "request failed"
    };
    format!("{kind}: {}", err.without_url())
}
