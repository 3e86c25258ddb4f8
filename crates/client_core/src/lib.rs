use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Block,
    protocol::{EpochMillis, RegisterResponse},
};
use tracing::{debug, warn};

pub mod board;
pub mod config;
pub mod derived;
pub mod feed;
pub mod runtime;
pub mod session;
pub mod stomp;

pub use board::{Board, BoardCounts};
pub use config::{load_settings, ClientSettings};
pub use derived::{DerivedView, LeaderboardEntry};
pub use feed::{ClaimSink, FeedConnector, FeedEvent, FeedHandle, FeedSettings, StompFeedConnector};
pub use runtime::{system_now, SessionHandle, SessionRuntime};
pub use session::{
    ClaimRejection, Effect, Player, RoundPhase, Screen, SessionEvent, SessionState,
};

/// The backend's request/response surface. Ownership changes never go
/// through here; they arrive on the feed.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn register(&self) -> Result<RegisterResponse>;
    async fn fetch_blocks(&self) -> Result<Vec<Block>>;
    async fn fetch_round_end(&self) -> Result<EpochMillis>;
    async fn reset_round(&self) -> Result<()>;
}

pub struct HttpGameApi {
    http: Client,
    base_url: String,
}

impl HttpGameApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.api_base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn register(&self) -> Result<RegisterResponse> {
        let url = self.url("/users/register");
        let body: RegisterResponse = self
            .http
            .post(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?
            .json()
            .await
            .context("invalid register response")?;
        debug!(color = %body.color, "api: registered");
        Ok(body)
    }

    async fn fetch_blocks(&self) -> Result<Vec<Block>> {
        let url = self.url("/blocks");
        let rows: Vec<serde_json::Value> = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?
            .json()
            .await
            .context("invalid blocks response")?;
        Ok(decode_blocks(rows))
    }

    async fn fetch_round_end(&self) -> Result<EpochMillis> {
        let url = self.url("/blocks/round-time");
        let end: EpochMillis = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?
            .json()
            .await
            .context("invalid round-time response")?;
        Ok(end)
    }

    async fn reset_round(&self) -> Result<()> {
        let url = self.url("/blocks/reset");
        self.http
            .post(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?;
        debug!("api: round reset requested");
        Ok(())
    }
}

/// A malformed row costs only that cell; the rest of the board still loads.
fn decode_blocks(rows: Vec<serde_json::Value>) -> Vec<Block> {
    let total = rows.len();
    let blocks: Vec<Block> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<Block>(row) {
            Ok(block) => Some(block),
            Err(err) => {
                warn!("api: skipping malformed block row: {err}");
                None
            }
        })
        .collect();
    debug!(count = blocks.len(), skipped = total - blocks.len(), "api: loaded blocks");
    blocks
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
