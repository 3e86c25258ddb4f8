use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "block_conquest.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub broker_url: String,
    pub update_topic: String,
    pub claim_destination: String,
    pub reconnect_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub result_display_ms: u64,
    pub claim_cooldown_ms: u64,
    pub flash_ms: u64,
    pub round_length_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8099/api".into(),
            broker_url: "ws://localhost:8099/ws".into(),
            update_topic: "/topic/updates".into(),
            claim_destination: "/app/claim".into(),
            reconnect_delay_ms: 5_000,
            poll_interval_ms: 1_000,
            result_display_ms: 4_000,
            claim_cooldown_ms: 300,
            flash_ms: 700,
            round_length_secs: 30,
        }
    }
}

impl ClientSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn result_display(&self) -> Duration {
        Duration::from_millis(self.result_display_ms)
    }

    pub fn claim_cooldown(&self) -> Duration {
        Duration::from_millis(self.claim_cooldown_ms)
    }

    pub fn flash(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }

    /// Checks that both endpoints parse and use the expected schemes, and that
    /// the timer periods the session loops on are non-zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than zero"));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(anyhow!("reconnect_delay_ms must be greater than zero"));
        }
        let api = Url::parse(&self.api_base_url)
            .with_context(|| format!("invalid api_base_url '{}'", self.api_base_url))?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(anyhow!(
                "api_base_url must start with http:// or https://, got '{}'",
                self.api_base_url
            ));
        }
        let broker = Url::parse(&self.broker_url)
            .with_context(|| format!("invalid broker_url '{}'", self.broker_url))?;
        if !matches!(broker.scheme(), "ws" | "wss") {
            return Err(anyhow!(
                "broker_url must start with ws:// or wss://, got '{}'",
                self.broker_url
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    broker_url: Option<String>,
    update_topic: Option<String>,
    claim_destination: Option<String>,
    reconnect_delay_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    result_display_ms: Option<u64>,
    claim_cooldown_ms: Option<u64>,
    flash_ms: Option<u64>,
    round_length_secs: Option<u64>,
}

/// Defaults, then `block_conquest.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |name| std::env::var(name).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => tracing::warn!(path = %path.display(), "ignoring unreadable settings file: {err}"),
        }
    }

    if let Some(v) = env("BLOCK_CONQUEST_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("BLOCK_CONQUEST_BROKER_URL") {
        settings.broker_url = v;
    }
    if let Some(v) = env("APP__BROKER_URL") {
        settings.broker_url = v;
    }

    if let Some(v) = env("APP__RECONNECT_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.reconnect_delay_ms = parsed;
        }
    }

    settings
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.broker_url {
        settings.broker_url = v;
    }
    if let Some(v) = file_cfg.update_topic {
        settings.update_topic = v;
    }
    if let Some(v) = file_cfg.claim_destination {
        settings.claim_destination = v;
    }
    if let Some(v) = file_cfg.reconnect_delay_ms {
        settings.reconnect_delay_ms = v;
    }
    if let Some(v) = file_cfg.poll_interval_ms {
        settings.poll_interval_ms = v;
    }
    if let Some(v) = file_cfg.result_display_ms {
        settings.result_display_ms = v;
    }
    if let Some(v) = file_cfg.claim_cooldown_ms {
        settings.claim_cooldown_ms = v;
    }
    if let Some(v) = file_cfg.flash_ms {
        settings.flash_ms = v;
    }
    if let Some(v) = file_cfg.round_length_secs {
        settings.round_length_secs = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
