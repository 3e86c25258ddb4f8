use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_settings_path(tag: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("block_conquest_{tag}_{suffix}.toml"))
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_match_the_stock_backend() {
    let settings = load_settings_from(Path::new("/nonexistent/block_conquest.toml"), no_env);
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.api_base_url, "http://localhost:8099/api");
    assert_eq!(settings.broker_url, "ws://localhost:8099/ws");
    assert_eq!(settings.reconnect_delay(), Duration::from_secs(5));
    assert_eq!(settings.claim_cooldown(), Duration::from_millis(300));
    assert_eq!(settings.flash(), Duration::from_millis(700));
    assert_eq!(settings.result_display(), Duration::from_secs(4));
    settings.validate().expect("defaults are valid");
}

#[test]
fn file_values_override_defaults() {
    let path = temp_settings_path("file");
    fs::write(
        &path,
        "api_base_url = \"http://game.local:9000/api\"\nreconnect_delay_ms = 250\nupdate_topic = \"/topic/blocks\"\n",
    )
    .expect("write settings");

    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.api_base_url, "http://game.local:9000/api");
    assert_eq!(settings.reconnect_delay_ms, 250);
    assert_eq!(settings.update_topic, "/topic/blocks");
    assert_eq!(settings.broker_url, ClientSettings::default().broker_url);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn env_overrides_file() {
    let path = temp_settings_path("env");
    fs::write(&path, "broker_url = \"ws://file:1/ws\"\n").expect("write settings");
    let vars: HashMap<&str, &str> = HashMap::from([
        ("BLOCK_CONQUEST_BROKER_URL", "ws://env:2/ws"),
        ("APP__RECONNECT_DELAY_MS", "42"),
    ]);

    let settings = load_settings_from(&path, |name| vars.get(name).map(|v| v.to_string()));
    assert_eq!(settings.broker_url, "ws://env:2/ws");
    assert_eq!(settings.reconnect_delay_ms, 42);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let path = temp_settings_path("bad");
    fs::write(&path, "reconnect_delay_ms = \"soon\"").expect("write settings");
    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings, ClientSettings::default());
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn validate_rejects_wrong_schemes() {
    let mut settings = ClientSettings::default();
    settings.broker_url = "http://localhost:8099/ws".into();
    let err = settings.validate().expect_err("http broker rejected");
    assert!(err.to_string().contains("ws://"));

    let mut settings = ClientSettings::default();
    settings.api_base_url = "localhost:8099".into();
    assert!(settings.validate().is_err());
}

#[test]
fn validate_rejects_zero_timer_periods() {
    let path = temp_settings_path("zero_poll");
    fs::write(&path, "poll_interval_ms = 0").expect("write settings");
    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.poll_interval_ms, 0);
    let err = settings.validate().expect_err("zero poll interval rejected");
    assert!(err.to_string().contains("poll_interval_ms"));
    fs::remove_file(path).expect("cleanup");

    let mut settings = ClientSettings::default();
    settings.reconnect_delay_ms = 0;
    let err = settings.validate().expect_err("zero reconnect delay rejected");
    assert!(err.to_string().contains("reconnect_delay_ms"));

    assert!(ClientSettings::default().validate().is_ok());
}
