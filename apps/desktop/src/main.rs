use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    config::{load_settings_from, DEFAULT_SETTINGS_FILE},
    FeedSettings, HttpGameApi, Screen, SessionRuntime, SessionState, StompFeedConnector,
};
use tokio::{sync::watch, time::timeout};
use tracing::warn;

mod render;

const JOIN_TIMEOUT: Duration = Duration::from_secs(15);
const LIVE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(about = "Terminal client for Block Conquest")]
struct Args {
    #[arg(long)]
    username: String,
    /// Overrides the configured REST base URL.
    #[arg(long)]
    api_url: Option<String>,
    /// Overrides the configured STOMP broker URL.
    #[arg(long)]
    broker_url: Option<String>,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Cell to claim as ROW,COL. May be repeated.
    #[arg(long = "claim", value_parser = parse_cell)]
    claims: Vec<(u32, u32)>,
    /// Ask the server for a fresh round before claiming.
    #[arg(long)]
    new_round: bool,
    /// How long to keep watching the board afterwards.
    #[arg(long, default_value_t = 10)]
    watch_secs: u64,
}

fn parse_cell(raw: &str) -> Result<(u32, u32), String> {
    let (row, col) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{raw}'"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|err| format!("invalid row '{row}': {err}"))?;
    let col = col
        .trim()
        .parse()
        .map_err(|err| format!("invalid column '{col}': {err}"))?;
    Ok((row, col))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config, |name| std::env::var(name).ok());
    if let Some(api_url) = args.api_url.clone() {
        settings.api_base_url = api_url;
    }
    if let Some(broker_url) = args.broker_url.clone() {
        settings.broker_url = broker_url;
    }
    settings.validate()?;

    let api = Arc::new(HttpGameApi::from_settings(&settings));
    let feed = Arc::new(StompFeedConnector::new(FeedSettings::from(&settings)));
    let runtime = SessionRuntime::start(settings.clone(), api, feed);
    let result = play(&runtime, &args, settings.claim_cooldown()).await;
    runtime.shutdown().await;
    result
}

async fn play(runtime: &SessionRuntime, args: &Args, cooldown: Duration) -> Result<()> {
    let handle = runtime.handle();
    let mut rx = runtime.subscribe();

    handle.join(args.username.clone());
    let state = wait_for(&mut rx, JOIN_TIMEOUT, |s| {
        s.screen == Screen::Game || (!s.joining && s.join_error.is_some())
    })
    .await
    .context("timed out joining")?;
    if let Some(message) = state.join_error.filter(|_| state.screen == Screen::Join) {
        bail!(message);
    }
    if let Some(player) = &state.player {
        println!("Joined as {} ({})", player.username, player.color);
    }

    if wait_for(&mut rx, LIVE_TIMEOUT, |s| s.connected).await.is_none() {
        warn!("live feed not connected yet; claims will be rejected until it is");
    }

    if args.new_round {
        handle.new_round();
    }

    for &(row, col) in &args.claims {
        let snapshot = runtime.snapshot();
        let Some(block) = snapshot.board.at(row, col) else {
            warn!(row, col, "no such cell on the board");
            continue;
        };
        handle.claim(block.id);
        // Let the cooldown lapse so consecutive claims are not rejected.
        tokio::time::sleep(cooldown + Duration::from_millis(50)).await;
        if let Some(reason) = &runtime.snapshot().last_rejection {
            warn!(row, col, %reason, "claim not sent");
        }
    }

    let watch_for = Duration::from_secs(args.watch_secs);
    let deadline = tokio::time::Instant::now() + watch_for;
    let mut announced_result = false;
    let mut last_status = String::new();
    loop {
        let state = runtime.snapshot();
        let status = render::render_status(&state);
        if status != last_status {
            println!("{status}");
            last_status = status;
        }
        if state.show_results() && !announced_result {
            println!("{}", render::render_round_result(&state));
        }
        announced_result = state.show_results();

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            _ = tokio::time::sleep(Duration::from_millis(250)) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let state = runtime.snapshot();
    print!("{}", render::render_grid(&state));
    println!("{}", render::render_status(&state));
    print!("{}", render::render_leaderboard(&state.view()));
    Ok(())
}

async fn wait_for(
    rx: &mut watch::Receiver<SessionState>,
    limit: Duration,
    pred: impl FnMut(&SessionState) -> bool,
) -> Option<SessionState> {
    match timeout(limit, rx.wait_for(pred)).await {
        Ok(Ok(state)) => Some(state.clone()),
        _ => None,
    }
}
