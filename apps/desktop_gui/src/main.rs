use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{
    config::{load_settings_from, DEFAULT_SETTINGS_FILE},
    SessionState,
};
use crossbeam_channel::bounded;
use eframe::egui;
use tokio::sync::watch;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{BlockConquestApp, StartupConfig};

#[derive(Parser, Debug)]
#[command(about = "Desktop client for Block Conquest")]
struct Args {
    /// Prefills the join screen.
    #[arg(long, default_value = "")]
    username: String,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    broker_url: Option<String>,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config, |name| std::env::var(name).ok());
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(broker_url) = args.broker_url {
        settings.broker_url = broker_url;
    }
    settings.validate()?;

    let startup = StartupConfig {
        username: args.username,
        round_length_secs: settings.round_length_secs,
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionState::new());
    let backend = backend_bridge::runtime::launch(settings, cmd_rx, ui_tx, snapshot_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Block Conquest")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Block Conquest",
        options,
        Box::new(move |_cc| Ok(Box::new(BlockConquestApp::new(cmd_tx, ui_rx, snapshot_rx, startup)))),
    )
    .map_err(|err| anyhow::anyhow!("gui failed: {err}"))?;

    if backend.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    Ok(())
}
