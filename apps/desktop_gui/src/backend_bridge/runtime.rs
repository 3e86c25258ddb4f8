//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{
    ClientSettings, FeedSettings, HttpGameApi, SessionRuntime, SessionState, StompFeedConnector,
};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::watch;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    settings: ClientSettings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    snapshot_tx: watch::Sender<SessionState>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let api = Arc::new(HttpGameApi::from_settings(&settings));
            let feed = Arc::new(StompFeedConnector::new(FeedSettings::from(&settings)));
            let session = SessionRuntime::start(settings, api, feed);
            let handle = session.handle();

            tokio::spawn(forward_snapshots(session.subscribe(), snapshot_tx));
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            // Blocking receive; session work runs on the runtime's worker threads.
            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend: command");
                let (delivered, context) = match cmd {
                    BackendCommand::Join { username } => {
                        (handle.join(username), UiErrorContext::Join)
                    }
                    BackendCommand::Claim { block_id } => {
                        (handle.claim(block_id), UiErrorContext::General)
                    }
                    BackendCommand::NewRound => (handle.new_round(), UiErrorContext::General),
                    BackendCommand::Shutdown => break,
                };
                if !delivered {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        context,
                        "Backend session disconnected (possible runtime failure)",
                    )));
                    break;
                }
            }

            session.shutdown().await;
            tracing::info!("backend worker stopped");
        });
    })
}

/// Mirrors session snapshots into the UI's watch slot, which always holds the latest.
pub async fn forward_snapshots(
    mut snapshots: watch::Receiver<SessionState>,
    sink: watch::Sender<SessionState>,
) {
    while snapshots.changed().await.is_ok() {
        let state = snapshots.borrow_and_update().clone();
        sink.send_replace(state);
    }
}
