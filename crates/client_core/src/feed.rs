//! Realtime feed: one STOMP-over-WebSocket connection per session, reconnecting
//! on a fixed delay for as long as the session lives.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use futures::{SinkExt, StreamExt};
use shared::{domain::Block, protocol::ClaimCommand};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ClientSettings,
    stomp::{decode_all, Command, Frame},
};

const SUBSCRIPTION_ID: &str = "sub-0";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Connected,
    Disconnected,
    BlockUpdated(Block),
}

/// Outbound half of the feed as seen by the session.
pub trait ClaimSink: Send + Sync {
    /// Fire-and-forget. Returns false when the claim was dropped.
    fn publish(&self, claim: ClaimCommand) -> bool;
    /// Idempotent.
    fn close(&self);
}

pub trait FeedConnector: Send + Sync {
    fn open(&self, events: mpsc::UnboundedSender<FeedEvent>) -> Arc<dyn ClaimSink>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub broker_url: String,
    pub update_topic: String,
    pub claim_destination: String,
    pub reconnect_delay: Duration,
}

impl From<&ClientSettings> for FeedSettings {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            broker_url: settings.broker_url.clone(),
            update_topic: settings.update_topic.clone(),
            claim_destination: settings.claim_destination.clone(),
            reconnect_delay: settings.reconnect_delay(),
        }
    }
}

pub struct StompFeedConnector {
    settings: FeedSettings,
}

impl StompFeedConnector {
    pub fn new(settings: FeedSettings) -> Self {
        Self { settings }
    }
}

impl FeedConnector for StompFeedConnector {
    fn open(&self, events: mpsc::UnboundedSender<FeedEvent>) -> Arc<dyn ClaimSink> {
        Arc::new(FeedHandle::spawn(self.settings.clone(), events))
    }
}

pub struct FeedHandle {
    live: Arc<AtomicBool>,
    closed: AtomicBool,
    outbound: mpsc::UnboundedSender<ClaimCommand>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FeedHandle {
    pub fn spawn(settings: FeedSettings, events: mpsc::UnboundedSender<FeedEvent>) -> Self {
        let live = Arc::new(AtomicBool::new(false));
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_feed(
            settings,
            Arc::clone(&live),
            outbound_rx,
            shutdown_rx,
            events,
        ));
        Self {
            live,
            closed: AtomicBool::new(false),
            outbound,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    /// Waits for the connection task to finish after `close`.
    pub async fn closed(&self) {
        let task = self.task.lock().ok().and_then(|mut guard| guard.take());
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl ClaimSink for FeedHandle {
    fn publish(&self, claim: ClaimCommand) -> bool {
        if self.closed.load(Ordering::Acquire) || !self.live.load(Ordering::Acquire) {
            debug!(block_id = claim.id.0, "feed: dropping claim while not connected");
            return false;
        }
        self.outbound.send(claim).is_ok()
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("feed: closing");
        let _ = self.shutdown.send(true);
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.close();
    }
}

enum ConnectionEnd {
    Shutdown,
    Dropped,
}

async fn run_feed(
    settings: FeedSettings,
    live: Arc<AtomicBool>,
    mut outbound: mpsc::UnboundedReceiver<ClaimCommand>,
    mut shutdown: watch::Receiver<bool>,
    events: mpsc::UnboundedSender<FeedEvent>,
) {
    let mut attempt: u64 = 0;
    loop {
        if *shutdown.borrow() {
            break;
        }
        attempt += 1;
        let end = connect_and_pump(
            &settings,
            &live,
            &mut outbound,
            &mut shutdown,
            &events,
        )
        .await;

        if live.swap(false, Ordering::AcqRel) {
            let _ = events.send(FeedEvent::Disconnected);
        }
        // Claims written while the socket was going away are not retried.
        while outbound.try_recv().is_ok() {}

        match end {
            Ok(ConnectionEnd::Shutdown) => break,
            Ok(ConnectionEnd::Dropped) => {
                info!(attempt, url = %settings.broker_url, "feed: connection closed by broker")
            }
            Err(err) => {
                warn!(attempt, url = %settings.broker_url, "feed: connection failed: {err:#}")
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(settings.reconnect_delay) => {}
            _ = shutdown.changed() => break,
        }
    }
    debug!("feed: task finished");
}

async fn connect_and_pump(
    settings: &FeedSettings,
    live: &AtomicBool,
    outbound: &mut mpsc::UnboundedReceiver<ClaimCommand>,
    shutdown: &mut watch::Receiver<bool>,
    events: &mpsc::UnboundedSender<FeedEvent>,
) -> Result<ConnectionEnd> {
    let host = broker_host(&settings.broker_url)?;

    let connected = tokio::select! {
        res = open_session(settings, &host) => res?,
        _ = shutdown.changed() => return Ok(ConnectionEnd::Shutdown),
    };
    let Some(ws) = connected else {
        return Ok(ConnectionEnd::Dropped);
    };
    let (mut writer, mut reader) = ws.split();

    writer
        .send(Message::Text(
            Frame::subscribe(SUBSCRIPTION_ID, &settings.update_topic).encode(),
        ))
        .await
        .context("failed to send SUBSCRIBE")?;
    live.store(true, Ordering::Release);
    let _ = events.send(FeedEvent::Connected);
    info!(url = %settings.broker_url, topic = %settings.update_topic, "feed: live");

    loop {
        tokio::select! {
            msg = reader.next() => match msg {
                Some(Ok(Message::Text(text))) => handle_inbound(&text, settings, events)?,
                Some(Ok(Message::Close(_))) | None => return Ok(ConnectionEnd::Dropped),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("websocket receive failed"),
            },
            claim = outbound.recv() => {
                let Some(claim) = claim else {
                    return Ok(ConnectionEnd::Shutdown);
                };
                let body = serde_json::to_string(&claim)?;
                writer
                    .send(Message::Text(
                        Frame::send_json(&settings.claim_destination, body).encode(),
                    ))
                    .await
                    .context("failed to publish claim")?;
                debug!(block_id = claim.id.0, "feed: claim published");
            }
            _ = shutdown.changed() => {
                let _ = writer.send(Message::Text(Frame::disconnect().encode())).await;
                let _ = writer.close().await;
                return Ok(ConnectionEnd::Shutdown);
            }
        }
    }
}

/// Opens the socket and completes the CONNECT handshake. `None` when the
/// broker hangs up before answering.
async fn open_session(settings: &FeedSettings, host: &str) -> Result<Option<WsStream>> {
    let (mut ws, _) = connect_async(settings.broker_url.as_str())
        .await
        .with_context(|| format!("failed to connect websocket: {}", settings.broker_url))?;
    ws.send(Message::Text(Frame::connect(host).encode()))
        .await
        .context("failed to send CONNECT")?;

    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                for frame in decode_all(&text)? {
                    match frame.command {
                        Command::Connected => return Ok(Some(ws)),
                        Command::Error => {
                            return Err(anyhow!(
                                "broker rejected CONNECT: {}",
                                frame.get("message").unwrap_or("no reason given")
                            ))
                        }
                        _ => {}
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => return Ok(None),
            Some(Ok(_)) => {}
            Some(Err(err)) => return Err(err).context("websocket receive failed"),
        }
    }
}

fn handle_inbound(
    text: &str,
    settings: &FeedSettings,
    events: &mpsc::UnboundedSender<FeedEvent>,
) -> Result<()> {
    let frames = match decode_all(text) {
        Ok(frames) => frames,
        Err(err) => {
            warn!("feed: ignoring undecodable frame: {err}");
            return Ok(());
        }
    };
    for frame in frames {
        match frame.command {
            Command::Message => {
                if frame
                    .get("destination")
                    .is_some_and(|dest| dest != settings.update_topic)
                {
                    continue;
                }
                match serde_json::from_str::<Block>(&frame.body) {
                    Ok(block) => {
                        let _ = events.send(FeedEvent::BlockUpdated(block));
                    }
                    Err(err) => warn!("feed: ignoring undecodable block update: {err}"),
                }
            }
            Command::Error => {
                return Err(anyhow!(
                    "broker error: {}",
                    frame.get("message").unwrap_or("no reason given")
                ))
            }
            _ => {}
        }
    }
    Ok(())
}

fn broker_host(broker_url: &str) -> Result<String> {
    let url = Url::parse(broker_url).with_context(|| format!("invalid broker url: {broker_url}"))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("broker url has no host: {broker_url}"))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/feed_tests.rs"]
mod tests;
