//! Drives a [`SessionState`] from one event channel, executing the effects it
//! returns. Async work runs in spawned tasks that only report back as events.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use shared::{
    domain::{Block, BlockId},
    protocol::EpochMillis,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, trace, warn};

use crate::{
    config::ClientSettings,
    feed::{ClaimSink, FeedConnector},
    session::{Effect, Player, SessionEvent, SessionState},
    GameApi,
};

pub type Clock = Arc<dyn Fn() -> EpochMillis + Send + Sync>;

pub fn system_now() -> EpochMillis {
    chrono::Utc::now().timestamp_millis()
}

/// Cloneable sender for UI intents.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// False once the session loop has stopped.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn join(&self, username: impl Into<String>) -> bool {
        self.send(SessionEvent::JoinRequested(username.into()))
    }

    pub fn claim(&self, id: BlockId) -> bool {
        self.send(SessionEvent::ClaimRequested(id))
    }

    pub fn new_round(&self) -> bool {
        self.send(SessionEvent::NewRoundRequested)
    }

    pub fn shutdown(&self) -> bool {
        self.send(SessionEvent::Shutdown)
    }
}

pub struct SessionRuntime {
    handle: SessionHandle,
    snapshots: watch::Receiver<SessionState>,
    task: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    pub fn start(
        settings: ClientSettings,
        api: Arc<dyn GameApi>,
        feed: Arc<dyn FeedConnector>,
    ) -> Self {
        Self::start_with_clock(settings, api, feed, Arc::new(system_now))
    }

    pub fn start_with_clock(
        settings: ClientSettings,
        api: Arc<dyn GameApi>,
        feed: Arc<dyn FeedConnector>,
        clock: Clock,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(SessionState::new());
        let driver = Driver {
            settings,
            api,
            feed,
            clock,
            events: events_tx.clone(),
            snapshots: snapshot_tx,
            sink: None,
            ticker: None,
        };
        let task = tokio::spawn(driver.run(events_rx));
        Self {
            handle: SessionHandle { events: events_tx },
            snapshots,
            task: Some(task),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> SessionState {
        self.snapshots.borrow().clone()
    }

    /// Closes the feed and waits for the session loop to exit.
    pub async fn shutdown(mut self) {
        self.handle.shutdown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.handle.shutdown();
        }
    }
}

struct Driver {
    settings: ClientSettings,
    api: Arc<dyn GameApi>,
    feed: Arc<dyn FeedConnector>,
    clock: Clock,
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Sender<SessionState>,
    sink: Option<Arc<dyn ClaimSink>>,
    ticker: Option<JoinHandle<()>>,
}

impl Driver {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        let mut state = SessionState::new();
        while let Some(event) = events.recv().await {
            let stop = matches!(event, SessionEvent::Shutdown);
            let effects = state.apply(event, (self.clock)());
            for effect in effects {
                self.execute(effect);
            }
            self.snapshots.send_replace(state.clone());
            if stop {
                break;
            }
        }
        self.stop_ticker();
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        debug!("session: loop finished");
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Join(username) => {
                let api = Arc::clone(&self.api);
                let events = self.events.clone();
                let api_url = self.settings.api_base_url.clone();
                tokio::spawn(async move {
                    let event = match join(api.as_ref()).await {
                        Ok((color, blocks, round_end)) => SessionEvent::Joined {
                            player: Player { username, color },
                            blocks,
                            round_end,
                        },
                        Err(err) => {
                            warn!(url = %api_url, "session: join failed: {err:#}");
                            SessionEvent::JoinFailed(format!(
                                "Cannot connect to server. Ensure backend is running at {api_url}."
                            ))
                        }
                    };
                    let _ = events.send(event);
                });
            }
            Effect::OpenFeed => self.open_feed(),
            Effect::PublishClaim(claim) => match &self.sink {
                Some(sink) => {
                    let id = claim.id;
                    if !sink.publish(claim) {
                        debug!(block_id = id.0, "session: claim dropped by feed");
                    }
                }
                None => debug!(block_id = claim.id.0, "session: no feed for claim"),
            },
            Effect::ScheduleCooldownEnd => {
                self.after(self.settings.claim_cooldown(), SessionEvent::CooldownElapsed)
            }
            Effect::ScheduleFlashClear(id) => {
                self.after(self.settings.flash(), SessionEvent::FlashElapsed(id))
            }
            Effect::FetchRoundEnd => {
                let api = Arc::clone(&self.api);
                let events = self.events.clone();
                tokio::spawn(async move {
                    match api.fetch_round_end().await {
                        Ok(end) => {
                            let _ = events.send(SessionEvent::RoundEndFetched(end));
                        }
                        Err(err) => trace!("session: round-time poll failed: {err:#}"),
                    }
                });
            }
            Effect::ScheduleRoundReset => {
                self.after(self.settings.result_display(), SessionEvent::ResultWindowElapsed)
            }
            Effect::ResetRound => {
                let api = Arc::clone(&self.api);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let event = match restart_round(api.as_ref()).await {
                        Ok((blocks, round_end)) => SessionEvent::RoundReset { blocks, round_end },
                        Err(err) => {
                            warn!("session: round reset failed: {err:#}");
                            SessionEvent::RoundResetFailed
                        }
                    };
                    let _ = events.send(event);
                });
            }
            Effect::ManualReset => {
                let api = Arc::clone(&self.api);
                let events = self.events.clone();
                tokio::spawn(async move {
                    match restart_round(api.as_ref()).await {
                        Ok((blocks, round_end)) => {
                            let _ = events.send(SessionEvent::BoardRefreshed { blocks, round_end });
                        }
                        Err(err) => warn!("session: new round failed: {err:#}"),
                    }
                });
            }
            Effect::CloseFeed => {
                self.stop_ticker();
                if let Some(sink) = self.sink.take() {
                    sink.close();
                }
            }
        }
    }

    fn open_feed(&mut self) {
        if self.sink.is_some() {
            return;
        }
        let (feed_tx, mut feed_rx) = mpsc::unbounded_channel();
        self.sink = Some(self.feed.open(feed_tx));
        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(event) = feed_rx.recv().await {
                if events.send(SessionEvent::Feed(event)).is_err() {
                    break;
                }
            }
        });

        let period = self.settings.poll_interval();
        let events = self.events.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if events.send(SessionEvent::Tick).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn after(&self, delay: Duration, event: SessionEvent) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(event);
        });
    }
}

async fn join(api: &dyn GameApi) -> Result<(String, Vec<Block>, EpochMillis)> {
    let registered = api.register().await?;
    let blocks = api.fetch_blocks().await?;
    let round_end = api.fetch_round_end().await?;
    Ok((registered.color, blocks, round_end))
}

async fn restart_round(api: &dyn GameApi) -> Result<(Vec<Block>, EpochMillis)> {
    api.reset_round().await?;
    let blocks = api.fetch_blocks().await?;
    let round_end = api.fetch_round_end().await?;
    Ok((blocks, round_end))
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
