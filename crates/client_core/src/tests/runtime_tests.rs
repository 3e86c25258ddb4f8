use super::*;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use anyhow::anyhow;
use async_trait::async_trait;
use shared::protocol::{ClaimCommand, RegisterResponse};
use tokio::time::timeout;

use crate::{feed::FeedEvent, session::Screen, RoundPhase};

const WAIT: Duration = Duration::from_secs(5);

struct FakeApi {
    reachable: bool,
    blocks: Mutex<Vec<Block>>,
    round_end: Mutex<EpochMillis>,
    resets: AtomicUsize,
}

impl FakeApi {
    fn new(round_end: EpochMillis) -> Arc<Self> {
        Arc::new(Self {
            reachable: true,
            blocks: Mutex::new(vec![
                Block::unclaimed(BlockId(1), 0, 0),
                Block::owned(BlockId(2), 0, 1, "Bob", "#0f0"),
            ]),
            round_end: Mutex::new(round_end),
            resets: AtomicUsize::new(0),
        })
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reachable: false,
            blocks: Mutex::new(Vec::new()),
            round_end: Mutex::new(0),
            resets: AtomicUsize::new(0),
        })
    }

    fn check(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(anyhow!("connection refused"))
        }
    }
}

#[async_trait]
impl GameApi for FakeApi {
    async fn register(&self) -> Result<RegisterResponse> {
        self.check()?;
        Ok(RegisterResponse {
            id: Some("User-1".into()),
            color: "#6C63FF".into(),
        })
    }

    async fn fetch_blocks(&self) -> Result<Vec<Block>> {
        self.check()?;
        Ok(self.blocks.lock().expect("blocks").clone())
    }

    async fn fetch_round_end(&self) -> Result<EpochMillis> {
        self.check()?;
        Ok(*self.round_end.lock().expect("round end"))
    }

    async fn reset_round(&self) -> Result<()> {
        self.check()?;
        self.resets.fetch_add(1, Ordering::SeqCst);
        for block in self.blocks.lock().expect("blocks").iter_mut() {
            block.ownership = None;
        }
        *self.round_end.lock().expect("round end") = system_now() + 60_000;
        Ok(())
    }
}

#[derive(Default)]
struct FakeSink {
    published: Mutex<Vec<ClaimCommand>>,
    closes: AtomicUsize,
}

impl ClaimSink for FakeSink {
    fn publish(&self, claim: ClaimCommand) -> bool {
        self.published.lock().expect("published").push(claim);
        true
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeConnector {
    sink: Arc<FakeSink>,
    opens: AtomicUsize,
    events: Mutex<Option<mpsc::UnboundedSender<FeedEvent>>>,
}

impl FakeConnector {
    fn push(&self, event: FeedEvent) {
        let guard = self.events.lock().expect("events");
        guard
            .as_ref()
            .expect("feed opened")
            .send(event)
            .expect("session listening");
    }

    fn published(&self) -> Vec<ClaimCommand> {
        self.sink.published.lock().expect("published").clone()
    }
}

impl FeedConnector for FakeConnector {
    fn open(&self, events: mpsc::UnboundedSender<FeedEvent>) -> Arc<dyn ClaimSink> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.events.lock().expect("events") = Some(events);
        Arc::clone(&self.sink) as Arc<dyn ClaimSink>
    }
}

fn fast_settings() -> ClientSettings {
    ClientSettings {
        api_base_url: "http://backend.test/api".into(),
        poll_interval_ms: 20,
        result_display_ms: 30,
        claim_cooldown_ms: 40,
        flash_ms: 30,
        ..ClientSettings::default()
    }
}

async fn wait_until(
    rx: &mut watch::Receiver<SessionState>,
    what: &str,
    pred: impl FnMut(&SessionState) -> bool,
) -> SessionState {
    timeout(WAIT, rx.wait_for(pred))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
        .expect("session loop alive")
        .clone()
}

async fn joined_runtime(
    api: Arc<FakeApi>,
) -> (SessionRuntime, Arc<FakeConnector>, watch::Receiver<SessionState>) {
    let connector = Arc::new(FakeConnector::default());
    let runtime = SessionRuntime::start(fast_settings(), api, connector.clone());
    let mut rx = runtime.subscribe();
    assert!(runtime.handle().join("Ann"));
    wait_until(&mut rx, "game screen", |s| s.screen == Screen::Game).await;
    connector.push(FeedEvent::Connected);
    wait_until(&mut rx, "live feed", |s| s.connected).await;
    (runtime, connector, rx)
}

#[tokio::test]
async fn join_loads_board_and_opens_feed_once() {
    let api = FakeApi::new(system_now() + 60_000);
    let (runtime, connector, _rx) = joined_runtime(api).await;

    let state = runtime.snapshot();
    let player = state.player.as_ref().expect("player");
    assert_eq!(player.username.as_str(), "Ann");
    assert_eq!(player.color, "#6C63FF");
    assert_eq!(state.board.len(), 2);
    assert!(state.seconds_left > 50);
    assert_eq!(connector.opens.load(Ordering::SeqCst), 1);

    runtime.shutdown().await;
}

#[tokio::test]
async fn join_failure_surfaces_one_message() {
    let connector = Arc::new(FakeConnector::default());
    let runtime = SessionRuntime::start(fast_settings(), FakeApi::unreachable(), connector.clone());
    let mut rx = runtime.subscribe();
    runtime.handle().join("Ann");

    let state = wait_until(&mut rx, "join error", |s| s.join_error.is_some()).await;
    assert_eq!(state.screen, Screen::Join);
    assert_eq!(
        state.join_error.as_deref(),
        Some("Cannot connect to server. Ensure backend is running at http://backend.test/api.")
    );
    assert_eq!(connector.opens.load(Ordering::SeqCst), 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn feed_updates_merge_and_flash_clears() {
    let api = FakeApi::new(system_now() + 60_000);
    let (runtime, connector, mut rx) = joined_runtime(api).await;

    connector.push(FeedEvent::BlockUpdated(Block::owned(
        BlockId(9),
        2,
        3,
        "Cid",
        "#00f",
    )));
    let state = wait_until(&mut rx, "merged block", |s| s.board.get(BlockId(9)).is_some()).await;
    assert_eq!(state.highlight, Some(BlockId(9)));
    assert_eq!(state.board.column_count(), 4);
    wait_until(&mut rx, "flash cleared", |s| s.highlight.is_none()).await;

    runtime.shutdown().await;
}

#[tokio::test]
async fn claim_is_published_once_per_cooldown() {
    let api = FakeApi::new(system_now() + 60_000);
    let (runtime, connector, mut rx) = joined_runtime(api).await;
    let handle = runtime.handle();

    handle.claim(BlockId(1));
    handle.claim(BlockId(1));
    wait_until(&mut rx, "cooldown", |s| s.cooldown).await;
    wait_until(&mut rx, "cooldown over", |s| !s.cooldown).await;

    let published = connector.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, BlockId(1));
    assert_eq!(published[0].owner, "Ann");
    assert_eq!(published[0].color, "#6C63FF");

    handle.claim(BlockId(1));
    wait_until(&mut rx, "second cooldown", |s| s.cooldown).await;
    assert_eq!(connector.published().len(), 2);

    runtime.shutdown().await;
}

#[tokio::test]
async fn expired_round_resets_exactly_once() {
    let api = FakeApi::new(system_now() + 50);
    let (runtime, _connector, mut rx) = joined_runtime(api.clone()).await;

    wait_until(&mut rx, "result overlay", |s| s.phase == RoundPhase::Ending).await;
    let state = wait_until(&mut rx, "next round", |s| {
        s.phase == RoundPhase::Active && s.seconds_left > 0
    })
    .await;
    assert_eq!(state.view().counts.claimed, 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(api.resets.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.snapshot().phase, RoundPhase::Active);

    runtime.shutdown().await;
}

#[tokio::test]
async fn new_round_request_reloads_board() {
    let api = FakeApi::new(system_now() + 60_000);
    let (runtime, _connector, mut rx) = joined_runtime(api.clone()).await;

    runtime.handle().new_round();
    wait_until(&mut rx, "cleared board", |s| s.view().counts.claimed == 0).await;
    assert_eq!(api.resets.load(Ordering::SeqCst), 1);

    runtime.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_feed_exactly_once() {
    let api = FakeApi::new(system_now() + 60_000);
    let (runtime, connector, _rx) = joined_runtime(api).await;
    let handle = runtime.handle();

    runtime.shutdown().await;
    assert_eq!(connector.sink.closes.load(Ordering::SeqCst), 1);
    assert!(!handle.shutdown(), "loop has stopped");
}
