//! Session state machine. `apply` is the only place session state changes;
//! anything that needs I/O or a timer comes back out as an [`Effect`].

use shared::{
    domain::{Block, BlockId, Username},
    protocol::{ClaimCommand, EpochMillis},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    board::Board,
    derived::{seconds_remaining, DerivedView},
    feed::FeedEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Join,
    Game,
}

/// `Active -> Ending -> Resetting -> Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundPhase {
    #[default]
    Active,
    Ending,
    Resetting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub username: Username,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimRejection {
    #[error("not joined yet")]
    NotJoined,
    #[error("claim cooldown is active")]
    CoolingDown,
    #[error("not connected to the live feed")]
    NotConnected,
    #[error("the round is over")]
    RoundOver,
    #[error("block {0} is not on the board")]
    UnknownBlock(BlockId),
    #[error("block {0} is already yours")]
    AlreadyYours(BlockId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    JoinRequested(String),
    Joined {
        player: Player,
        blocks: Vec<Block>,
        round_end: EpochMillis,
    },
    JoinFailed(String),
    Feed(FeedEvent),
    FlashElapsed(BlockId),
    ClaimRequested(BlockId),
    CooldownElapsed,
    Tick,
    RoundEndFetched(EpochMillis),
    ResultWindowElapsed,
    RoundReset {
        blocks: Vec<Block>,
        round_end: EpochMillis,
    },
    RoundResetFailed,
    NewRoundRequested,
    BoardRefreshed {
        blocks: Vec<Block>,
        round_end: EpochMillis,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Register, load the board and fetch the round end.
    Join(Username),
    OpenFeed,
    PublishClaim(ClaimCommand),
    ScheduleCooldownEnd,
    ScheduleFlashClear(BlockId),
    FetchRoundEnd,
    /// Wait out the result overlay, then report `ResultWindowElapsed`.
    ScheduleRoundReset,
    /// Reset the round on the server, reload the board and refetch the round end.
    ResetRound,
    /// Same calls as `ResetRound`, user initiated and outside the phase machine.
    ManualReset,
    CloseFeed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub screen: Screen,
    pub joining: bool,
    pub join_error: Option<String>,
    pub player: Option<Player>,
    pub board: Board,
    pub connected: bool,
    pub cooldown: bool,
    pub highlight: Option<BlockId>,
    pub round_end: Option<EpochMillis>,
    pub seconds_left: u64,
    pub phase: RoundPhase,
    pub feed_open: bool,
    pub last_rejection: Option<ClaimRejection>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.player.as_ref().map(|p| p.username.as_str())
    }

    pub fn view(&self) -> DerivedView<'_> {
        DerivedView::compute(&self.board, self.username())
    }

    /// The result overlay stays up until the next round's board has loaded.
    pub fn show_results(&self) -> bool {
        matches!(self.phase, RoundPhase::Ending | RoundPhase::Resetting)
    }

    pub fn apply(&mut self, event: SessionEvent, now: EpochMillis) -> Vec<Effect> {
        match event {
            SessionEvent::JoinRequested(raw) => self.request_join(&raw),
            SessionEvent::Joined {
                player,
                blocks,
                round_end,
            } => {
                self.joining = false;
                self.join_error = None;
                self.board.replace_all(blocks);
                info!(
                    username = %player.username,
                    color = %player.color,
                    blocks = self.board.len(),
                    "session: joined"
                );
                self.player = Some(player);
                self.screen = Screen::Game;
                self.feed_open = true;
                let mut effects = vec![Effect::OpenFeed];
                effects.extend(self.update_round_end(round_end, now));
                effects
            }
            SessionEvent::JoinFailed(message) => {
                self.joining = false;
                self.join_error = Some(message);
                Vec::new()
            }
            SessionEvent::Feed(FeedEvent::Connected) => {
                self.connected = true;
                Vec::new()
            }
            SessionEvent::Feed(FeedEvent::Disconnected) => {
                self.connected = false;
                Vec::new()
            }
            SessionEvent::Feed(FeedEvent::BlockUpdated(block)) => {
                let id = block.id;
                self.board.merge(block);
                self.highlight = Some(id);
                vec![Effect::ScheduleFlashClear(id)]
            }
            SessionEvent::FlashElapsed(id) => {
                if self.highlight == Some(id) {
                    self.highlight = None;
                }
                Vec::new()
            }
            SessionEvent::ClaimRequested(id) => match self.request_claim(id) {
                Ok(effect) => {
                    self.last_rejection = None;
                    vec![effect, Effect::ScheduleCooldownEnd]
                }
                Err(reason) => {
                    debug!(block_id = id.0, %reason, "session: claim rejected");
                    self.last_rejection = Some(reason);
                    Vec::new()
                }
            },
            SessionEvent::CooldownElapsed => {
                self.cooldown = false;
                Vec::new()
            }
            SessionEvent::Tick => {
                if self.screen != Screen::Game {
                    return Vec::new();
                }
                // Seconds left only move on a fresh reading from the server.
                vec![Effect::FetchRoundEnd]
            }
            SessionEvent::RoundEndFetched(end) => {
                if self.screen != Screen::Game {
                    return Vec::new();
                }
                self.update_round_end(end, now).into_iter().collect()
            }
            SessionEvent::ResultWindowElapsed => {
                if self.phase != RoundPhase::Ending {
                    return Vec::new();
                }
                self.phase = RoundPhase::Resetting;
                vec![Effect::ResetRound]
            }
            SessionEvent::RoundReset { blocks, round_end } => {
                info!("session: new round started");
                self.board.replace_all(blocks);
                self.highlight = None;
                self.round_end = Some(round_end);
                self.seconds_left = seconds_remaining(round_end, now);
                self.phase = RoundPhase::Active;
                Vec::new()
            }
            SessionEvent::RoundResetFailed => {
                if self.phase == RoundPhase::Resetting {
                    self.phase = RoundPhase::Active;
                }
                Vec::new()
            }
            SessionEvent::NewRoundRequested => {
                if self.screen != Screen::Game {
                    return Vec::new();
                }
                vec![Effect::ManualReset]
            }
            SessionEvent::BoardRefreshed { blocks, round_end } => {
                self.board.replace_all(blocks);
                self.round_end = Some(round_end);
                self.seconds_left = seconds_remaining(round_end, now);
                Vec::new()
            }
            SessionEvent::Shutdown => {
                if !self.feed_open {
                    return Vec::new();
                }
                self.feed_open = false;
                self.connected = false;
                vec![Effect::CloseFeed]
            }
        }
    }

    fn request_join(&mut self, raw: &str) -> Vec<Effect> {
        if self.joining || self.screen == Screen::Game {
            return Vec::new();
        }
        match Username::parse(raw) {
            Ok(username) => {
                self.joining = true;
                self.join_error = None;
                vec![Effect::Join(username)]
            }
            Err(err) => {
                self.join_error = Some(err.to_string());
                Vec::new()
            }
        }
    }

    /// Validates a claim and, when accepted, starts the cooldown.
    pub fn request_claim(&mut self, id: BlockId) -> Result<Effect, ClaimRejection> {
        let player = self.player.as_ref().ok_or(ClaimRejection::NotJoined)?;
        if self.cooldown {
            return Err(ClaimRejection::CoolingDown);
        }
        if !self.connected {
            return Err(ClaimRejection::NotConnected);
        }
        if self.seconds_left == 0 || self.phase != RoundPhase::Active {
            return Err(ClaimRejection::RoundOver);
        }
        let block = self.board.get(id).ok_or(ClaimRejection::UnknownBlock(id))?;
        if block.is_owned_by(player.username.as_str()) {
            return Err(ClaimRejection::AlreadyYours(id));
        }
        let claim = ClaimCommand::new(id, &player.username, player.color.clone());
        self.cooldown = true;
        Ok(Effect::PublishClaim(claim))
    }

    /// Fires the round-end sequence on the transition to zero, only from `Active`.
    fn update_round_end(&mut self, end: EpochMillis, now: EpochMillis) -> Option<Effect> {
        self.round_end = Some(end);
        self.seconds_left = seconds_remaining(end, now);
        if self.seconds_left == 0 && self.phase == RoundPhase::Active {
            info!("session: round over");
            self.phase = RoundPhase::Ending;
            return Some(Effect::ScheduleRoundReset);
        }
        None
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
