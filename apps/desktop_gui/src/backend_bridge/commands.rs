//! Backend commands queued from UI to backend worker.

use shared::domain::BlockId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Join { username: String },
    Claim { block_id: BlockId },
    NewRound,
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Claim { .. } => "claim",
            Self::NewRound => "new_round",
            Self::Shutdown => "shutdown",
        }
    }
}
