use serde::{Deserialize, Serialize};

use crate::domain::{BlockId, Username};

/// Milliseconds since the Unix epoch, as the backend reports round ends.
pub type EpochMillis = i64;

/// Body of the claim command published to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCommand {
    pub id: BlockId,
    pub owner: String,
    pub color: String,
}

impl ClaimCommand {
    pub fn new(id: BlockId, owner: &Username, color: impl Into<String>) -> Self {
        Self {
            id,
            owner: owner.as_str().to_string(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub color: String,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
