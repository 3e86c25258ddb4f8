use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BlockDecodeError, UsernameError};

pub const MAX_USERNAME_CHARS: usize = 15;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(BlockId);

/// Who holds a block and the colour they paint it with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ownership {
    pub owner: String,
    pub color: String,
}

/// One claimable cell of the board, as last confirmed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlockWire", into = "BlockWire")]
pub struct Block {
    pub id: BlockId,
    pub row: u32,
    pub col: u32,
    pub ownership: Option<Ownership>,
}

impl Block {
    pub fn unclaimed(id: BlockId, row: u32, col: u32) -> Self {
        Self {
            id,
            row,
            col,
            ownership: None,
        }
    }

    pub fn owned(
        id: BlockId,
        row: u32,
        col: u32,
        owner: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            row,
            col,
            ownership: Some(Ownership {
                owner: owner.into(),
                color: color.into(),
            }),
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.ownership.as_ref().map(|o| o.owner.as_str())
    }

    pub fn color(&self) -> Option<&str> {
        self.ownership.as_ref().map(|o| o.color.as_str())
    }

    pub fn is_claimed(&self) -> bool {
        self.ownership.is_some()
    }

    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner() == Some(username)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockWire {
    id: BlockId,
    row_num: u32,
    col_num: u32,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

impl TryFrom<BlockWire> for Block {
    type Error = BlockDecodeError;

    fn try_from(wire: BlockWire) -> Result<Self, Self::Error> {
        let ownership = match (wire.owner, wire.color) {
            (Some(owner), Some(color)) => Some(Ownership { owner, color }),
            (None, None) => None,
            (Some(_), None) => return Err(BlockDecodeError::OwnerWithoutColor(wire.id.0)),
            (None, Some(_)) => return Err(BlockDecodeError::ColorWithoutOwner(wire.id.0)),
        };
        Ok(Self {
            id: wire.id,
            row: wire.row_num,
            col: wire.col_num,
            ownership,
        })
    }
}

impl From<Block> for BlockWire {
    fn from(block: Block) -> Self {
        let (owner, color) = match block.ownership {
            Some(Ownership { owner, color }) => (Some(owner), Some(color)),
            None => (None, None),
        };
        Self {
            id: block.id,
            row_num: block.row,
            col_num: block.col,
            owner,
            color,
        }
    }
}

/// A player name that passed the join-screen rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, UsernameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }
        let len = trimmed.chars().count();
        if len > MAX_USERNAME_CHARS {
            return Err(UsernameError::TooLong {
                max: MAX_USERNAME_CHARS,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First character upper-cased, used for avatars and grid glyphs.
    pub fn initial(&self) -> char {
        self.0
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('?')
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
