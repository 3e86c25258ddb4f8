//! Client-side mirror of the server's blocks.

use std::collections::HashMap;

use shared::domain::{Block, BlockId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardCounts {
    pub total: usize,
    pub claimed: usize,
    pub free: usize,
    pub mine: usize,
}

/// Blocks keyed by id. Entries are only ever replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    blocks: HashMap<BlockId, Block>,
    columns: usize,
}

impl Board {
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut board = Self::default();
        board.replace_all(blocks);
        board
    }

    pub fn replace_all(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.blocks = blocks.into_iter().map(|b| (b.id, b)).collect();
        self.columns = column_count(self.blocks.values());
    }

    /// Replaces the block with the same id, inserting it when unknown.
    pub fn merge(&mut self, block: Block) {
        self.columns = self.columns.max(block.col as usize + 1);
        self.blocks.insert(block.id, block);
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn at(&self, row: u32, col: u32) -> Option<&Block> {
        self.blocks.values().find(|b| b.row == row && b.col == col)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn counts(&self, username: Option<&str>) -> BoardCounts {
        counts(self.blocks.values(), username)
    }
}

/// Highest column index plus one; zero for no blocks.
pub fn column_count<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> usize {
    blocks
        .into_iter()
        .map(|b| b.col as usize + 1)
        .max()
        .unwrap_or(0)
}

pub fn counts<'a>(blocks: impl IntoIterator<Item = &'a Block>, username: Option<&str>) -> BoardCounts {
    let mut out = BoardCounts::default();
    for block in blocks {
        out.total += 1;
        if let Some(owner) = block.owner() {
            out.claimed += 1;
            if Some(owner) == username {
                out.mine += 1;
            }
        }
    }
    out.free = out.total - out.claimed;
    out
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
