//! Pure view computations over the board mirror, recomputed whenever it changes.

use std::collections::HashMap;

use shared::protocol::EpochMillis;
use shared::domain::Block;

use crate::board::{counts, Board, BoardCounts};

pub const LEADERBOARD_LIMIT: usize = 10;
pub const URGENT_SECONDS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub color: String,
    pub count: usize,
}

/// Everything the screens draw that is derived from the board.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView<'a> {
    pub sorted: Vec<&'a Block>,
    pub columns: usize,
    pub counts: BoardCounts,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub territory_ratio: f64,
    pub dominance_ratio: f64,
}

impl<'a> DerivedView<'a> {
    pub fn compute(board: &'a Board, username: Option<&str>) -> Self {
        let sorted = sort_blocks(board.blocks());
        let counts = counts(sorted.iter().copied(), username);
        let leaderboard = leaderboard(sorted.iter().copied());
        Self {
            columns: board.column_count(),
            territory_ratio: ratio(counts.claimed, counts.total),
            dominance_ratio: ratio(counts.mine, counts.total),
            sorted,
            counts,
            leaderboard,
        }
    }

    pub fn top_entries(&self) -> &[LeaderboardEntry] {
        let end = self.leaderboard.len().min(LEADERBOARD_LIMIT);
        &self.leaderboard[..end]
    }

    pub fn winner(&self) -> Option<&LeaderboardEntry> {
        self.leaderboard.first()
    }

    pub fn entry_share(&self, entry: &LeaderboardEntry) -> f64 {
        ratio(entry.count, self.counts.total)
    }

    pub fn territory_label(&self) -> String {
        percent_label(self.counts.claimed, self.counts.total, 0)
    }

    pub fn dominance_label(&self) -> String {
        percent_label(self.counts.mine, self.counts.total, 1)
    }
}

/// Stable ascending sort by row, then column.
pub fn sort_blocks<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Vec<&'a Block> {
    let mut sorted: Vec<&Block> = blocks.into_iter().collect();
    sorted.sort_by_key(|b| (b.row, b.col));
    sorted
}

/// Per-owner counts, most blocks first, ties by name.
pub fn leaderboard<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Vec<LeaderboardEntry> {
    let mut by_owner: HashMap<&str, LeaderboardEntry> = HashMap::new();
    for ownership in blocks.into_iter().filter_map(|b| b.ownership.as_ref()) {
        by_owner
            .entry(ownership.owner.as_str())
            .or_insert_with(|| LeaderboardEntry {
                name: ownership.owner.clone(),
                color: ownership.color.clone(),
                count: 0,
            })
            .count += 1;
    }
    let mut entries: Vec<LeaderboardEntry> = by_owner.into_values().collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries
}

pub fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

pub fn percent_label(part: usize, total: usize, decimals: usize) -> String {
    if total == 0 {
        return "0".to_string();
    }
    format!("{:.*}", decimals, ratio(part, total) * 100.0)
}

/// Whole seconds until `end`, rounded up, never negative.
pub fn seconds_remaining(end: EpochMillis, now: EpochMillis) -> u64 {
    let diff = end.saturating_sub(now);
    if diff <= 0 {
        0
    } else {
        (diff as u64).div_ceil(1000)
    }
}

pub fn timer_label(seconds_left: u64) -> String {
    if seconds_left > 0 {
        format!("{seconds_left}s")
    } else {
        "Time's up!".to_string()
    }
}

pub fn timer_is_urgent(seconds_left: u64) -> bool {
    seconds_left <= URGENT_SECONDS
}

pub fn timer_fraction(seconds_left: u64, round_length_secs: u64) -> f64 {
    if round_length_secs == 0 {
        return 0.0;
    }
    (seconds_left as f64 / round_length_secs as f64).min(1.0)
}

pub fn rank_label(index: usize) -> String {
    match index {
        0 => "\u{1F947}".to_string(),
        1 => "\u{1F948}".to_string(),
        2 => "\u{1F949}".to_string(),
        n => format!("#{}", n + 1),
    }
}

pub fn connection_badge(live: bool) -> &'static str {
    if live {
        "Live"
    } else {
        "Reconnecting..."
    }
}

#[cfg(test)]
#[path = "tests/derived_tests.rs"]
mod tests;
