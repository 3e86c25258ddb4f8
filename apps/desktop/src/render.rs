//! Plain-text rendering of a session snapshot.

use std::fmt::Write as _;

use client_core::{
    derived::{connection_badge, rank_label, timer_label},
    DerivedView, SessionState,
};

const FREE_CELL: char = '.';
const MY_CELL: char = '#';

/// One character per block, rows top to bottom. Own blocks are `#`, others
/// show the owner's initial.
pub fn render_grid(state: &SessionState) -> String {
    let view = state.view();
    let me = state.username();
    let mut out = String::new();
    let mut current_row = None;
    for block in &view.sorted {
        if current_row.is_some_and(|row| row != block.row) {
            out.push('\n');
        }
        if current_row != Some(block.row) {
            current_row = Some(block.row);
        } else {
            out.push(' ');
        }
        let glyph = match block.owner() {
            None => FREE_CELL,
            Some(owner) if Some(owner) == me => MY_CELL,
            Some(owner) => owner
                .chars()
                .next()
                .and_then(|c| c.to_uppercase().next())
                .unwrap_or('?'),
        };
        out.push(glyph);
    }
    if !view.sorted.is_empty() {
        out.push('\n');
    }
    out
}

pub fn render_status(state: &SessionState) -> String {
    let view = state.view();
    format!(
        "[{}] {} | territory {}% | dominance {}% | claimed {}/{} | free {} | mine {}",
        connection_badge(state.connected),
        timer_label(state.seconds_left),
        view.territory_label(),
        view.dominance_label(),
        view.counts.claimed,
        view.counts.total,
        view.counts.free,
        view.counts.mine,
    )
}

pub fn render_leaderboard(view: &DerivedView<'_>) -> String {
    let entries = view.top_entries();
    if entries.is_empty() {
        return "No blocks claimed yet.\n".to_string();
    }
    let mut out = String::new();
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4} {:<15} {:>3} blocks ({:.1}%)",
            rank_label(index),
            entry.name,
            entry.count,
            view.entry_share(entry) * 100.0,
        );
    }
    out
}

/// Result overlay text: the round winner and the player's own count.
pub fn render_round_result(state: &SessionState) -> String {
    let view = state.view();
    let winner = match view.winner() {
        Some(entry) => format!("{} wins with {} blocks", entry.name, entry.count),
        None => "Nobody claimed anything".to_string(),
    };
    format!("Round over! {winner}. You held {} blocks.", view.counts.mine)
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
