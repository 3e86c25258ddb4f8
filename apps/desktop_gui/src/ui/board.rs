//! Board, stats and leaderboard panels.

use client_core::{
    derived::{connection_badge, rank_label, timer_fraction, timer_is_urgent, timer_label},
    DerivedView, SessionState,
};
use egui::{Align2, Color32, FontId, RichText, Sense, Stroke, StrokeKind};
use shared::domain::{Block, BlockId};

use crate::ui::theme;

const CELL_GAP: f32 = 4.0;
const MAX_CELL: f32 = 56.0;

/// Draws the grid and returns the block the player clicked, if any.
pub fn show_grid(
    ui: &mut egui::Ui,
    state: &SessionState,
    view: &DerivedView<'_>,
) -> Option<BlockId> {
    let columns = view.columns.max(1);
    let cell = ((ui.available_width() - CELL_GAP * columns as f32) / columns as f32)
        .clamp(16.0, MAX_CELL);
    let me = state.username();
    let mut clicked = None;

    let mut rows: Vec<Vec<&Block>> = Vec::new();
    for block in view.sorted.iter().copied() {
        match rows.last_mut() {
            Some(row) if row.first().is_some_and(|b| b.row == block.row) => row.push(block),
            _ => rows.push(vec![block]),
        }
    }

    for row in rows {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(CELL_GAP, CELL_GAP);
            for block in row {
                let (rect, response) =
                    ui.allocate_exact_size(egui::vec2(cell, cell), Sense::click());
                let fill = theme::owner_color(block.color());
                ui.painter().rect_filled(rect, 6.0, fill);

                if state.highlight == Some(block.id) {
                    ui.painter().rect_stroke(
                        rect,
                        6.0,
                        Stroke::new(3.0, theme::HIGHLIGHT),
                        StrokeKind::Inside,
                    );
                } else if response.hovered() {
                    ui.painter().rect_stroke(
                        rect,
                        6.0,
                        Stroke::new(1.5, theme::ACCENT),
                        StrokeKind::Inside,
                    );
                }

                if let Some(owner) = block.owner() {
                    let glyph = if Some(owner) == me {
                        "\u{2605}".to_string()
                    } else {
                        owner
                            .chars()
                            .next()
                            .map(|c| c.to_uppercase().to_string())
                            .unwrap_or_default()
                    };
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        glyph,
                        FontId::proportional(cell * 0.4),
                        Color32::WHITE,
                    );
                }

                let response = response.on_hover_text(match block.owner() {
                    Some(owner) => format!("({}, {}) held by {owner}", block.row, block.col),
                    None => format!("({}, {}) unclaimed", block.row, block.col),
                });
                if response.clicked() {
                    clicked = Some(block.id);
                }
            }
        });
    }
    clicked
}

/// Connection badge, timer label and countdown bar.
pub fn show_round_status(ui: &mut egui::Ui, state: &SessionState, round_length_secs: u64) {
    let badge_color = if state.connected {
        theme::LIVE
    } else {
        theme::WARNING
    };
    ui.label(
        RichText::new(connection_badge(state.connected))
            .color(badge_color)
            .strong(),
    );
    ui.separator();

    let timer_color = if timer_is_urgent(state.seconds_left) {
        theme::WARNING
    } else {
        ui.visuals().text_color()
    };
    ui.label(
        RichText::new(timer_label(state.seconds_left))
            .color(timer_color)
            .strong(),
    );
    ui.add(
        egui::ProgressBar::new(timer_fraction(state.seconds_left, round_length_secs) as f32)
            .desired_width(160.0)
            .fill(timer_color),
    );
}

pub fn show_stats(ui: &mut egui::Ui, view: &DerivedView<'_>) {
    ui.heading("Stats");
    egui::Grid::new("board_stats").num_columns(2).show(ui, |ui| {
        ui.label("Total blocks");
        ui.label(view.counts.total.to_string());
        ui.end_row();
        ui.label("Claimed");
        ui.label(view.counts.claimed.to_string());
        ui.end_row();
        ui.label("Free");
        ui.label(view.counts.free.to_string());
        ui.end_row();
        ui.label("Yours");
        ui.label(view.counts.mine.to_string());
        ui.end_row();
    });
    ui.add_space(6.0);
    ui.label(format!("Territory {}%", view.territory_label()));
    ui.add(egui::ProgressBar::new(view.territory_ratio as f32).fill(theme::ACCENT));
    ui.label(format!("Your dominance {}%", view.dominance_label()));
    ui.add(egui::ProgressBar::new(view.dominance_ratio as f32).fill(theme::LIVE));
}

pub fn show_how_to_play(ui: &mut egui::Ui) {
    ui.heading("How to play");
    ui.label("Click a free or enemy block to claim it.");
    ui.label("Hold the most blocks when the timer runs out.");
    ui.label("A new round starts automatically after the results.");
}

pub fn show_legend(ui: &mut egui::Ui, state: &SessionState) {
    ui.heading("Legend");
    let mine = state
        .player
        .as_ref()
        .and_then(|p| theme::parse_hex_color(&p.color))
        .unwrap_or(theme::ACCENT);
    for (color, text) in [
        (theme::FREE_CELL, "Unclaimed"),
        (mine, "Yours (\u{2605})"),
        (theme::HIGHLIGHT, "Just changed"),
    ] {
        ui.horizontal(|ui| {
            let (swatch, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), Sense::hover());
            ui.painter().rect_filled(swatch, 3.0, color);
            ui.label(text);
        });
    }
}

pub fn show_leaderboard(ui: &mut egui::Ui, view: &DerivedView<'_>) {
    ui.heading("Leaderboard");
    ui.add_space(6.0);
    let entries = view.top_entries();
    if entries.is_empty() {
        ui.weak("No blocks claimed yet.");
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        ui.horizontal(|ui| {
            ui.label(RichText::new(rank_label(index)).strong());
            let (swatch, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), Sense::hover());
            ui.painter()
                .rect_filled(swatch, 3.0, theme::owner_color(Some(&entry.color)));
            ui.label(entry.name.as_str());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!(
                    "{} ({:.1}%)",
                    entry.count,
                    view.entry_share(entry) * 100.0
                ));
            });
        });
    }
}
