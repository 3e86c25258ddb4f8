use std::time::Duration;

use client_core::{Screen, SessionState};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::RichText;
use shared::domain::MAX_USERNAME_CHARS;
use tokio::sync::watch;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{classify_join_failure, UiError, UiEvent},
    orchestration::dispatch_backend_command,
};
use crate::ui::{board, theme};

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub username: String,
    pub round_length_secs: u64,
}

pub struct BlockConquestApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    snapshots: watch::Receiver<SessionState>,
    round_length_secs: u64,
    username_input: String,
    status: String,
    last_error: Option<UiError>,
    state: SessionState,
}

impl BlockConquestApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        snapshots: watch::Receiver<SessionState>,
        startup: StartupConfig,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshots,
            round_length_secs: startup.round_length_secs,
            username_input: startup.username,
            status: String::new(),
            last_error: None,
            state: SessionState::new(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "ui error: {}", err.message());
                    self.last_error = Some(err);
                }
            }
        }
        if self.snapshots.has_changed().unwrap_or(false) {
            self.state = self.snapshots.borrow_and_update().clone();
        }
    }

    fn send(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn show_join_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(360.0, 440.0);
            ui.add_space((avail.y * 0.2).clamp(18.0, 140.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);
                egui::Frame::NONE
                    .fill(theme::CARD_FILL)
                    .corner_radius(14.0)
                    .inner_margin(egui::Margin::symmetric(20, 18))
                    .show(ui, |ui| {
                        ui.style_mut().spacing.item_spacing = egui::vec2(10.0, 10.0);
                        ui.heading(RichText::new("Block Conquest").color(theme::ACCENT).strong());
                        ui.weak("Claim blocks before the round ends.");
                        ui.add_space(8.0);

                        let input = ui.add(
                            egui::TextEdit::singleline(&mut self.username_input)
                                .hint_text("Enter your name")
                                .char_limit(MAX_USERNAME_CHARS)
                                .desired_width(f32::INFINITY),
                        );
                        let submitted =
                            input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                        let can_join =
                            !self.state.joining && !self.username_input.trim().is_empty();
                        let label = if self.state.joining {
                            "Joining..."
                        } else {
                            "Join Game"
                        };
                        let button = egui::Button::new(label)
                            .min_size(egui::vec2(ui.available_width(), 32.0));
                        let clicked = ui.add_enabled(can_join, button).clicked();
                        if can_join && (clicked || submitted) {
                            self.send(BackendCommand::Join {
                                username: self.username_input.clone(),
                            });
                        }

                        if let Some(message) = &self.state.join_error {
                            ui.colored_label(theme::WARNING, classify_join_failure(message));
                        }
                        if let Some(err) = &self.last_error {
                            ui.colored_label(
                                theme::WARNING,
                                format!("{}: {}", err.headline(), err.message()),
                            );
                        }
                        if !self.status.is_empty() {
                            ui.weak(self.status.as_str());
                        }
                    });
            });
        });
    }

    fn show_game_screen(&mut self, ctx: &egui::Context) {
        let view = self.state.view();
        let mut clicked = None;
        let mut new_round = false;

        egui::TopBottomPanel::top("game_header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Block Conquest").color(theme::ACCENT).strong());
                ui.separator();
                board::show_round_status(ui, &self.state, self.round_length_secs);
                if let Some(player) = &self.state.player {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!("{} captured", view.counts.mine));
                        ui.label(player.username.as_str());
                        ui.label(
                            RichText::new(player.username.initial().to_string())
                                .color(
                                    theme::parse_hex_color(&player.color)
                                        .unwrap_or(theme::ACCENT),
                                )
                                .strong(),
                        );
                    });
                }
            });
            ui.add_space(6.0);
        });

        egui::SidePanel::left("stats")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                board::show_stats(ui, &view);
                ui.add_space(12.0);
                board::show_how_to_play(ui);
                ui.add_space(12.0);
                new_round = ui.button("New Round").clicked();
            });

        egui::SidePanel::right("leaderboard")
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                board::show_leaderboard(ui, &view);
                ui.add_space(12.0);
                board::show_legend(ui, &self.state);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                clicked = board::show_grid(ui, &self.state, &view);
            });
            if let Some(reason) = &self.state.last_rejection {
                ui.weak(reason.to_string());
            }
            if let Some(err) = &self.last_error {
                ui.colored_label(theme::WARNING, format!("{}: {}", err.headline(), err.message()));
            }
        });

        if self.state.show_results() {
            let me = view.counts.mine;
            egui::Window::new("Round over")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    match view.winner() {
                        Some(winner) => {
                            ui.heading(format!("{} wins!", winner.name));
                            ui.label(format!("{} blocks", winner.count));
                        }
                        None => {
                            ui.heading("Nobody claimed anything");
                        }
                    }
                    ui.label(format!("You held {me} blocks."));
                    ui.weak("Next round starting soon...");
                });
        }

        if let Some(block_id) = clicked {
            self.send(BackendCommand::Claim { block_id });
        }
        if new_round {
            self.send(BackendCommand::NewRound);
        }
    }
}

impl eframe::App for BlockConquestApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        match self.state.screen {
            Screen::Join => self.show_join_screen(ctx),
            Screen::Game => self.show_game_screen(ctx),
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for BlockConquestApp {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(BackendCommand::Shutdown);
    }
}
