//! UI layer for desktop GUI: app shell, board panels, and theme helpers.

pub mod app;
pub mod board;
pub mod theme;

pub use app::{BlockConquestApp, StartupConfig};
