//! Backend worker thread: owns the tokio runtime and the game session.

pub mod commands;
pub mod runtime;
