//! Interview run orchestration
//!
//! This module provides the `InterviewController` that manages:
//! - The linear walk through an interview's question list
//! - Recording cycles on the current question
//! - Format normalization and transcription of finalized takes
//! - Answer accumulation and create-or-update persistence
//! - Inline error notices with recoverable next actions

mod config;
mod controller;
mod stats;

pub use config::RunConfig;
pub use controller::InterviewController;
pub use stats::{Notice, NoticeKind, RunPhase, RunStats};
