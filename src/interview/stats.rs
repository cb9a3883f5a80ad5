use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the run currently is in its lifecycle.
///
/// Progression is strictly linear: once `Submitted`, nothing mutates
/// any answer again. There is no "go back" phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    InProgress,
    Submitted,
}

/// Which pipeline stage an inline notice came from. The UI maps this to
/// the concrete next action it offers (retry recording, retry speech
/// recognition / type manually, retry save).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Device,
    Transcription,
    Save,
}

/// A dismissible inline error banner.
///
/// Failures never dead-end the run; a notice always pairs the
/// explanation with a recoverable state (the buffer text is intact and
/// the controls stay usable).
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn device(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Device,
            message: message.into(),
        }
    }

    pub fn transcription(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Transcription,
            message: message.into(),
        }
    }

    pub fn save(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Save,
            message: message.into(),
        }
    }
}

/// Statistics about an interview run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Current run phase
    pub phase: RunPhase,

    /// Zero-based index of the current question
    pub question_index: usize,

    /// Total number of questions in the interview
    pub question_count: usize,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Completed recording takes on the current question
    pub take_count: u32,

    /// Whether the speech-recognition service is believed reachable
    pub service_available: bool,
}
