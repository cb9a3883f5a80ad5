use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{Mutex, RwLock};

use crate::answers::{AnswerStore, QuestionSource};
use crate::audio::CaptureHints;
use crate::config::TranscriptionConfig;
use crate::interview::InterviewController;
use crate::transcribe::{HttpTranscriptionClient, SpeechToText};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active interview sessions (session_id → controller)
    pub sessions: Arc<RwLock<HashMap<String, Arc<Mutex<InterviewController>>>>>,

    /// Speech-recognition service settings
    pub transcription: TranscriptionConfig,

    /// Question listing collaborator
    pub questions: Arc<dyn QuestionSource>,

    /// Answer persistence collaborator
    pub answers: Arc<dyn AnswerStore>,

    /// Microphone constraints requested for every capture
    pub hints: CaptureHints,
}

impl AppState {
    pub fn new(
        transcription: TranscriptionConfig,
        questions: Arc<dyn QuestionSource>,
        answers: Arc<dyn AnswerStore>,
        hints: CaptureHints,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            transcription,
            questions,
            answers,
            hints,
        }
    }

    /// Build a transcription client for one session.
    ///
    /// Each session gets its own client so the cached availability flag
    /// is scoped to that session, not shared process-wide.
    pub fn new_transcriber(&self) -> Result<Arc<dyn SpeechToText>> {
        let client = HttpTranscriptionClient::new(
            &self.transcription.base_url,
            &self.transcription.auth_token,
            Duration::from_secs(self.transcription.request_timeout_secs),
        )?;
        Ok(Arc::new(client))
    }
}
