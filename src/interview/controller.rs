use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use super::config::RunConfig;
use super::stats::{Notice, RunPhase, RunStats};
use crate::answers::{AnswerAccumulator, AnswerStore, Question, QuestionId, QuestionSource};
use crate::audio::{
    CaptureHints, CaptureSession, CaptureState, FormatConverter, MicrophoneBackend,
};
use crate::transcribe::{SpeechToText, TranscriptionPayload};

/// Orchestrates one applicant's linear walk through an interview's
/// questions: capture on the current question, transcription of each
/// finalized take, accumulation into the answer buffer, and
/// create-or-update persistence on navigation.
///
/// Every async boundary is caught and classified here; failures become
/// inline notices with an intact buffer, never an aborted run.
pub struct InterviewController {
    config: RunConfig,
    questions: Vec<Question>,
    index: usize,
    phase: RunPhase,
    capture: CaptureSession,
    converter: FormatConverter,
    transcriber: Arc<dyn SpeechToText>,
    answers: AnswerAccumulator,
    notice: Option<Notice>,
    started_at: chrono::DateTime<Utc>,
}

impl InterviewController {
    /// Load the question list and any existing answers, then start the
    /// run at the first question.
    pub async fn new(
        config: RunConfig,
        backend: Arc<dyn MicrophoneBackend>,
        transcriber: Arc<dyn SpeechToText>,
        questions: Arc<dyn QuestionSource>,
        store: Arc<dyn AnswerStore>,
        hints: CaptureHints,
    ) -> Result<Self> {
        info!(
            "Starting interview run: interview {} applicant {}",
            config.interview, config.applicant
        );

        let questions = questions
            .list_questions(config.interview)
            .await
            .context("Failed to load interview questions")?;
        anyhow::ensure!(!questions.is_empty(), "interview has no questions");

        let mut answers = AnswerAccumulator::new(config.interview, config.applicant, store);
        let restored = answers
            .load_existing()
            .await
            .context("Failed to load existing answers")?;

        info!(
            "Interview run ready: {} question(s), {} answer(s) restored",
            questions.len(),
            restored
        );

        Ok(Self {
            config,
            questions,
            index: 0,
            phase: RunPhase::InProgress,
            capture: CaptureSession::new(backend, hints),
            converter: FormatConverter::default(),
            transcriber,
            answers,
            notice: None,
            started_at: Utc::now(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn question_index(&self) -> usize {
        self.index
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// The question currently being answered (None once submitted).
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == RunPhase::Submitted {
            return None;
        }
        self.questions.get(self.index)
    }

    /// Buffer text for the current question.
    pub fn answer_text(&self) -> &str {
        self.answers.text(self.current_question_id())
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn current_question_id(&self) -> QuestionId {
        self.questions
            .get(self.index)
            .map(|q| q.id)
            .unwrap_or_default()
    }

    /// Begin a recording cycle for the current question.
    ///
    /// Device failures (permission denied, no microphone) are surfaced
    /// as a notice; the controls stay usable and previously accumulated
    /// text is unaffected.
    pub async fn start_recording(&mut self) {
        if self.phase == RunPhase::Submitted {
            warn!("Ignoring start_recording after submission");
            return;
        }

        match self.capture.start().await {
            Ok(()) => self.notice = None,
            Err(e) => {
                warn!("Could not start recording: {}", e);
                self.notice = Some(Notice::device(e.to_string()));
            }
        }
    }

    pub async fn pause_recording(&mut self) {
        if let Err(e) = self.capture.pause().await {
            warn!("Pause failed: {}", e);
            self.notice = Some(Notice::device(e.to_string()));
        }
    }

    pub async fn resume_recording(&mut self) {
        if let Err(e) = self.capture.resume().await {
            warn!("Resume failed: {}", e);
            self.notice = Some(Notice::device(e.to_string()));
        }
    }

    /// Feed recorded bytes into the active capture cycle. Returns
    /// whether the chunk was accepted.
    pub fn ingest_chunk(&mut self, bytes: Vec<u8>) -> bool {
        self.capture.ingest_chunk(bytes)
    }

    pub fn take_count(&self) -> u32 {
        self.capture.take_count()
    }

    pub fn reset_takes(&mut self) {
        self.capture.reset_takes();
    }

    /// Stop the current recording cycle, normalize the blob, transcribe
    /// it, and append the text to the current question's buffer.
    ///
    /// Conversion failure falls back to uploading the original blob.
    /// Transcription failure leaves the buffer untouched and raises a
    /// notice offering retry or manual entry.
    pub async fn stop_and_transcribe(&mut self) {
        let blob = match self.capture.stop().await {
            Ok(Some(blob)) => blob,
            Ok(None) => return,
            Err(e) => {
                error!("Failed to stop recording: {}", e);
                self.notice = Some(Notice::device(e.to_string()));
                return;
            }
        };

        let payload = match self.converter.convert(&blob) {
            Ok(normalized) => TranscriptionPayload::from(normalized),
            Err(e) => {
                // Recoverable: let the backend reject the original bytes
                // with a clear diagnostic instead of dead-ending here.
                warn!(
                    "Conversion failed ({}); uploading original {:?} blob",
                    e, blob.container
                );
                TranscriptionPayload::from(blob)
            }
        };

        match self.transcriber.transcribe(payload).await {
            Ok(text) => {
                let question = self.current_question_id();
                self.answers.append(question, &text);
                self.notice = None;
            }
            Err(e) => {
                error!("Transcription failed: {}", e);
                self.notice = Some(Notice::transcription(e.to_string()));
            }
        }
    }

    /// Overwrite the current question's answer with typed text. Manual
    /// edits are a first-class input path, not just a fallback display.
    pub fn set_manual_answer(&mut self, text: impl Into<String>) {
        if self.phase == RunPhase::Submitted {
            warn!("Ignoring manual edit after submission");
            return;
        }
        let question = self.current_question_id();
        self.answers.set_manual(question, text);
    }

    /// User-triggered escape from cached service unavailability. The
    /// next Stop will attempt a fresh transcription.
    pub fn retry_transcription(&mut self) {
        info!("Retry requested for speech recognition");
        self.transcriber.reset();
        self.notice = None;
    }

    /// Probe the speech-recognition service so the UI can reflect its
    /// state before the first upload.
    pub async fn probe_service(&self) -> bool {
        self.transcriber.probe().await
    }

    pub fn service_available(&self) -> bool {
        self.transcriber.is_available()
    }

    /// Flush the current answer and move forward.
    ///
    /// On an intermediate question a failed save raises a notice but
    /// does not block progression: the text stays in memory and the
    /// final flush retries it. On the last question all unsaved buffers
    /// are flushed and the run becomes `Submitted`; if that flush fails
    /// the run stays in progress so Finish can be retried.
    pub async fn advance(&mut self) {
        if self.phase == RunPhase::Submitted {
            warn!("Ignoring advance after submission");
            return;
        }

        let last = self.index + 1 >= self.questions.len();

        if last {
            match self.answers.flush_dirty().await {
                Ok(flushed) => {
                    info!("Interview run submitted ({} answer(s) flushed)", flushed);
                    self.phase = RunPhase::Submitted;
                    self.notice = None;
                }
                Err(e) => {
                    error!("Final save failed: {}", e);
                    self.notice = Some(Notice::save(e.to_string()));
                }
            }
            return;
        }

        let question = self.current_question_id();
        if let Err(e) = self.answers.flush(question).await {
            error!("Save failed for question {}: {}", question, e);
            self.notice = Some(Notice::save(e.to_string()));
        }

        self.index += 1;
        self.capture.reset_takes();
        info!(
            "Advanced to question {}/{}",
            self.index + 1,
            self.questions.len()
        );
    }

    pub fn stats(&self) -> RunStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        RunStats {
            phase: self.phase,
            question_index: self.index,
            question_count: self.questions.len(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            take_count: self.capture.take_count(),
            service_available: self.transcriber.is_available(),
        }
    }
}
