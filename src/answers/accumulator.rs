// Per-question answer text buffers.
//
// Every successful transcription take appends into the question's
// buffer; manual typing overwrites it. Buffers remember the remote
// record id from the first successful save so later saves always update
// the same record instead of creating duplicates.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::store::{AnswerStore, ApplicantId, InterviewId, NewAnswer, PersistError, QuestionId};

/// Accumulated answer text plus its persistence linkage.
#[derive(Debug, Clone, Default)]
pub struct AnswerBuffer {
    text: String,
    remote_id: Option<i64>,
    dirty: bool,
}

impl AnswerBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn remote_id(&self) -> Option<i64> {
        self.remote_id
    }

    /// Whether the in-memory text differs from the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Maintains the append-only answer buffers for one applicant's run and
/// mediates with the answer persistence collaborator.
pub struct AnswerAccumulator {
    interview: InterviewId,
    applicant: ApplicantId,
    buffers: HashMap<QuestionId, AnswerBuffer>,
    store: Arc<dyn AnswerStore>,
}

impl AnswerAccumulator {
    pub fn new(
        interview: InterviewId,
        applicant: ApplicantId,
        store: Arc<dyn AnswerStore>,
    ) -> Self {
        Self {
            interview,
            applicant,
            buffers: HashMap::new(),
            store,
        }
    }

    /// Pre-fill buffers from answers already persisted for this
    /// applicant, so a resumed session keeps appending to the same
    /// remote records. Returns how many buffers were restored.
    pub async fn load_existing(&mut self) -> Result<usize, PersistError> {
        let existing = self.store.existing_answers(self.applicant).await?;
        let count = existing.len();

        for (question, answer) in existing {
            self.buffers.insert(
                question,
                AnswerBuffer {
                    text: answer.text,
                    remote_id: Some(answer.id),
                    dirty: false,
                },
            );
        }

        if count > 0 {
            info!("Restored {} existing answer(s)", count);
        }

        Ok(count)
    }

    /// Append transcribed text to a question's buffer.
    ///
    /// Non-empty existing text gets exactly one separating space before
    /// the new text; an empty buffer takes the text directly, so the
    /// first take never starts with whitespace.
    pub fn append(&mut self, question: QuestionId, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty transcription for question {}", question);
            return;
        }

        let buffer = self.buffers.entry(question).or_default();
        if buffer.text.is_empty() {
            buffer.text = text.to_string();
        } else {
            buffer.text.push(' ');
            buffer.text.push_str(text);
        }
        buffer.dirty = true;
    }

    /// Overwrite a question's buffer with manually typed text.
    ///
    /// Typing is authoritative: the append rule only applies to
    /// recording takes, never to explicit edits.
    pub fn set_manual(&mut self, question: QuestionId, text: impl Into<String>) {
        let text = text.into();
        let buffer = self.buffers.entry(question).or_default();
        if buffer.text != text {
            buffer.text = text;
            buffer.dirty = true;
        }
    }

    /// Current text for a question (empty string if nothing yet).
    pub fn text(&self, question: QuestionId) -> &str {
        self.buffers
            .get(&question)
            .map(|b| b.text.as_str())
            .unwrap_or("")
    }

    pub fn buffer(&self, question: QuestionId) -> Option<&AnswerBuffer> {
        self.buffers.get(&question)
    }

    /// Question ids whose buffers have unsaved changes.
    pub fn dirty_questions(&self) -> Vec<QuestionId> {
        let mut ids: Vec<QuestionId> = self
            .buffers
            .iter()
            .filter(|(_, b)| b.dirty)
            .map(|(q, _)| *q)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Persist a question's buffer: update when a remote id is already
    /// known, create (and capture the id) otherwise. Safe to call
    /// repeatedly with unchanged text. Returns whether a write was
    /// issued (an empty, never-saved buffer is skipped).
    pub async fn flush(&mut self, question: QuestionId) -> Result<bool, PersistError> {
        let Some(buffer) = self.buffers.get_mut(&question) else {
            debug!("Nothing to flush for question {}", question);
            return Ok(false);
        };

        if buffer.text.is_empty() && buffer.remote_id.is_none() {
            debug!("Skipping flush of empty answer for question {}", question);
            return Ok(false);
        }

        match buffer.remote_id {
            Some(id) => {
                self.store.update_answer(id, &buffer.text).await?;
                debug!("Updated answer {} for question {}", id, question);
            }
            None => {
                let id = self
                    .store
                    .create_answer(NewAnswer {
                        interview: self.interview,
                        question,
                        applicant: self.applicant,
                        text: buffer.text.clone(),
                    })
                    .await?;
                buffer.remote_id = Some(id);
                info!("Created answer {} for question {}", id, question);
            }
        }

        buffer.dirty = false;
        Ok(true)
    }

    /// Flush every buffer with unsaved changes. Stops at the first
    /// failure so the remaining buffers stay dirty for the next attempt.
    pub async fn flush_dirty(&mut self) -> Result<usize, PersistError> {
        let mut flushed = 0;
        for question in self.dirty_questions() {
            if self.flush(question).await? {
                flushed += 1;
            }
        }
        Ok(flushed)
    }
}
