// Contracts for the external CRUD collaborators.
//
// Question listing and answer persistence live in the recruiting
// backend; the voice pipeline only consumes them through these seams.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type InterviewId = i64;
pub type QuestionId = i64;
pub type ApplicantId = i64;
pub type AnswerId = i64;

/// One interview question, in presentation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub difficulty: Option<String>,
}

/// A previously persisted answer, used to resume a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingAnswer {
    pub id: AnswerId,
    pub text: String,
}

/// Payload for creating a new answer record.
#[derive(Debug, Clone, Serialize)]
pub struct NewAnswer {
    pub interview: InterviewId,
    pub question: QuestionId,
    pub applicant: ApplicantId,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum PersistError {
    /// The request never completed or the service was unreachable.
    #[error("answer service request failed: {0}")]
    Request(String),
    /// The service answered but rejected the call.
    #[error("answer service rejected the call: {0}")]
    Rejected(String),
}

#[async_trait::async_trait]
pub trait QuestionSource: Send + Sync {
    /// Ordered question list for one interview.
    async fn list_questions(&self, interview: InterviewId) -> Result<Vec<Question>, PersistError>;
}

#[async_trait::async_trait]
pub trait AnswerStore: Send + Sync {
    /// Existing answers for an applicant, keyed by question.
    async fn existing_answers(
        &self,
        applicant: ApplicantId,
    ) -> Result<HashMap<QuestionId, ExistingAnswer>, PersistError>;

    /// Create a new answer record; returns its id.
    async fn create_answer(&self, answer: NewAnswer) -> Result<AnswerId, PersistError>;

    /// Replace the text of an existing answer record.
    async fn update_answer(&self, id: AnswerId, text: &str) -> Result<(), PersistError>;
}
