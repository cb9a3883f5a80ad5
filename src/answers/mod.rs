//! Answer accumulation and persistence
//!
//! Per-question text buffers fed by transcription takes and manual
//! edits, plus the seams to the recruiting backend's question and
//! answer APIs.

mod accumulator;
mod rest;
mod store;

pub use accumulator::{AnswerAccumulator, AnswerBuffer};
pub use rest::{RestAnswerStore, RestQuestionSource};
pub use store::{
    AnswerId, AnswerStore, ApplicantId, ExistingAnswer, InterviewId, NewAnswer, PersistError,
    Question, QuestionId, QuestionSource,
};
