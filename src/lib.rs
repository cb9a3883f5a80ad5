pub mod answers;
pub mod audio;
pub mod config;
pub mod http;
pub mod interview;
pub mod transcribe;

pub use answers::{
    AnswerAccumulator, AnswerBuffer, AnswerStore, ExistingAnswer, NewAnswer, PersistError,
    Question, QuestionSource, RestAnswerStore, RestQuestionSource,
};
pub use audio::{
    AudioContainer, CaptureError, CaptureHints, CaptureSession, CaptureState, CapturedAudio,
    ConvertError, FormatConverter, MicrophoneBackend, MicrophoneControl, NormalizedAudio,
    RemoteMicrophoneBackend,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use interview::{InterviewController, Notice, NoticeKind, RunConfig, RunPhase, RunStats};
pub use transcribe::{
    HttpTranscriptionClient, ServiceAvailability, SpeechToText, TranscribeError,
    TranscriptionPayload,
};
