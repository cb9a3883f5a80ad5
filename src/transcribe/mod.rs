//! Remote speech-recognition client
//!
//! This module owns everything between a finalized audio payload and the
//! transcribed text: availability probing, upload with bearer auth,
//! failure classification, and the latched availability flag that stops
//! repeated doomed uploads until an explicit retry.

mod client;

pub use client::{
    HttpTranscriptionClient, ServiceAvailability, SpeechToText, TranscribeError,
    TranscriptionPayload,
};
