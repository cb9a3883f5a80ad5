// Speech-recognition service client.
//
// The remote service exposes a HEAD existence probe and a POST endpoint
// taking the raw audio payload. Failures are classified so the interview
// UI can show an actionable message, and conclusive failures (404, 5xx,
// network) latch the shared availability flag so we stop issuing doomed
// uploads until the operator explicitly retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::audio::{CapturedAudio, NormalizedAudio};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscribeError {
    /// Cached-unavailable short circuit; no request was made.
    #[error("speech recognition service is unavailable")]
    ServiceUnavailable,
    /// The transcription endpoint does not exist (HTTP 404).
    #[error("speech recognition endpoint not found")]
    NotFound,
    /// The service failed internally (HTTP 5xx).
    #[error("speech recognition service error (HTTP {0})")]
    ServerError(u16),
    /// The request exceeded the client-enforced deadline.
    #[error("speech recognition request timed out")]
    Timeout,
    /// The request never completed (DNS, refused connection, reset).
    #[error("network error reaching speech recognition service: {0}")]
    NetworkError(String),
    /// Anything else, including malformed response bodies.
    #[error("unexpected speech recognition response: {0}")]
    Unknown(String),
}

impl TranscribeError {
    /// Whether this failure indicates the service itself is down rather
    /// than one request going wrong. A timeout may be request-specific,
    /// so it does not latch the availability flag.
    pub fn poisons_availability(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::ServerError(_) | Self::NetworkError(_)
        )
    }
}

/// Shared availability flag for the speech-recognition service.
///
/// Optimistic until a conclusive failure latches it false. Only an
/// explicit user-triggered `reset()` flips it back: the flag reflects
/// infrastructure health, so it is shared across every question in a
/// session rather than owned per-question. Handles clone cheaply and
/// independent instances never leak state into each other.
#[derive(Debug, Clone)]
pub struct ServiceAvailability {
    available: Arc<AtomicBool>,
}

impl Default for ServiceAvailability {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceAvailability {
    pub fn new() -> Self {
        Self {
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn mark_unavailable(&self) {
        self.available.store(false, Ordering::SeqCst);
    }

    /// Back to optimistic. The only path out of cached-unavailable.
    pub fn reset(&self) {
        self.available.store(true, Ordering::SeqCst);
    }
}

/// Raw upload body plus its content type.
///
/// Normally the canonical WAV, but when conversion fails the original
/// compressed blob is sent as-is and the backend gets to reject it with
/// a clear diagnostic instead of the user hitting a dead end locally.
#[derive(Debug, Clone)]
pub struct TranscriptionPayload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl From<NormalizedAudio> for TranscriptionPayload {
    fn from(audio: NormalizedAudio) -> Self {
        Self {
            bytes: audio.bytes,
            content_type: "audio/wav",
        }
    }
}

impl From<CapturedAudio> for TranscriptionPayload {
    fn from(blob: CapturedAudio) -> Self {
        Self {
            content_type: blob.container.mime_type(),
            bytes: blob.bytes,
        }
    }
}

/// Speech-to-text seam the interview controller talks through.
#[async_trait::async_trait]
pub trait SpeechToText: Send + Sync {
    /// Lightweight existence check. Never errors: a failed probe just
    /// means "treat as unavailable".
    async fn probe(&self) -> bool;

    /// Upload a payload and return the transcribed text.
    ///
    /// Never partially applies anything: on failure the caller's text
    /// buffers are untouched and fallback is the caller's decision.
    async fn transcribe(&self, payload: TranscriptionPayload) -> Result<String, TranscribeError>;

    /// Clear the cached-unavailable state.
    fn reset(&self);

    fn is_available(&self) -> bool;
}

/// Successful response body: `{"success": true, "data": {"transcription": "..."}}`.
#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    success: bool,
    data: Option<TranscriptionData>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionData {
    transcription: String,
}

/// HTTP client for the remote speech-recognition service.
pub struct HttpTranscriptionClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: String,
    availability: ServiceAvailability,
}

impl HttpTranscriptionClient {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            availability: ServiceAvailability::new(),
        })
    }

    /// Share this client's availability flag (e.g. with a status surface).
    pub fn availability(&self) -> ServiceAvailability {
        self.availability.clone()
    }

    fn classify_status(status: u16) -> TranscribeError {
        match status {
            404 => TranscribeError::NotFound,
            500..=599 => TranscribeError::ServerError(status),
            other => TranscribeError::Unknown(format!("HTTP {}", other)),
        }
    }

    fn classify_request_error(error: &reqwest::Error) -> TranscribeError {
        if error.is_timeout() {
            TranscribeError::Timeout
        } else {
            TranscribeError::NetworkError(error.to_string())
        }
    }

    fn record_failure(&self, error: &TranscribeError) {
        if error.poisons_availability() {
            warn!("Marking speech recognition service unavailable: {}", error);
            self.availability.mark_unavailable();
        }
    }
}

#[async_trait::async_trait]
impl SpeechToText for HttpTranscriptionClient {
    async fn probe(&self) -> bool {
        let url = format!("{}/availability-check", self.base_url);

        match self.http.head(&url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Speech recognition service probe OK");
                // A good probe does not clear a latched-unavailable flag;
                // only the explicit reset action does.
                self.availability.is_available()
            }
            Ok(response) => {
                warn!(
                    "Speech recognition service probe failed: HTTP {}",
                    response.status()
                );
                self.availability.mark_unavailable();
                false
            }
            Err(e) => {
                warn!("Speech recognition service probe failed: {}", e);
                self.availability.mark_unavailable();
                false
            }
        }
    }

    async fn transcribe(&self, payload: TranscriptionPayload) -> Result<String, TranscribeError> {
        if !self.availability.is_available() {
            debug!("Short-circuiting transcription: service marked unavailable");
            return Err(TranscribeError::ServiceUnavailable);
        }

        let url = format!("{}/transcribe", self.base_url);

        info!(
            "Uploading {} bytes ({}) for transcription",
            payload.bytes.len(),
            payload.content_type
        );

        let response = match self
            .http
            .post(&url)
            .bearer_auth(&self.auth_token)
            .header(reqwest::header::CONTENT_TYPE, payload.content_type)
            .body(payload.bytes)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let classified = Self::classify_request_error(&e);
                error!("Transcription request failed: {}", classified);
                self.record_failure(&classified);
                return Err(classified);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let classified = Self::classify_status(status.as_u16());
            error!("Transcription rejected: {}", classified);
            self.record_failure(&classified);
            return Err(classified);
        }

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::Unknown(e.to_string()))?;

        if !body.success {
            return Err(TranscribeError::Unknown(
                "service reported failure".to_string(),
            ));
        }

        let text = body
            .data
            .map(|d| d.transcription)
            .ok_or_else(|| TranscribeError::Unknown("missing transcription field".to_string()))?;

        info!("Transcription succeeded: {} chars", text.len());

        Ok(text)
    }

    fn reset(&self) {
        info!("Resetting speech recognition availability");
        self.availability.reset();
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            HttpTranscriptionClient::classify_status(404),
            TranscribeError::NotFound
        );
        assert_eq!(
            HttpTranscriptionClient::classify_status(500),
            TranscribeError::ServerError(500)
        );
        assert_eq!(
            HttpTranscriptionClient::classify_status(503),
            TranscribeError::ServerError(503)
        );
        assert!(matches!(
            HttpTranscriptionClient::classify_status(418),
            TranscribeError::Unknown(_)
        ));
    }

    #[test]
    fn test_timeout_does_not_poison_availability() {
        assert!(!TranscribeError::Timeout.poisons_availability());
        assert!(!TranscribeError::Unknown("?".to_string()).poisons_availability());
        assert!(!TranscribeError::ServiceUnavailable.poisons_availability());
    }

    #[test]
    fn test_conclusive_failures_poison_availability() {
        assert!(TranscribeError::NotFound.poisons_availability());
        assert!(TranscribeError::ServerError(502).poisons_availability());
        assert!(TranscribeError::NetworkError("refused".to_string()).poisons_availability());
    }

    #[test]
    fn test_availability_defaults_optimistic() {
        let availability = ServiceAvailability::new();
        assert!(availability.is_available());

        availability.mark_unavailable();
        assert!(!availability.is_available());

        availability.reset();
        assert!(availability.is_available());
    }

    #[test]
    fn test_availability_instances_are_independent() {
        let a = ServiceAvailability::new();
        let b = ServiceAvailability::new();
        a.mark_unavailable();
        assert!(b.is_available());
    }
}
