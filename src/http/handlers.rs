use super::state::AppState;
use crate::answers::Question;
use crate::audio::{AudioContainer, CaptureState, RemoteMicrophoneBackend};
use crate::interview::{InterviewController, Notice, RunConfig, RunStats};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub interview_id: i64,
    pub applicant_id: i64,

    /// MIME types the client's recorder can produce, best first
    pub supported_mime_types: Vec<String>,

    /// Whether the client obtained microphone permission
    #[serde(default = "default_true")]
    pub microphone_permission: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SetAnswerRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub stats: RunStats,
    pub question: Option<Question>,
    pub answer_text: String,
    pub capture_state: CaptureState,
    pub notice: Option<Notice>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn status_response(session_id: &str, controller: &InterviewController) -> SessionStatusResponse {
    SessionStatusResponse {
        session_id: session_id.to_string(),
        stats: controller.stats(),
        question: controller.current_question().cloned(),
        answer_text: controller.answer_text().to_string(),
        capture_state: controller.capture_state(),
        notice: controller.notice().cloned(),
    }
}

async fn find_session(
    state: &AppState,
    session_id: &str,
) -> Option<Arc<Mutex<InterviewController>>> {
    state.sessions.read().await.get(session_id).cloned()
}

fn session_not_found(session_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session {} not found", session_id),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create an interview run session for one applicant
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let session_id = format!("run-{}", uuid::Uuid::new_v4());

    info!(
        "Creating session {} (interview {}, applicant {})",
        session_id, req.interview_id, req.applicant_id
    );

    let supported: Vec<AudioContainer> = req
        .supported_mime_types
        .iter()
        .filter_map(|m| AudioContainer::from_mime(m))
        .collect();

    let backend = Arc::new(RemoteMicrophoneBackend::new(
        supported,
        req.microphone_permission,
    ));

    let transcriber = match state.new_transcriber() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to build transcription client: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to build transcription client: {}", e),
                }),
            )
                .into_response();
        }
    };

    let config = RunConfig {
        interview: req.interview_id,
        applicant: req.applicant_id,
    };

    let controller = match InterviewController::new(
        config,
        backend,
        transcriber,
        Arc::clone(&state.questions),
        Arc::clone(&state.answers),
        state.hints.clone(),
    )
    .await
    {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to create session: {}", e),
                }),
            )
                .into_response();
        }
    };

    // Probe up front so the UI can grey out recording controls before
    // the first doomed upload.
    let available = controller.probe_service().await;
    if !available {
        warn!("Speech recognition service probe failed at session create");
    }

    let response = status_response(&session_id, &controller);

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), Arc::new(Mutex::new(controller)));
    }

    info!("Session {} created", session_id);

    (StatusCode::OK, Json(response)).into_response()
}

/// GET /sessions/:session_id
/// Current run status: question, buffer text, capture state, notices
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let controller = session.lock().await;
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// DELETE /sessions/:session_id
/// Tear down a session; any live capture releases its device tracks
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let removed = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match removed {
        Some(_) => {
            info!("Session {} deleted", session_id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/record/start
pub async fn start_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            controller.start_recording().await;
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/record/pause
pub async fn pause_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            controller.pause_recording().await;
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/record/resume
pub async fn resume_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            controller.resume_recording().await;
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/record/chunk
/// Raw recorded bytes from the client's recorder
pub async fn upload_chunk(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            if controller.ingest_chunk(body.to_vec()) {
                StatusCode::OK.into_response()
            } else {
                (
                    StatusCode::CONFLICT,
                    Json(ErrorResponse {
                        error: "Chunk rejected: no recording in progress".to_string(),
                    }),
                )
                    .into_response()
            }
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/record/stop
/// Finalize the take, normalize, transcribe, and accumulate
pub async fn stop_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            controller.stop_and_transcribe().await;
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// PUT /sessions/:session_id/answer
/// Manual edit of the current answer text
pub async fn set_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SetAnswerRequest>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            controller.set_manual_answer(req.text);
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/retry
/// "Retry speech recognition": clear the cached-unavailable state
pub async fn retry_transcription(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            controller.retry_transcription();
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/next
/// Flush the current answer and advance (submits on the last question)
pub async fn next_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            controller.advance().await;
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/notice/dismiss
pub async fn dismiss_notice(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => {
            let mut controller = session.lock().await;
            controller.dismiss_notice();
            (StatusCode::OK, Json(status_response(&session_id, &controller))).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
