//! HTTP API for the interview voice pipeline
//!
//! This module exposes the recording controls and navigation as a REST
//! surface for the interview UI:
//! - POST /sessions - Create an interview run
//! - POST /sessions/:id/record/{start,pause,resume,chunk,stop} - Capture control
//! - PUT /sessions/:id/answer - Manual answer edit
//! - POST /sessions/:id/retry - Retry speech recognition
//! - POST /sessions/:id/next - Flush and advance (submits on last question)
//! - GET /sessions/:id - Run status
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
