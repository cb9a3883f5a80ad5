use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use interview_voice::{
    create_router, AppState, CaptureHints, Config, RestAnswerStore, RestQuestionSource,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "interview-voice", about = "Voice-answer capture and transcription service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/interview-voice")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);
    info!("Transcription service: {}", cfg.transcription.base_url);
    info!("Answer API: {}", cfg.answers.base_url);

    let questions = Arc::new(RestQuestionSource::new(&cfg.answers.base_url)?);
    let answers = Arc::new(RestAnswerStore::new(&cfg.answers.base_url)?);

    let hints = CaptureHints {
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
        echo_cancellation: true,
    };

    let state = AppState::new(cfg.transcription.clone(), questions, answers, hints);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
