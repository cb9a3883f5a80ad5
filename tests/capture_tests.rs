// Integration tests for capture session resource handling
//
// These tests verify that microphone tracks are released on every exit
// path and that multiple takes accumulate correctly.

mod common;

use common::FakeMicrophoneBackend;
use interview_voice::{AudioContainer, CaptureHints, CaptureSession, CaptureState};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn session_with_backend() -> (CaptureSession, Arc<FakeMicrophoneBackend>) {
    let backend = Arc::new(FakeMicrophoneBackend::new(vec![
        AudioContainer::WebmOpus,
        AudioContainer::Wav,
    ]));
    let backend_dyn: Arc<dyn interview_voice::MicrophoneBackend> = backend.clone();
    let session = CaptureSession::new(backend_dyn, CaptureHints::default());
    (session, backend)
}

#[tokio::test]
async fn test_tracks_released_after_stop() {
    let (mut session, backend) = session_with_backend();

    session.start().await.unwrap();
    assert_eq!(backend.active_tracks.load(Ordering::SeqCst), 1);

    session.ingest_chunk(vec![1, 2, 3]);
    session.stop().await.unwrap();
    assert_eq!(backend.active_tracks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tracks_released_on_drop_without_stop() {
    let (mut session, backend) = session_with_backend();

    session.start().await.unwrap();
    session.ingest_chunk(vec![1, 2, 3]);
    assert_eq!(backend.active_tracks.load(Ordering::SeqCst), 1);

    // Teardown without an explicit Stop: no leaked microphone.
    drop(session);
    assert_eq!(backend.active_tracks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tracks_released_on_drop_while_paused() {
    let (mut session, backend) = session_with_backend();

    session.start().await.unwrap();
    session.pause().await.unwrap();
    assert_eq!(session.state(), CaptureState::Paused);

    drop(session);
    assert_eq!(backend.active_tracks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_multiple_takes_count_and_produce_separate_blobs() {
    let (mut session, backend) = session_with_backend();

    session.start().await.unwrap();
    session.ingest_chunk(vec![1]);
    let first = session.stop().await.unwrap().unwrap();

    session.start().await.unwrap();
    session.ingest_chunk(vec![2, 3]);
    let second = session.stop().await.unwrap().unwrap();

    assert_eq!(first.bytes, vec![1]);
    assert_eq!(second.bytes, vec![2, 3]);
    assert_eq!(session.take_count(), 2);
    assert_eq!(backend.active_tracks.load(Ordering::SeqCst), 0);

    session.reset_takes();
    assert_eq!(session.take_count(), 0);
}

#[tokio::test]
async fn test_stop_with_no_chunks_yields_no_blob() {
    let (mut session, _backend) = session_with_backend();

    session.start().await.unwrap();
    let blob = session.stop().await.unwrap();
    assert!(blob.is_none());

    // The cycle still completed.
    assert_eq!(session.take_count(), 1);
    assert_eq!(session.state(), CaptureState::Idle);
}
