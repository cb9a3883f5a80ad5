// Integration tests for answer accumulation and persistence
//
// These tests verify the append/manual-edit rules and the
// create-or-update contract against the answer store.

mod common;

use common::InMemoryAnswerStore;
use interview_voice::{AnswerAccumulator, ExistingAnswer};
use std::sync::Arc;

fn accumulator(store: Arc<InMemoryAnswerStore>) -> AnswerAccumulator {
    AnswerAccumulator::new(1, 42, store)
}

#[test]
fn test_append_inserts_single_separating_space() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(store);

    answers.append(7, "a");
    answers.append(7, "b");

    assert_eq!(answers.text(7), "a b");
}

#[test]
fn test_first_append_has_no_leading_space() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(store);

    answers.append(7, "hello world");
    assert_eq!(answers.text(7), "hello world");
}

#[test]
fn test_append_trims_transcription_whitespace() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(store);

    answers.append(7, "  foo ");
    answers.append(7, " bar");
    assert_eq!(answers.text(7), "foo bar");
}

#[test]
fn test_empty_append_is_ignored() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(store);

    answers.append(7, "   ");
    assert_eq!(answers.text(7), "");
    answers.append(7, "x");
    answers.append(7, "");
    assert_eq!(answers.text(7), "x");
}

#[test]
fn test_manual_overwrite_is_exempt_from_append_rule() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(store);

    answers.set_manual(7, "x");
    answers.append(7, "y");
    assert_eq!(answers.text(7), "x y");

    // Manual edit replaces, never concatenates.
    answers.set_manual(7, "z");
    assert_eq!(answers.text(7), "z");
}

#[test]
fn test_buffers_are_keyed_by_question() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(store);

    answers.append(1, "first");
    answers.append(2, "second");

    assert_eq!(answers.text(1), "first");
    assert_eq!(answers.text(2), "second");
}

#[tokio::test]
async fn test_flush_creates_then_updates() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(Arc::clone(&store));

    answers.append(7, "take one");
    assert!(answers.flush(7).await.unwrap());

    assert_eq!(store.create_count(), 1);
    assert_eq!(store.update_count(), 0);
    let remote_id = answers.buffer(7).unwrap().remote_id().unwrap();

    // Second flush in a row: an update against the captured id, never a
    // second create.
    assert!(answers.flush(7).await.unwrap());
    assert_eq!(store.create_count(), 1);
    assert_eq!(store.update_count(), 1);

    answers.append(7, "take two");
    assert!(answers.flush(7).await.unwrap());
    assert_eq!(store.create_count(), 1);
    assert_eq!(store.update_count(), 2);
    assert_eq!(store.text_of(remote_id).unwrap(), "take one take two");
}

#[tokio::test]
async fn test_flush_of_empty_unsaved_buffer_is_skipped() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(Arc::clone(&store));

    assert!(!answers.flush(7).await.unwrap());
    assert_eq!(store.create_count(), 0);
}

#[tokio::test]
async fn test_flush_failure_keeps_buffer_dirty() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(Arc::clone(&store));

    answers.append(7, "precious text");
    store.set_fail_writes(true);
    assert!(answers.flush(7).await.is_err());

    // Text survives in memory and the next attempt retries the create.
    assert_eq!(answers.text(7), "precious text");
    assert!(answers.buffer(7).unwrap().is_dirty());

    store.set_fail_writes(false);
    assert!(answers.flush(7).await.unwrap());
    assert_eq!(store.create_count(), 1);
    assert!(!answers.buffer(7).unwrap().is_dirty());
}

#[tokio::test]
async fn test_load_existing_prefills_and_reuses_remote_ids() {
    let store = Arc::new(InMemoryAnswerStore::new().with_existing(
        7,
        ExistingAnswer {
            id: 900,
            text: "earlier answer".to_string(),
        },
    ));
    let mut answers = accumulator(Arc::clone(&store));

    let restored = answers.load_existing().await.unwrap();
    assert_eq!(restored, 1);
    assert_eq!(answers.text(7), "earlier answer");

    answers.append(7, "more");
    assert!(answers.flush(7).await.unwrap());

    // The restored id is updated; no duplicate record appears.
    assert_eq!(store.create_count(), 0);
    assert_eq!(store.update_count(), 1);
    assert_eq!(store.text_of(900).unwrap(), "earlier answer more");
}

#[tokio::test]
async fn test_flush_dirty_covers_every_unsaved_buffer() {
    let store = Arc::new(InMemoryAnswerStore::new());
    let mut answers = accumulator(Arc::clone(&store));

    answers.append(1, "one");
    answers.append(2, "two");
    answers.append(3, "three");
    answers.flush(2).await.unwrap();

    let flushed = answers.flush_dirty().await.unwrap();
    assert_eq!(flushed, 2);
    assert_eq!(store.create_count(), 3);
}
