// Shared test doubles for the voice pipeline.
//
// Scripted fakes implement the backend/store/transcriber seams so the
// capture session and the interview controller can be driven end to end
// without a device, a speech service, or a recruiting backend.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use interview_voice::{
    AnswerStore, AudioContainer, CaptureError, CaptureHints, ExistingAnswer, MicrophoneBackend,
    MicrophoneControl, NewAnswer, PersistError, Question, QuestionSource, ServiceAvailability,
    SpeechToText, TranscribeError, TranscriptionPayload,
};

/// Build a small mono 16kHz WAV blob for use as recorded bytes.
pub fn make_wav(samples: &[i16]) -> Vec<u8> {
    make_wav_with(samples, 16000, 1)
}

pub fn make_wav_with(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn questions(count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| Question {
            id: (i + 1) as i64,
            text: format!("Question {}", i + 1),
            difficulty: Some("medium".to_string()),
        })
        .collect()
}

/// Microphone backend whose acquisitions count live device tracks.
pub struct FakeMicrophoneBackend {
    supported: Vec<AudioContainer>,
    grant_permission: bool,
    pub active_tracks: Arc<AtomicUsize>,
}

impl FakeMicrophoneBackend {
    pub fn new(supported: Vec<AudioContainer>) -> Self {
        Self {
            supported,
            grant_permission: true,
            active_tracks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn without_permission(mut self) -> Self {
        self.grant_permission = false;
        self
    }
}

#[async_trait::async_trait]
impl MicrophoneBackend for FakeMicrophoneBackend {
    fn supported_containers(&self) -> Vec<AudioContainer> {
        self.supported.clone()
    }

    async fn open(
        &self,
        _container: AudioContainer,
        _hints: &CaptureHints,
    ) -> Result<Box<dyn MicrophoneControl>, CaptureError> {
        if !self.grant_permission {
            return Err(CaptureError::MicrophoneUnavailable(
                "permission denied".to_string(),
            ));
        }

        self.active_tracks.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeControl {
            tracks: Arc::clone(&self.active_tracks),
            released: false,
        }))
    }
}

struct FakeControl {
    tracks: Arc<AtomicUsize>,
    released: bool,
}

#[async_trait::async_trait]
impl MicrophoneControl for FakeControl {
    async fn pause(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn stop(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        Ok(None)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeControl {
    fn drop(&mut self) {
        self.release();
    }
}

/// Speech-to-text double that plays back a script of results and
/// mirrors the real client's availability semantics.
pub struct FakeSpeechToText {
    availability: ServiceAvailability,
    script: Mutex<VecDeque<Result<String, TranscribeError>>>,
    pub upload_count: AtomicUsize,
}

impl FakeSpeechToText {
    pub fn scripted(script: Vec<Result<String, TranscribeError>>) -> Self {
        Self {
            availability: ServiceAvailability::new(),
            script: Mutex::new(script.into_iter().collect()),
            upload_count: AtomicUsize::new(0),
        }
    }

    pub fn uploads(&self) -> usize {
        self.upload_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeechToText for FakeSpeechToText {
    async fn probe(&self) -> bool {
        self.availability.is_available()
    }

    async fn transcribe(&self, _payload: TranscriptionPayload) -> Result<String, TranscribeError> {
        if !self.availability.is_available() {
            return Err(TranscribeError::ServiceUnavailable);
        }

        self.upload_count.fetch_add(1, Ordering::SeqCst);

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TranscribeError::Unknown("script exhausted".to_string())));

        if let Err(e) = &next {
            if e.poisons_availability() {
                self.availability.mark_unavailable();
            }
        }

        next
    }

    fn reset(&self) {
        self.availability.reset();
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}

/// Static question list source.
pub struct StaticQuestions(pub Vec<Question>);

#[async_trait::async_trait]
impl QuestionSource for StaticQuestions {
    async fn list_questions(&self, _interview: i64) -> Result<Vec<Question>, PersistError> {
        Ok(self.0.clone())
    }
}

/// In-memory answer store with injectable failures and call counters.
#[derive(Default)]
pub struct InMemoryAnswerStore {
    next_id: AtomicI64,
    pub records: Mutex<HashMap<i64, (i64, String)>>,
    pub existing: Mutex<HashMap<i64, ExistingAnswer>>,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub fail_writes: std::sync::atomic::AtomicBool,
}

impl InMemoryAnswerStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            ..Default::default()
        }
    }

    pub fn with_existing(self, question: i64, answer: ExistingAnswer) -> Self {
        self.existing.lock().unwrap().insert(question, answer);
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn text_of(&self, answer_id: i64) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(&answer_id)
            .map(|(_, text)| text.clone())
    }

    fn check_writes(&self) -> Result<(), PersistError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(PersistError::Request("injected save failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl AnswerStore for InMemoryAnswerStore {
    async fn existing_answers(
        &self,
        _applicant: i64,
    ) -> Result<HashMap<i64, ExistingAnswer>, PersistError> {
        Ok(self.existing.lock().unwrap().clone())
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<i64, PersistError> {
        self.check_writes()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert(id, (answer.question, answer.text));
        Ok(id)
    }

    async fn update_answer(&self, id: i64, text: &str) -> Result<(), PersistError> {
        self.check_writes()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some((_, stored)) => {
                *stored = text.to_string();
                Ok(())
            }
            None => {
                // Updates for ids restored from `existing` answers.
                records.insert(id, (0, text.to_string()));
                Ok(())
            }
        }
    }
}
