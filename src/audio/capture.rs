// Microphone capture session state machine.
//
// One `CaptureSession` owns one microphone acquisition at a time and
// walks it through Idle -> Recording <-> Paused -> Stopping -> Processing
// and back to Idle, producing a single finalized blob per cycle. The
// product allows several cycles ("takes") per interview question; only
// the transcribed text survives a take, so the session just counts them.
//
// Device tracks are released on every exit path, including session drop,
// so a torn-down UI can never leak a live microphone.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::container::{AudioContainer, CapturedAudio, CONTAINER_CANDIDATES};

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Permission denied or no input device present.
    #[error("microphone unavailable: {0}")]
    MicrophoneUnavailable(String),
    /// No container from the candidate list is supported at runtime.
    #[error("no mutually supported recording format")]
    NoSupportedFormat,
    /// The underlying recorder failed mid-cycle.
    #[error("recorder failed: {0}")]
    Recorder(String),
}

/// Capture lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaptureState {
    Idle,
    Recording,
    Paused,
    Stopping,
    Processing,
    Error,
}

/// Constraints requested when acquiring the microphone.
#[derive(Debug, Clone)]
pub struct CaptureHints {
    pub sample_rate: u32,
    pub channels: u16,
    pub echo_cancellation: bool,
}

impl Default for CaptureHints {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            echo_cancellation: true,
        }
    }
}

/// A source of microphone recordings.
///
/// Implementations negotiate what they can record and hand out a control
/// handle per acquisition. The session drives the handle; chunk bytes are
/// fed to the session by the transport that owns the actual device.
#[async_trait::async_trait]
pub trait MicrophoneBackend: Send + Sync {
    /// Containers this backend can record, best first.
    fn supported_containers(&self) -> Vec<AudioContainer>;

    /// Acquire the device and begin recording in the given container.
    async fn open(
        &self,
        container: AudioContainer,
        hints: &CaptureHints,
    ) -> Result<Box<dyn MicrophoneControl>, CaptureError>;
}

/// Control handle for one live acquisition.
#[async_trait::async_trait]
pub trait MicrophoneControl: Send + Sync {
    async fn pause(&mut self) -> Result<(), CaptureError>;

    async fn resume(&mut self) -> Result<(), CaptureError>;

    /// Halt the recorder; returns any final buffered chunk.
    async fn stop(&mut self) -> Result<Option<Vec<u8>>, CaptureError>;

    /// Release the device tracks. Must be idempotent.
    fn release(&mut self);
}

/// State machine over a live microphone stream.
pub struct CaptureSession {
    backend: Arc<dyn MicrophoneBackend>,
    hints: CaptureHints,
    state: CaptureState,
    container: Option<AudioContainer>,
    chunks: Vec<Vec<u8>>,
    control: Option<Box<dyn MicrophoneControl>>,
    takes: u32,
}

impl CaptureSession {
    pub fn new(backend: Arc<dyn MicrophoneBackend>, hints: CaptureHints) -> Self {
        Self {
            backend,
            hints,
            state: CaptureState::Idle,
            container: None,
            chunks: Vec::new(),
            control: None,
            takes: 0,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Completed recording cycles since creation (or the last reset).
    pub fn take_count(&self) -> u32 {
        self.takes
    }

    /// Container negotiated for the current/last cycle.
    pub fn negotiated_container(&self) -> Option<AudioContainer> {
        self.container
    }

    pub fn reset_takes(&mut self) {
        self.takes = 0;
    }

    /// Begin a new recording cycle.
    ///
    /// Valid from Idle (or Error, so the controls stay usable after a
    /// failed cycle). Negotiates the first candidate container the
    /// backend supports and acquires the device.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if !matches!(self.state, CaptureState::Idle | CaptureState::Error) {
            warn!("Start ignored: capture session is {:?}", self.state);
            return Ok(());
        }

        let supported = self.backend.supported_containers();
        let container = CONTAINER_CANDIDATES
            .iter()
            .copied()
            .find(|c| supported.contains(c))
            .ok_or(CaptureError::NoSupportedFormat)?;

        let control = self.backend.open(container, &self.hints).await?;

        info!("Recording started ({})", container.mime_type());

        self.container = Some(container);
        self.chunks.clear();
        self.control = Some(control);
        self.state = CaptureState::Recording;

        Ok(())
    }

    /// Append a chunk of recorded bytes to the current cycle.
    ///
    /// Chunks are only accepted while Recording or Paused; recorders may
    /// emit a straggler after stop and those are rejected, never queued.
    /// Returns whether the chunk was accepted.
    pub fn ingest_chunk(&mut self, bytes: Vec<u8>) -> bool {
        match self.state {
            CaptureState::Recording | CaptureState::Paused => {
                self.chunks.push(bytes);
                true
            }
            state => {
                warn!("Rejecting late audio chunk in state {:?}", state);
                false
            }
        }
    }

    /// Pause the recorder. No-op unless Recording.
    pub async fn pause(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Recording {
            debug!("Pause ignored: capture session is {:?}", self.state);
            return Ok(());
        }

        if let Some(control) = &mut self.control {
            control.pause().await?;
        }
        self.state = CaptureState::Paused;
        debug!("Recording paused");

        Ok(())
    }

    /// Resume the recorder. No-op unless Paused.
    pub async fn resume(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Paused {
            debug!("Resume ignored: capture session is {:?}", self.state);
            return Ok(());
        }

        if let Some(control) = &mut self.control {
            control.resume().await?;
        }
        self.state = CaptureState::Recording;
        debug!("Recording resumed");

        Ok(())
    }

    /// Stop the current cycle and assemble the finalized blob.
    ///
    /// Idempotent against rapid double-invocation: outside Recording or
    /// Paused this returns `Ok(None)` without touching anything. Device
    /// tracks are released whether or not the recorder stops cleanly.
    pub async fn stop(&mut self) -> Result<Option<CapturedAudio>, CaptureError> {
        if !matches!(self.state, CaptureState::Recording | CaptureState::Paused) {
            debug!("Stop ignored: capture session is {:?}", self.state);
            return Ok(None);
        }

        self.state = CaptureState::Stopping;

        let Some(mut control) = self.control.take() else {
            self.state = CaptureState::Idle;
            return Ok(None);
        };

        let stop_result = control.stop().await;
        // Unconditional: tracks go away even when the recorder errored.
        control.release();

        let final_chunk = match stop_result {
            Ok(chunk) => chunk,
            Err(e) => {
                self.state = CaptureState::Error;
                return Err(e);
            }
        };

        self.state = CaptureState::Processing;

        if let Some(chunk) = final_chunk {
            if !chunk.is_empty() {
                self.chunks.push(chunk);
            }
        }

        let container = self.container.unwrap_or(AudioContainer::Wav);
        let bytes: Vec<u8> = self.chunks.drain(..).flatten().collect();

        self.takes += 1;
        self.state = CaptureState::Idle;

        if bytes.is_empty() {
            warn!("Recording cycle produced no audio");
            return Ok(None);
        }

        info!(
            "Recording stopped: take {} finalized ({} bytes, {:?})",
            self.takes,
            bytes.len(),
            container
        );

        Ok(Some(CapturedAudio::new(container, bytes)))
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(mut control) = self.control.take() {
            warn!("Capture session dropped while active; releasing device tracks");
            control.release();
        }
    }
}

/// Microphone backend driven by a remote capture client.
///
/// The actual recorder lives on the other side of the HTTP surface (the
/// interview UI); it declares up front which containers it can produce
/// and whether the user granted microphone permission, then streams its
/// chunks through the chunk-upload endpoint into the session.
pub struct RemoteMicrophoneBackend {
    supported: Vec<AudioContainer>,
    permission_granted: bool,
}

impl RemoteMicrophoneBackend {
    pub fn new(supported: Vec<AudioContainer>, permission_granted: bool) -> Self {
        Self {
            supported,
            permission_granted,
        }
    }
}

#[async_trait::async_trait]
impl MicrophoneBackend for RemoteMicrophoneBackend {
    fn supported_containers(&self) -> Vec<AudioContainer> {
        self.supported.clone()
    }

    async fn open(
        &self,
        container: AudioContainer,
        _hints: &CaptureHints,
    ) -> Result<Box<dyn MicrophoneControl>, CaptureError> {
        if !self.permission_granted {
            return Err(CaptureError::MicrophoneUnavailable(
                "microphone permission denied by client".to_string(),
            ));
        }

        debug!("Remote recorder acquired ({})", container.mime_type());

        Ok(Box::new(RemoteRecorderHandle { released: false }))
    }
}

/// Control handle for a remote recorder.
///
/// Pause/resume/stop are acknowledged locally; the remote client mirrors
/// the same transitions on its own recorder. Release just marks the
/// acquisition finished so a new cycle may begin.
struct RemoteRecorderHandle {
    released: bool,
}

#[async_trait::async_trait]
impl MicrophoneControl for RemoteRecorderHandle {
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
            debug!("Remote recorder tracks released");
        }
    }
}
