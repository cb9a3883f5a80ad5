pub mod capture;
pub mod container;
pub mod convert;

pub use capture::{
    CaptureError, CaptureHints, CaptureSession, CaptureState, MicrophoneBackend,
    MicrophoneControl, RemoteMicrophoneBackend,
};
pub use container::{AudioContainer, CapturedAudio, CONTAINER_CANDIDATES};
pub use convert::{ConvertError, FormatConverter, NormalizedAudio, CANONICAL_SAMPLE_RATE_HZ};
