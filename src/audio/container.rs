use serde::{Deserialize, Serialize};

/// Audio container formats the capture layer can produce.
///
/// The set is closed on purpose: the container is resolved once when a
/// recording starts, from the MIME type the capture backend negotiated,
/// and carried as a tag from then on. Nothing downstream re-parses MIME
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioContainer {
    /// Uncompressed PCM WAV - the canonical transcription format
    Wav,
    /// WebM container with Opus codec (typical Chromium capture output)
    WebmOpus,
    /// Ogg container with Opus codec (typical Firefox capture output)
    OggOpus,
}

/// Container preference order used when negotiating a recording format.
///
/// Compressed-with-Opus first (smaller uploads from the capture side),
/// plain WAV as the universally available fallback.
pub const CONTAINER_CANDIDATES: [AudioContainer; 3] = [
    AudioContainer::WebmOpus,
    AudioContainer::OggOpus,
    AudioContainer::Wav,
];

impl AudioContainer {
    /// Resolve a MIME type string into a container tag.
    ///
    /// Codec parameters are accepted but ignored ("audio/webm;codecs=opus"
    /// and "audio/webm" resolve the same way).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let base = mime.split(';').next().unwrap_or("").trim();
        match base {
            "audio/wav" | "audio/wave" | "audio/x-wav" => Some(Self::Wav),
            "audio/webm" => Some(Self::WebmOpus),
            "audio/ogg" => Some(Self::OggOpus),
            _ => None,
        }
    }

    /// The MIME type advertised for this container.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::WebmOpus => "audio/webm;codecs=opus",
            Self::OggOpus => "audio/ogg;codecs=opus",
        }
    }

    /// File extension hint handed to the decoder's format probe.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::WebmOpus => "webm",
            Self::OggOpus => "ogg",
        }
    }

    /// Whether blobs in this container already satisfy the canonical
    /// uncompressed shape and can skip transcoding.
    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Wav)
    }
}

/// A finalized recording blob: the raw bytes a capture cycle produced,
/// tagged with the container that was negotiated at start.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub container: AudioContainer,
    pub bytes: Vec<u8>,
}

impl CapturedAudio {
    pub fn new(container: AudioContainer, bytes: Vec<u8>) -> Self {
        Self { container, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
