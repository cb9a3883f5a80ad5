// Audio format conversion for the transcription pipeline.
//
// The speech-recognition backend accepts one canonical payload shape:
// mono, 16-bit signed little-endian PCM in a WAV container. Capture
// backends usually hand us compressed Opus blobs instead, so this module
// decodes them and re-encodes the canonical form. Conversion is a pure
// function of the input bytes, which keeps retries idempotent.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::container::{AudioContainer, CapturedAudio};

/// Target sample rate for transcription payloads (what the STT model expects).
pub const CANONICAL_SAMPLE_RATE_HZ: u32 = 16000;

/// The canonical transcription payload: WAV bytes, mono, 16-bit PCM.
#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    /// Complete WAV file bytes (header + samples)
    pub bytes: Vec<u8>,
    /// Sample rate recorded in the WAV header
    pub sample_rate_hz: u32,
    /// Channel count recorded in the WAV header (always 1 after transcoding)
    pub channels: u16,
    /// Container tag, kept for upload content-type selection
    pub container: AudioContainer,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    /// No decoder is available for the captured container.
    #[error("no decoder available for {0:?}")]
    Unsupported(AudioContainer),
    /// The decoder rejected the bytes (corrupt or truncated capture).
    #[error("failed to decode captured audio: {0}")]
    DecodeFailed(String),
}

/// Converts captured blobs into the canonical transcription format.
#[derive(Debug, Clone)]
pub struct FormatConverter {
    target_sample_rate: u32,
}

impl Default for FormatConverter {
    fn default() -> Self {
        Self {
            target_sample_rate: CANONICAL_SAMPLE_RATE_HZ,
        }
    }
}

impl FormatConverter {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Convert a captured blob into the canonical mono 16-bit WAV payload.
    ///
    /// Blobs already in the canonical container are passed through with
    /// byte-identical output; only the header is read, for metadata.
    pub fn convert(&self, source: &CapturedAudio) -> Result<NormalizedAudio, ConvertError> {
        if source.container.is_canonical() {
            return self.passthrough(source);
        }

        let container = source.container;
        let (samples, sample_rate) = self.decode_channel_zero(source)?;

        if samples.is_empty() {
            return Err(ConvertError::DecodeFailed(
                "decoder produced no audio frames".to_string(),
            ));
        }

        let (samples, sample_rate) = self.downsample(samples, sample_rate);
        let bytes = encode_wav(&samples, sample_rate)
            .map_err(|e| ConvertError::DecodeFailed(e.to_string()))?;

        info!(
            "Converted {:?} blob: {} bytes -> {} bytes WAV ({} samples @ {}Hz mono)",
            container,
            source.len(),
            bytes.len(),
            samples.len(),
            sample_rate
        );

        Ok(NormalizedAudio {
            bytes,
            sample_rate_hz: sample_rate,
            channels: 1,
            container: AudioContainer::Wav,
        })
    }

    /// Fast path: read the header for metadata, return the bytes untouched.
    fn passthrough(&self, source: &CapturedAudio) -> Result<NormalizedAudio, ConvertError> {
        let reader = WavReader::new(Cursor::new(&source.bytes))
            .map_err(|e| ConvertError::DecodeFailed(format!("invalid WAV header: {}", e)))?;
        let spec = reader.spec();

        debug!(
            "Canonical blob passed through unchanged: {}Hz, {} channels, {} bytes",
            spec.sample_rate,
            spec.channels,
            source.len()
        );

        Ok(NormalizedAudio {
            bytes: source.bytes.clone(),
            sample_rate_hz: spec.sample_rate,
            channels: spec.channels,
            container: AudioContainer::Wav,
        })
    }

    /// Decode the compressed blob and keep channel 0 only.
    ///
    /// Multi-channel captures are downmixed by taking the first channel,
    /// not by averaging. Changing that policy would alter transcription
    /// behavior, so it stays as-is.
    fn decode_channel_zero(
        &self,
        source: &CapturedAudio,
    ) -> Result<(Vec<i16>, u32), ConvertError> {
        let stream = MediaSourceStream::new(
            Box::new(Cursor::new(source.bytes.clone())),
            Default::default(),
        );

        let mut hint = Hint::new();
        hint.with_extension(source.container.extension());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| match e {
                SymphoniaError::Unsupported(_) => ConvertError::Unsupported(source.container),
                other => ConvertError::DecodeFailed(other.to_string()),
            })?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                ConvertError::DecodeFailed("no decodable audio track found".to_string())
            })?;
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| match e {
                SymphoniaError::Unsupported(_) => ConvertError::Unsupported(source.container),
                other => ConvertError::DecodeFailed(other.to_string()),
            })?;

        let mut samples: Vec<i16> = Vec::new();
        let mut sample_rate = 0u32;
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break; // end of stream
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(ConvertError::DecodeFailed(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    let channels = spec.channels.count();

                    let buf = sample_buf.get_or_insert_with(|| {
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
                    });
                    buf.copy_interleaved_ref(decoded);

                    // Interleaved frames: channel 0 is every Nth sample.
                    for frame in buf.samples().chunks(channels) {
                        samples.push(quantize_sample(frame[0]));
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Malformed packet; skip it and keep decoding.
                    warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(ConvertError::DecodeFailed(e.to_string())),
            }
        }

        if sample_rate == 0 {
            return Err(ConvertError::DecodeFailed(
                "decoder never reported a sample rate".to_string(),
            ));
        }

        Ok((samples, sample_rate))
    }

    /// Decimate to the target rate when the source rate is a clean multiple.
    ///
    /// Rates below the target are kept as-is (no upsampling); the WAV
    /// header carries whatever rate the samples actually have.
    fn downsample(&self, samples: Vec<i16>, sample_rate: u32) -> (Vec<i16>, u32) {
        if sample_rate <= self.target_sample_rate || sample_rate % self.target_sample_rate != 0 {
            return (samples, sample_rate);
        }

        let ratio = (sample_rate / self.target_sample_rate) as usize;
        let decimated: Vec<i16> = samples.iter().step_by(ratio).copied().collect();

        debug!(
            "Decimated {}Hz -> {}Hz ({} -> {} samples)",
            sample_rate,
            self.target_sample_rate,
            samples.len(),
            decimated.len()
        );

        (decimated, self.target_sample_rate)
    }
}

/// Quantize a float sample to i16, hard-clamping out-of-range values so
/// they saturate instead of wrapping around.
fn quantize_sample(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Encode mono 16-bit samples as an in-memory WAV file.
fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
