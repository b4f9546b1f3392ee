//! Streaming WAV framing
//!
//! Fragments are emitted while the take is still growing, so the header
//! written with the first fragment cannot know the final sizes. The RIFF
//! size carries `0xFFFF_FFFF` and the data size the largest whole number
//! of frames that fits in a `u32`; readers stop at the end of the buffer.
//! Concatenating the fragments of a take yields one playable file.

use std::io::{Cursor, ErrorKind as IoErrorKind};

use thiserror::Error;

/// Unknown-length marker for the RIFF chunk size
const STREAMING_SIZE: u32 = u32::MAX;
const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Size of the header produced by `stream_header`
pub const HEADER_LEN: usize = 44;

/// Layout of 16-bit PCM samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmSpec {
    fn block_align(&self) -> u16 {
        self.channels * (BITS_PER_SAMPLE / 8)
    }

    fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }

    /// Unknown-length data size, kept a multiple of the frame size
    fn streaming_data_size(&self) -> u32 {
        let align = u32::from(self.block_align().max(1));
        STREAMING_SIZE - STREAMING_SIZE % align
    }
}

/// Error reading a WAV buffer
#[derive(Debug, Error)]
pub enum WavError {
    #[error("Invalid WAV data: {0}")]
    Read(#[from] hound::Error),

    #[error("Unsupported WAV encoding: {bits}-bit {format}")]
    Unsupported { format: &'static str, bits: u16 },
}

/// Decoded 16-bit PCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPcm {
    pub spec: PcmSpec,
    pub samples: Vec<i16>,
}

/// Header for a WAV stream of unknown length
pub fn stream_header(spec: PcmSpec) -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&STREAMING_SIZE.to_le_bytes());
    header.extend_from_slice(b"WAVE");

    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&16u32.to_le_bytes());
    header.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    header.extend_from_slice(&spec.channels.to_le_bytes());
    header.extend_from_slice(&spec.sample_rate.to_le_bytes());
    header.extend_from_slice(&spec.byte_rate().to_le_bytes());
    header.extend_from_slice(&spec.block_align().to_le_bytes());
    header.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    header.extend_from_slice(b"data");
    header.extend_from_slice(&spec.streaming_data_size().to_le_bytes());
    header
}

/// Little-endian sample bytes
pub fn encode_samples(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Decode a 16-bit PCM WAV buffer, streaming or finalized.
///
/// A data chunk that claims more samples than the buffer holds ends at
/// the last complete sample.
pub fn decode_stream(bytes: &[u8]) -> Result<DecodedPcm, WavError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let wav_spec = reader.spec();

    if wav_spec.sample_format != hound::SampleFormat::Int
        || wav_spec.bits_per_sample != BITS_PER_SAMPLE
    {
        return Err(WavError::Unsupported {
            format: match wav_spec.sample_format {
                hound::SampleFormat::Int => "integer",
                hound::SampleFormat::Float => "float",
            },
            bits: wav_spec.bits_per_sample,
        });
    }

    let mut samples = Vec::new();
    for sample in reader.into_samples::<i16>() {
        match sample {
            Ok(sample) => samples.push(sample),
            Err(hound::Error::IoError(e)) if e.kind() == IoErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(DecodedPcm {
        spec: PcmSpec {
            sample_rate: wav_spec.sample_rate,
            channels: wav_spec.channels,
        },
        samples,
    })
}
