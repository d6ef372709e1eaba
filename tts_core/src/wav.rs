//! RIFF/WAVE header construction for live streams.

use serde::{Deserialize, Serialize};

use crate::StreamError;

/// PCM stream parameters, fixed for the lifetime of one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Result<Self, StreamError> {
        if sample_rate == 0 {
            return Err(StreamError::InvalidFormat("sample rate must be positive"));
        }
        if channels == 0 {
            return Err(StreamError::InvalidFormat("channel count must be positive"));
        }
        if bits_per_sample == 0 || bits_per_sample % 8 != 0 {
            return Err(StreamError::InvalidFormat(
                "bits per sample must be a positive multiple of 8",
            ));
        }
        Ok(Self {
            sample_rate,
            bits_per_sample,
            channels,
        })
    }

    /// Bytes per sample frame across all channels.
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.frame_bytes() as u32
    }

    pub fn block_align(&self) -> u16 {
        self.frame_bytes() as u16
    }
}

impl Default for AudioFormat {
    /// 16-bit mono at 24 kHz, the format the service always emits.
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            bits_per_sample: 16,
            channels: 1,
        }
    }
}

/// Build a 44-byte RIFF/WAVE header with the data size left at zero.
///
/// The true payload length is unknown when the header goes on the wire, so
/// both size fields carry the streaming sentinel (0). Players treat that as
/// a live source and read until the connection closes, which lets playback
/// start before generation finishes.
pub fn streaming_header(format: &AudioFormat) -> Vec<u8> {
    let data_size: u32 = 0;
    let riff_size: u32 = 36 + data_size;

    let mut out = Vec::with_capacity(44);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&format.block_align().to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    // data chunk, size unknown
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    out
}
