//! Canonical PCM WAV framing
//!
//! Produces the 44-byte RIFF/WAVE header the transcription service expects:
//! fmt chunk size 16, PCM format, mono, 16 bits per sample.

/// Prepend a canonical WAV header to raw little-endian 16-bit mono PCM.
///
/// Zero-length input yields a header-only WAV.
pub fn wrap_pcm16_as_wav(pcm_le: &[u8], sample_rate: u32) -> Vec<u8> {
    let data_len = pcm_le.len() as u32;
    let byte_rate = sample_rate * 2;

    let mut wav = Vec::with_capacity(44 + pcm_le.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm_le);
    wav
}
