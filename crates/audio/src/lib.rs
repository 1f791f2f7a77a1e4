//! Telephony audio codec support
//!
//! G.711 μ-law companding and WAV framing for 8 kHz mono call audio.
//! Pure functions, no I/O.

pub mod mulaw;
pub mod wav;

pub use mulaw::{decode_to_pcm16, encode_pcm16, linear_to_mulaw, mulaw_to_linear};
pub use wav::wrap_pcm16_as_wav;

/// Sample rate of all call audio
pub const SAMPLE_RATE: u32 = 8000;

/// Samples (and μ-law bytes) in one 20 ms wire frame
pub const FRAME_SAMPLES: usize = 160;
