//! Speech provider clients
//!
//! Thin adapters over an external speech service: text-to-speech producing
//! 8 kHz mono PCM, and speech-to-text consuming WAV. The traits are the
//! seams the call manager is tested through.

pub mod stt;
pub mod tts;

pub use stt::SttClient;
pub use tts::TtsClient;

use async_trait::async_trait;
use thiserror::Error;

/// Speech provider errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("speech request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("speech provider returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Text-to-speech synthesis
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` to little-endian 16-bit PCM at 8 kHz mono
    async fn synthesize(&self, text: &str, voice: &str, speed: f32)
        -> Result<Vec<u8>, SpeechError>;
}

/// Speech-to-text transcription
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a complete WAV utterance to text
    async fn transcribe(&self, wav: &[u8]) -> Result<String, SpeechError>;
}
