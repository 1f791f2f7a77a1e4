//! Call management for the voice bridge
//!
//! The stateful core: per-call state machines, real-time media sessions over
//! the provider's bidirectional stream, and the call manager facade that
//! correlates inbound media streams with pending calls and exposes the
//! turn-based agent API.

pub mod call;
pub mod manager;
pub mod media;
pub mod stream;

pub use call::Call;
pub use manager::{CallManager, CallManagerConfig};
pub use media::MediaSession;
pub use stream::{MediaHandle, MediaPayload, StreamEvent, StreamStart};

use std::time::Duration;

use thiserror::Error;

use voicebridge_core::{CallId, CallState};
use voicebridge_speech::SpeechError;
use voicebridge_telephony::TelephonyError;

/// Maximum wait for a media stream to bind after dialing
pub const BIND_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval while waiting for stream binding
pub const BIND_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on one whole listen operation
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Silence gap that ends an utterance
pub const SILENCE_THRESHOLD: Duration = Duration::from_millis(2000);

/// Wire pacing between outbound media frames (20 ms at 8 kHz)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(20);

/// Trailing wait per spoken character, approximating playback completion
pub const TAIL_PER_CHAR: Duration = Duration::from_millis(50);

/// Sentinel reply substituted when transcription fails
pub const TRANSCRIPTION_FAILED: &str = "[transcription failed]";

/// Canonical farewell spoken when the manager shuts down
pub const FAREWELL: &str = "Goodbye.";

/// Errors surfaced by call operations
#[derive(Error, Debug)]
pub enum CallError {
    #[error("telephony provider error: {0}")]
    Provider(#[from] TelephonyError),

    #[error("no media stream bound within the bind timeout")]
    BindTimeout,

    #[error("speech service error: {0}")]
    Upstream(#[from] SpeechError),

    #[error("no end of utterance within the response timeout")]
    ListenTimeout,

    #[error("unknown call: {0}")]
    UnknownCall(CallId),

    #[error("call {call_id} is {state}: operation not permitted")]
    InvalidState { call_id: CallId, state: CallState },

    #[error("media peer closed the stream")]
    PeerClosed,
}

pub type Result<T> = std::result::Result<T, CallError>;
