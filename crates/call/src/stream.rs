//! Media stream wire format and in-process handle
//!
//! The provider carries call audio as JSON text frames over one WebSocket
//! per call. The server's pump tasks translate between the socket and a
//! pair of channels; a [`MediaHandle`] is the call-side end of that pair.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::CallError;

/// One JSON-framed media stream event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Sent by the provider when the stream opens
    Start { start: StreamStart },
    /// A 20 ms audio frame, in either direction
    Media { media: MediaPayload },
    /// Provider end-of-stream
    Stop,
}

/// Payload of a `start` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamStart {
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
}

/// Payload of a `media` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Base64-encoded μ-law audio
    pub payload: String,
}

impl StreamEvent {
    /// Build a `start` event
    pub fn start(stream_sid: impl Into<String>) -> Self {
        StreamEvent::Start {
            start: StreamStart {
                stream_sid: stream_sid.into(),
            },
        }
    }

    /// Build a `media` event carrying one μ-law frame
    pub fn media_frame(mulaw: &[u8]) -> Self {
        StreamEvent::Media {
            media: MediaPayload {
                payload: BASE64.encode(mulaw),
            },
        }
    }
}

/// Call-side endpoints of one media stream.
///
/// Sends travel toward the wire, receives come from it. Dropping the handle
/// closes both directions, which is how the pump tasks learn the call is
/// done with the stream.
pub struct MediaHandle {
    outbound: mpsc::Sender<StreamEvent>,
    inbound: mpsc::Receiver<StreamEvent>,
}

impl MediaHandle {
    /// Wrap pump-facing channel endpoints
    pub fn new(outbound: mpsc::Sender<StreamEvent>, inbound: mpsc::Receiver<StreamEvent>) -> Self {
        Self { outbound, inbound }
    }

    /// Two crossed handles forming an in-process loopback; the second plays
    /// the provider side in tests.
    pub fn pair(capacity: usize) -> (MediaHandle, MediaHandle) {
        let (a_tx, a_rx) = mpsc::channel(capacity);
        let (b_tx, b_rx) = mpsc::channel(capacity);
        (
            MediaHandle {
                outbound: a_tx,
                inbound: b_rx,
            },
            MediaHandle {
                outbound: b_tx,
                inbound: a_rx,
            },
        )
    }

    /// Send an event toward the wire
    pub async fn send(&self, event: StreamEvent) -> Result<(), CallError> {
        self.outbound
            .send(event)
            .await
            .map_err(|_| CallError::PeerClosed)
    }

    /// Receive the next event from the wire; `None` once the peer is gone
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.inbound.recv().await
    }

    /// Take one already-queued event without waiting
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        self.inbound.try_recv().ok()
    }
}
