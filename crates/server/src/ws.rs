//! Media stream WebSocket pump
//!
//! Accepts the provider's media WebSocket, translates between wire JSON
//! frames and in-process channel endpoints, and offers the resulting handle
//! to the call manager for correlation.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use voicebridge_call::{MediaHandle, StreamEvent};

use crate::state::AppState;

/// How long an uncorrelated stream is held before being dropped
const SPURIOUS_STREAM_IDLE: Duration = Duration::from_secs(5);

/// Frames buffered per direction (about 20 s of audio)
const PUMP_CAPACITY: usize = 1024;

/// Upgrade handler for the provider's media stream
pub async fn media_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Pump the socket: the upgrade is never failed, a stream no call wants is
/// simply dropped after a short idle period.
async fn handle_socket(socket: WebSocket, state: AppState) {
    tracing::info!("media stream connected");
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (out_tx, mut out_rx) = mpsc::channel::<StreamEvent>(PUMP_CAPACITY);
    let (in_tx, in_rx) = mpsc::channel::<StreamEvent>(PUMP_CAPACITY);
    let handle = MediaHandle::new(out_tx, in_rx);

    // writer: call -> wire; exits when the call drops its handle
    tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = serde_json::to_string(&event).expect("stream events serialize");
            if ws_tx.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
        tracing::debug!("media stream writer closed");
    });

    // reader: wire -> call; exits on peer close or when the call is gone
    tokio::spawn(async move {
        while let Some(message) = ws_rx.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<StreamEvent>(&text) {
                    Ok(event) => {
                        if in_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!("ignoring unrecognized stream frame: {e}"),
                },
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
        tracing::debug!("media stream reader closed");
    });

    if let Some(unbound) = state.manager.attach_stream(handle) {
        tracing::warn!("no pending call for media stream, closing after idle");
        tokio::time::sleep(SPURIOUS_STREAM_IDLE).await;
        drop(unbound);
    }
}
