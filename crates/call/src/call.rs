//! Per-call state
//!
//! A [`Call`] moves through `PendingStream → Active → (Speaking |
//! Listening)* → Ended`. Sync-side state (lifecycle, history) lives behind
//! parking_lot mutexes; the media session sits in a turn-exclusive async
//! slot so overlapping turn operations fail fast instead of interleaving.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::watch;

use voicebridge_core::{CallId, CallState, Turn};

use crate::media::MediaSession;
use crate::stream::MediaHandle;

/// One outbound call and its conversation
pub struct Call {
    id: CallId,
    created_at: Instant,
    state: Mutex<CallState>,
    history: Mutex<Vec<Turn>>,
    provider_sid: Mutex<Option<String>>,
    /// Turn-exclusive media slot: a held lock IS an in-flight turn
    pub(crate) media: tokio::sync::Mutex<Option<MediaSession>>,
    close_tx: watch::Sender<bool>,
}

impl Call {
    pub(crate) fn new(id: CallId) -> Arc<Self> {
        let (close_tx, _) = watch::channel(false);
        Arc::new(Self {
            id,
            created_at: Instant::now(),
            state: Mutex::new(CallState::PendingStream),
            history: Mutex::new(Vec::new()),
            provider_sid: Mutex::new(None),
            media: tokio::sync::Mutex::new(None),
            close_tx,
        })
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn state(&self) -> CallState {
        *self.state.lock()
    }

    /// Snapshot of the conversation so far
    pub fn history(&self) -> Vec<Turn> {
        self.history.lock().clone()
    }

    /// Provider call SID, once dialing has succeeded
    pub fn provider_sid(&self) -> Option<String> {
        self.provider_sid.lock().clone()
    }

    pub(crate) fn set_state(&self, state: CallState) {
        let mut current = self.state.lock();
        tracing::debug!(call_id = %self.id, from = %*current, to = %state, "state transition");
        *current = state;
    }

    pub(crate) fn push_turn(&self, turn: Turn) {
        self.history.lock().push(turn);
    }

    pub(crate) fn set_provider_sid(&self, sid: String) {
        *self.provider_sid.lock() = Some(sid);
    }

    /// Bind an incoming media stream to this call.
    ///
    /// Succeeds only in `PendingStream` with an empty slot; the handle is
    /// returned to the caller otherwise so it can be offered elsewhere.
    pub(crate) fn bind_stream(&self, handle: MediaHandle) -> Result<(), MediaHandle> {
        let mut state = self.state.lock();
        if *state != CallState::PendingStream {
            return Err(handle);
        }
        let Ok(mut slot) = self.media.try_lock() else {
            return Err(handle);
        };
        if slot.is_some() {
            return Err(handle);
        }
        *slot = Some(MediaSession::new(handle, self.close_tx.subscribe()));
        *state = CallState::Active;
        tracing::debug!(call_id = %self.id, "media stream bound");
        Ok(())
    }

    /// Sever the bound stream, failing any in-flight turn
    pub(crate) fn sever(&self) {
        let _ = self.close_tx.send(true);
    }
}
