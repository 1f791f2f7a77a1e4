//! Call manager facade
//!
//! Registry of live calls, correlation of inbound media streams with
//! pending calls, and the turn-based operations exposed to the agent:
//! initiate, continue, speak-only, end.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

use voicebridge_audio::{decode_to_pcm16, encode_pcm16, wrap_pcm16_as_wav, SAMPLE_RATE};
use voicebridge_core::{CallId, CallState, Turn};
use voicebridge_speech::{Synthesizer, Transcriber};
use voicebridge_telephony::Dialer;

use crate::call::Call;
use crate::media::MediaSession;
use crate::stream::MediaHandle;
use crate::{
    CallError, Result, BIND_POLL_INTERVAL, BIND_TIMEOUT, FAREWELL, TRANSCRIPTION_FAILED,
};

/// Manager-level call parameters, snapshotted from settings at startup
#[derive(Debug, Clone)]
pub struct CallManagerConfig {
    /// Number every call dials (E.164)
    pub to_number: String,
    /// Caller number presented to the callee (E.164)
    pub from_number: String,
    /// URL the provider fetches the control descriptor from on answer
    pub control_url: String,
    /// Synthesis voice
    pub voice: String,
    /// Synthesis speed multiplier
    pub speed: f32,
    /// Ring timeout passed to the provider
    pub dial_timeout_seconds: u32,
}

/// Registry of calls and the agent-facing turn API
pub struct CallManager {
    calls: Mutex<BTreeMap<CallId, Arc<Call>>>,
    next_id: AtomicU64,
    accepting: AtomicBool,
    dialer: Arc<dyn Dialer>,
    tts: Arc<dyn Synthesizer>,
    stt: Arc<dyn Transcriber>,
    config: CallManagerConfig,
}

impl CallManager {
    pub fn new(
        config: CallManagerConfig,
        dialer: Arc<dyn Dialer>,
        tts: Arc<dyn Synthesizer>,
        stt: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            calls: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
            accepting: AtomicBool::new(true),
            dialer,
            tts,
            stt,
            config,
        }
    }

    /// Place a new outbound call, speak `message` once the stream binds,
    /// and return the first human reply.
    ///
    /// On any failure the call is removed from the registry and its stream,
    /// if bound, is closed.
    pub async fn initiate(&self, message: &str) -> Result<(CallId, String)> {
        let id = CallId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let call = Call::new(id);
        // Register before dialing: a stream arriving ahead of the dial
        // response must find the call already in the registry.
        self.calls.lock().insert(id, call.clone());
        tracing::info!(call_id = %id, to = %self.config.to_number, "initiating call");

        let dialed = self
            .dialer
            .place_outbound(
                &self.config.to_number,
                &self.config.from_number,
                &self.config.control_url,
                self.config.dial_timeout_seconds,
            )
            .await;
        match dialed {
            Ok(sid) => call.set_provider_sid(sid),
            Err(e) => {
                self.teardown(&call);
                return Err(e.into());
            }
        }

        if let Err(e) = self.wait_for_bind(&call).await {
            self.teardown(&call);
            return Err(e);
        }

        match self.run_turn(&call, message, true).await {
            Ok(reply) => Ok((id, reply.unwrap_or_default())),
            Err(e) => {
                self.teardown(&call);
                Err(e)
            }
        }
    }

    /// One speak-and-listen turn on an existing active call
    pub async fn continue_call(&self, id: CallId, message: &str) -> Result<String> {
        let call = self.get_or_err(id)?;
        match self.run_turn(&call, message, true).await {
            Ok(reply) => Ok(reply.unwrap_or_default()),
            Err(e @ CallError::InvalidState { .. }) => Err(e),
            Err(e) => {
                self.teardown(&call);
                Err(e)
            }
        }
    }

    /// Speak without listening; covers latency before a slow operation.
    ///
    /// Leaves the conversation history untouched.
    pub async fn speak_only(&self, id: CallId, message: &str) -> Result<()> {
        let call = self.get_or_err(id)?;
        match self.run_turn(&call, message, false).await {
            Ok(_) => Ok(()),
            Err(e @ CallError::InvalidState { .. }) => Err(e),
            Err(e) => {
                self.teardown(&call);
                Err(e)
            }
        }
    }

    /// Speak a farewell, close the stream, and remove the call.
    ///
    /// Waits for any in-flight turn first; turns are not cancellable. Only
    /// an unknown call id fails this operation, everything else is logged.
    pub async fn end(&self, id: CallId, message: &str) -> Result<()> {
        let call = self.get_or_err(id)?;

        let mut slot = call.media.lock().await;
        call.push_turn(Turn::agent(message));
        if call.state() != CallState::Ended {
            if let Some(session) = slot.as_mut() {
                call.set_state(CallState::Speaking);
                if let Err(e) = self.say(session, message).await {
                    tracing::warn!(call_id = %id, error = %e, "farewell failed");
                }
            }
        }
        *slot = None;
        drop(slot);

        call.set_state(CallState::Ended);
        call.sever();
        self.calls.lock().remove(&id);
        tracing::info!(call_id = %id, "call ended");
        Ok(())
    }

    /// Ids of calls currently held by the registry, in creation order
    pub fn active_call_ids(&self) -> Vec<CallId> {
        self.calls
            .lock()
            .iter()
            .filter(|(_, call)| call.state() != CallState::Ended)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Look up a call by id
    pub fn get(&self, id: CallId) -> Option<Arc<Call>> {
        self.calls.lock().get(&id).cloned()
    }

    /// Offer an incoming media stream for correlation.
    ///
    /// Scans the registry in call-id order and binds to the first call
    /// still waiting for its stream. Returns the handle when no call wants
    /// it, so the server can close it after a short idle period.
    pub fn attach_stream(&self, handle: MediaHandle) -> Option<MediaHandle> {
        if !self.accepting.load(Ordering::Relaxed) {
            return Some(handle);
        }
        let calls = self.calls.lock();
        let mut handle = handle;
        for (id, call) in calls.iter() {
            match call.bind_stream(handle) {
                Ok(()) => {
                    tracing::info!(call_id = %id, "media stream correlated");
                    return None;
                }
                Err(returned) => handle = returned,
            }
        }
        tracing::warn!("media stream matched no pending call");
        Some(handle)
    }

    /// End every call with the canonical farewell and stop accepting
    /// streams. In-flight turns are not awaited; their streams are severed,
    /// which fails any pending listen.
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::Relaxed);
        let calls: Vec<Arc<Call>> = self.calls.lock().values().cloned().collect();

        for call in calls {
            let id = call.id();
            match call.media.try_lock() {
                Ok(mut slot) => {
                    if let Some(session) = slot.as_mut() {
                        call.set_state(CallState::Speaking);
                        if let Err(e) = self.say(session, FAREWELL).await {
                            tracing::warn!(call_id = %id, error = %e, "shutdown farewell failed");
                        }
                        call.push_turn(Turn::agent(FAREWELL));
                    }
                    *slot = None;
                }
                Err(_) => {
                    tracing::warn!(call_id = %id, "turn in flight at shutdown, severing stream");
                }
            }
            call.set_state(CallState::Ended);
            call.sever();
        }

        self.calls.lock().clear();
        tracing::info!("call manager shut down");
    }

    fn get_or_err(&self, id: CallId) -> Result<Arc<Call>> {
        self.get(id).ok_or(CallError::UnknownCall(id))
    }

    async fn wait_for_bind(&self, call: &Call) -> Result<()> {
        let deadline = Instant::now() + BIND_TIMEOUT;
        while Instant::now() < deadline {
            if call.state() == CallState::Active {
                return Ok(());
            }
            sleep(BIND_POLL_INTERVAL).await;
        }
        Err(CallError::BindTimeout)
    }

    /// One turn: speak `message`, then optionally listen for the reply.
    ///
    /// Holding the media slot for the whole turn is what serializes turns;
    /// a contended slot or a non-active state is an `InvalidState`.
    async fn run_turn(
        &self,
        call: &Arc<Call>,
        message: &str,
        listen: bool,
    ) -> Result<Option<String>> {
        let mut slot = call.media.try_lock().map_err(|_| CallError::InvalidState {
            call_id: call.id(),
            state: call.state(),
        })?;
        let state = call.state();
        if state != CallState::Active {
            return Err(CallError::InvalidState {
                call_id: call.id(),
                state,
            });
        }
        let session = slot.as_mut().ok_or(CallError::PeerClosed)?;

        call.set_state(CallState::Speaking);
        if listen {
            call.push_turn(Turn::agent(message));
        }
        self.say(session, message).await?;

        if !listen {
            call.set_state(CallState::Active);
            return Ok(None);
        }

        call.set_state(CallState::Listening);
        session.drain_pending();
        let mulaw = session.listen().await?;

        let wav = wrap_pcm16_as_wav(&decode_to_pcm16(&mulaw), SAMPLE_RATE);
        let text = match self.stt.transcribe(&wav).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(call_id = %call.id(), error = %e, "transcription failed, downgrading");
                TRANSCRIPTION_FAILED.to_string()
            }
        };

        call.push_turn(Turn::human(text.as_str()));
        call.set_state(CallState::Active);
        Ok(Some(text))
    }

    /// Synthesize and stream one utterance
    async fn say(&self, session: &mut MediaSession, message: &str) -> Result<()> {
        let pcm = self
            .tts
            .synthesize(message, &self.config.voice, self.config.speed)
            .await?;
        session.speak(&encode_pcm16(&pcm), message).await
    }

    /// Mark a call dead and drop it from the registry
    fn teardown(&self, call: &Arc<Call>) {
        call.set_state(CallState::Ended);
        call.sever();
        if let Ok(mut slot) = call.media.try_lock() {
            *slot = None;
        }
        self.calls.lock().remove(&call.id());
        tracing::info!(call_id = %call.id(), "call torn down");
    }
}
