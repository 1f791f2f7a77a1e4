//! Per-call media session
//!
//! Owns one bound media stream: paces outbound audio at wire time and
//! detects end of utterance from inbound frame arrival gaps.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Instant};

use voicebridge_audio::FRAME_SAMPLES;

use crate::stream::{MediaHandle, StreamEvent};
use crate::{CallError, Result, FRAME_INTERVAL, RESPONSE_TIMEOUT, SILENCE_THRESHOLD, TAIL_PER_CHAR};

/// One call's bound media stream
pub struct MediaSession {
    handle: MediaHandle,
    closed: watch::Receiver<bool>,
    stream_sid: Option<String>,
}

impl MediaSession {
    /// Wrap a bound handle; `closed` severs the session from outside an
    /// in-flight turn (manager shutdown).
    pub fn new(handle: MediaHandle, closed: watch::Receiver<bool>) -> Self {
        Self {
            handle,
            closed,
            stream_sid: None,
        }
    }

    /// Provider stream SID, once a `start` event has been seen
    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    /// Stream a μ-law utterance to the caller at wire rate.
    ///
    /// Emits 160-byte frames 20 ms apart, then waits a playback tail of
    /// 50 ms per character of the spoken text. Shortening the tail risks
    /// clipping the last syllable in the provider's jitter buffer.
    pub async fn speak(&mut self, mulaw: &[u8], text: &str) -> Result<()> {
        for frame in mulaw.chunks(FRAME_SAMPLES) {
            if *self.closed.borrow() {
                return Err(CallError::PeerClosed);
            }
            self.handle.send(StreamEvent::media_frame(frame)).await?;
            sleep(FRAME_INTERVAL).await;
        }
        sleep(TAIL_PER_CHAR * text.chars().count() as u32).await;
        Ok(())
    }

    /// Accumulate caller audio until end of utterance.
    ///
    /// The silence countdown arms on the first inbound frame; a gap of
    /// [`SILENCE_THRESHOLD`] with no `media` event then ends the turn. The
    /// whole operation is bounded by [`RESPONSE_TIMEOUT`]. A peer close
    /// mid-listen also surfaces as [`CallError::ListenTimeout`].
    pub async fn listen(&mut self) -> Result<Vec<u8>> {
        let deadline = Instant::now() + RESPONSE_TIMEOUT;
        let mut buffer = Vec::new();
        let mut heard = false;

        loop {
            let remaining = deadline.duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(CallError::ListenTimeout);
            }
            let wait = if heard {
                SILENCE_THRESHOLD.min(remaining)
            } else {
                remaining
            };

            let received = tokio::select! {
                received = timeout(wait, self.handle.recv()) => received,
                _ = self.closed.changed() => return Err(CallError::ListenTimeout),
            };

            match received {
                // a full silence window elapsed: end of utterance
                Err(_) if heard && wait == SILENCE_THRESHOLD => break,
                // the overall deadline cut the window short
                Err(_) => return Err(CallError::ListenTimeout),
                // peer closed mid-listen
                Ok(None) => return Err(CallError::ListenTimeout),
                Ok(Some(StreamEvent::Media { media })) => {
                    match BASE64.decode(media.payload.as_bytes()) {
                        Ok(frame) => {
                            buffer.extend_from_slice(&frame);
                            heard = true;
                        }
                        Err(e) => tracing::warn!("discarding undecodable media payload: {e}"),
                    }
                }
                Ok(Some(StreamEvent::Start { start })) => {
                    tracing::debug!(stream_sid = %start.stream_sid, "media stream started");
                    self.stream_sid = Some(start.stream_sid);
                }
                Ok(Some(StreamEvent::Stop)) => return Err(CallError::ListenTimeout),
            }
        }

        tracing::debug!(mulaw_bytes = buffer.len(), "end of utterance");
        Ok(buffer)
    }

    /// Discard inbound events queued while the session was speaking.
    ///
    /// The caller may not interrupt an in-flight utterance; anything that
    /// arrived meanwhile is stale by the time the next listen starts.
    pub fn drain_pending(&mut self) {
        let mut discarded = 0usize;
        while let Some(event) = self.handle.try_recv() {
            match event {
                StreamEvent::Start { start } => self.stream_sid = Some(start.stream_sid),
                StreamEvent::Media { .. } => discarded += 1,
                StreamEvent::Stop => {}
            }
        }
        if discarded > 0 {
            tracing::debug!(frames = discarded, "discarded media received while speaking");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session_with_peer(capacity: usize) -> (MediaSession, MediaHandle, watch::Sender<bool>) {
        let (call_side, wire_side) = MediaHandle::pair(capacity);
        let (close_tx, close_rx) = watch::channel(false);
        (MediaSession::new(call_side, close_rx), wire_side, close_tx)
    }

    fn frame_len(event: &StreamEvent) -> usize {
        match event {
            StreamEvent::Media { media } => BASE64.decode(&media.payload).unwrap().len(),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_speak_paces_full_frames() {
        let (mut session, mut wire, _close) = session_with_peer(64);

        let started = Instant::now();
        session.speak(&[0u8; 400], "hi").await.unwrap();

        // 3 frames at 20 ms plus a 100 ms tail for two characters
        assert_eq!(started.elapsed(), Duration::from_millis(160));

        let mut sizes = Vec::new();
        while let Some(event) = wire.try_recv() {
            sizes.push(frame_len(&event));
        }
        assert_eq!(sizes, vec![160, 160, 80]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speak_empty_utterance_only_waits_tail() {
        let (mut session, mut wire, _close) = session_with_peer(8);

        let started = Instant::now();
        session.speak(&[], "abcd").await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(200));
        assert!(wire.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_ends_after_silence_gap() {
        let (mut session, wire, _close) = session_with_peer(64);

        tokio::spawn(async move {
            wire.send(StreamEvent::start("MZ7")).await.unwrap();
            for _ in 0..3 {
                wire.send(StreamEvent::media_frame(&[0xFF; 160]))
                    .await
                    .unwrap();
                sleep(Duration::from_millis(1900)).await;
            }
            // silence from here on; keep the channel open
            sleep(Duration::from_secs(120)).await;
        });

        let started = Instant::now();
        let buffer = session.listen().await.unwrap();

        // 1900 ms gaps never trigger end of utterance, the trailing 2000 ms
        // gap does
        assert_eq!(buffer.len(), 480);
        assert_eq!(session.stream_sid(), Some("MZ7"));
        assert_eq!(
            started.elapsed(),
            Duration::from_millis(2 * 1900) + SILENCE_THRESHOLD
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_gap_over_threshold_cuts_turn() {
        let (mut session, wire, _close) = session_with_peer(64);

        tokio::spawn(async move {
            wire.send(StreamEvent::media_frame(&[0xFF; 160]))
                .await
                .unwrap();
            sleep(Duration::from_millis(2100)).await;
            let _ = wire.send(StreamEvent::media_frame(&[0xFF; 160])).await;
            sleep(Duration::from_secs(120)).await;
        });

        let buffer = session.listen().await.unwrap();
        assert_eq!(buffer.len(), 160);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_times_out_without_audio() {
        let (mut session, wire, _close) = session_with_peer(64);

        tokio::spawn(async move {
            // hold the channel open without ever sending media
            sleep(Duration::from_secs(120)).await;
            drop(wire);
        });

        let started = Instant::now();
        assert!(matches!(
            session.listen().await,
            Err(CallError::ListenTimeout)
        ));
        assert_eq!(started.elapsed(), RESPONSE_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_times_out_under_continuous_audio() {
        let (mut session, wire, _close) = session_with_peer(8);

        tokio::spawn(async move {
            loop {
                if wire.send(StreamEvent::media_frame(&[0xFF; 160])).await.is_err() {
                    break;
                }
                sleep(Duration::from_millis(1000)).await;
            }
        });

        let started = Instant::now();
        assert!(matches!(
            session.listen().await,
            Err(CallError::ListenTimeout)
        ));
        assert_eq!(started.elapsed(), RESPONSE_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_close_mid_listen_is_listen_timeout() {
        let (mut session, wire, _close) = session_with_peer(8);

        tokio::spawn(async move {
            wire.send(StreamEvent::media_frame(&[0xFF; 160]))
                .await
                .unwrap();
            sleep(Duration::from_millis(500)).await;
            drop(wire);
        });

        assert!(matches!(
            session.listen().await,
            Err(CallError::ListenTimeout)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sever_interrupts_listen() {
        let (mut session, wire, close) = session_with_peer(8);

        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            close.send(true).unwrap();
            sleep(Duration::from_secs(120)).await;
            drop(wire);
        });

        let started = Instant::now();
        assert!(matches!(
            session.listen().await,
            Err(CallError::ListenTimeout)
        ));
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_discards_queued_media() {
        let (mut session, wire, _close) = session_with_peer(8);

        wire.send(StreamEvent::start("MZ9")).await.unwrap();
        wire.send(StreamEvent::media_frame(&[0xFF; 160]))
            .await
            .unwrap();
        wire.send(StreamEvent::media_frame(&[0xFF; 160]))
            .await
            .unwrap();

        session.drain_pending();
        assert_eq!(session.stream_sid(), Some("MZ9"));

        // nothing stale is left for the next listen
        tokio::spawn(async move {
            sleep(Duration::from_secs(120)).await;
            drop(wire);
        });
        assert!(matches!(
            session.listen().await,
            Err(CallError::ListenTimeout)
        ));
    }
}
