//! Speech capture lifecycle controller
//!
//! The underlying engine terminates after each utterance or transient
//! error; this controller presents one continuous listening session to
//! the rest of the system. Auto-restart only ever happens while voice
//! mode is on, so `stop()` deterministically ends the session even
//! when it races an in-flight end event.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::engine::{CaptureEngine, CaptureEvent, ErrorClass, classify_error};

/// Delay before retrying a failed immediate restart
const RESTART_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Delay before retrying after a recoverable engine error
const ERROR_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Listening,
}

/// Drives a capture engine as one continuous listening session
pub struct CaptureController<E: CaptureEngine> {
    engine: Arc<E>,
    state: ControllerState,
    /// Shared with retry tasks so a stop issued in the meantime
    /// suppresses them
    voice_mode: Arc<AtomicBool>,
}

impl<E: CaptureEngine> CaptureController<E> {
    /// Create a controller over an engine
    #[must_use]
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            state: ControllerState::Idle,
            voice_mode: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether a listening session is active
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state == ControllerState::Listening
    }

    /// Begin a continuous listening session
    ///
    /// Idempotent-best-effort: a start that fails (e.g., capture
    /// already running) is logged, not propagated.
    pub async fn start(&mut self) {
        self.voice_mode.store(true, Ordering::SeqCst);

        if let Err(e) = self.engine.start().await {
            tracing::warn!(error = %e, "capture start failed");
        }

        self.state = ControllerState::Listening;
        tracing::debug!("listening session started");
    }

    /// End the listening session
    ///
    /// Clears voice mode before stopping the engine so any pending
    /// auto-restart observes the stop and gives up.
    pub async fn stop(&mut self) {
        self.voice_mode.store(false, Ordering::SeqCst);

        if let Err(e) = self.engine.stop().await {
            tracing::debug!(error = %e, "capture stop failed");
        }

        self.state = ControllerState::Idle;
        tracing::debug!("listening session stopped");
    }

    /// Feed one engine event through the state machine
    ///
    /// Returns the normalized transcript when the event finalizes an
    /// utterance that should reach the interpreter.
    pub async fn handle_event(&mut self, event: CaptureEvent) -> Option<String> {
        match event {
            CaptureEvent::Started => {
                tracing::debug!("capture window opened");
                None
            }
            CaptureEvent::Transcript(text) => {
                if self.is_listening() && self.voice_mode.load(Ordering::SeqCst) {
                    let normalized = text.trim().to_lowercase();
                    tracing::info!(transcript = %normalized, "voice detected");
                    Some(normalized)
                } else {
                    tracing::debug!(transcript = %text, "dropping transcript after stop");
                    None
                }
            }
            CaptureEvent::Ended => {
                self.handle_ended().await;
                None
            }
            CaptureEvent::Error(code) => {
                self.handle_error(&code);
                None
            }
        }
    }

    /// Benign end of a capture window: restart while voice mode holds
    async fn handle_ended(&mut self) {
        if !self.voice_mode.load(Ordering::SeqCst) {
            self.state = ControllerState::Idle;
            return;
        }

        tracing::debug!("capture window ended, restarting");

        if let Err(e) = self.engine.start().await {
            tracing::debug!(error = %e, "immediate restart failed, retrying shortly");
            self.schedule_retry(RESTART_RETRY_DELAY);
        }
    }

    /// Engine error: ignore benign codes, schedule a delayed retry for
    /// anything else
    fn handle_error(&self, code: &str) {
        match classify_error(code) {
            ErrorClass::Benign => {
                tracing::debug!(code, "ignoring benign capture error");
            }
            ErrorClass::Recoverable => {
                tracing::warn!(code, "recoverable capture error, scheduling retry");
                if self.voice_mode.load(Ordering::SeqCst) {
                    self.schedule_retry(ERROR_RETRY_DELAY);
                }
            }
        }
    }

    /// Retry `start()` after a fixed delay, unless voice mode was
    /// cleared in the meantime
    fn schedule_retry(&self, delay: Duration) {
        let engine = Arc::clone(&self.engine);
        let voice_mode = Arc::clone(&self.voice_mode);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if !voice_mode.load(Ordering::SeqCst) {
                tracing::debug!("retry abandoned, voice mode is off");
                return;
            }

            if let Err(e) = engine.start().await {
                tracing::warn!(error = %e, "capture restart failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Engine double that counts calls and can be made to fail
    #[derive(Default)]
    struct FakeEngine {
        starts: AtomicUsize,
        stops: AtomicUsize,
        fail_starts: AtomicUsize,
    }

    impl FakeEngine {
        fn start_count(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }

        fn fail_next_starts(&self, n: usize) {
            self.fail_starts.store(n, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CaptureEngine for FakeEngine {
        async fn start(&self) -> Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.fail_starts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_starts.store(remaining - 1, Ordering::SeqCst);
                return Err(Error::Capture("synthetic failure".to_string()));
            }
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_enters_listening() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(Arc::clone(&engine));

        controller.start().await;
        assert_eq!(controller.state(), ControllerState::Listening);
        assert_eq!(engine.start_count(), 1);
    }

    #[tokio::test]
    async fn test_transcript_is_normalized() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(engine);
        controller.start().await;

        let out = controller
            .handle_event(CaptureEvent::Transcript("  NEXT Step ".to_string()))
            .await;
        assert_eq!(out.as_deref(), Some("next step"));
        assert_eq!(controller.state(), ControllerState::Listening);
    }

    #[tokio::test]
    async fn test_transcript_dropped_after_stop() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(engine);
        controller.start().await;
        controller.stop().await;

        let out = controller
            .handle_event(CaptureEvent::Transcript("next".to_string()))
            .await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_benign_end_restarts_exactly_once() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(Arc::clone(&engine));
        controller.start().await;
        assert_eq!(engine.start_count(), 1);

        controller.handle_event(CaptureEvent::Ended).await;
        assert_eq!(engine.start_count(), 2);
        assert_eq!(controller.state(), ControllerState::Listening);
    }

    #[tokio::test]
    async fn test_end_after_stop_does_not_restart() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(Arc::clone(&engine));
        controller.start().await;
        controller.stop().await;

        // The engine's final end event races the stop; no restart
        controller.handle_event(CaptureEvent::Ended).await;
        assert_eq!(engine.start_count(), 1);
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_restart_retries_after_delay() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(Arc::clone(&engine));
        controller.start().await;

        engine.fail_next_starts(1);
        controller.handle_event(CaptureEvent::Ended).await;
        assert_eq!(engine.start_count(), 2); // immediate attempt failed

        tokio::time::sleep(RESTART_RETRY_DELAY + Duration::from_millis(10)).await;
        assert_eq!(engine.start_count(), 3); // delayed retry fired
    }

    #[tokio::test(start_paused = true)]
    async fn test_benign_errors_are_ignored() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(Arc::clone(&engine));
        controller.start().await;

        controller
            .handle_event(CaptureEvent::Error("no-speech".to_string()))
            .await;
        controller
            .handle_event(CaptureEvent::Error("aborted".to_string()))
            .await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.start_count(), 1); // no retries scheduled
    }

    #[tokio::test(start_paused = true)]
    async fn test_recoverable_error_retries_after_delay() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(Arc::clone(&engine));
        controller.start().await;

        controller
            .handle_event(CaptureEvent::Error("network".to_string()))
            .await;
        assert_eq!(engine.start_count(), 1); // not retried immediately

        tokio::time::sleep(ERROR_RETRY_DELAY + Duration::from_millis(10)).await;
        assert_eq!(engine.start_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_suppresses_pending_retry() {
        let engine = Arc::new(FakeEngine::default());
        let mut controller = CaptureController::new(Arc::clone(&engine));
        controller.start().await;

        controller
            .handle_event(CaptureEvent::Error("network".to_string()))
            .await;
        controller.stop().await;

        tokio::time::sleep(ERROR_RETRY_DELAY + Duration::from_millis(10)).await;
        assert_eq!(engine.start_count(), 1); // retry saw voice mode off
    }
}
