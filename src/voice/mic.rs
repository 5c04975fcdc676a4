//! Microphone capture engine
//!
//! Concrete [`CaptureEngine`] built from the microphone stream, the
//! utterance segmenter, and an STT client. Each start opens one
//! bounded window: the first finalized utterance (or a no-speech
//! timeout) ends it, mirroring recognizers that stop after every
//! utterance. Continuity comes from the controller's auto-restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::capture::{MicStream, SAMPLE_RATE, samples_to_wav};
use super::engine::{CaptureEngine, CaptureEvent, ERROR_ABORTED, ERROR_NO_SPEECH};
use super::segmenter::{SegmenterState, UtteranceSegmenter};
use super::stt::SpeechToText;
use crate::{Error, Result};

/// How often the worker drains the microphone buffer
const CHUNK_INTERVAL: Duration = Duration::from_millis(100);

/// Samples of initial silence before the window closes as no-speech
const NO_SPEECH_TIMEOUT_SAMPLES: usize = (SAMPLE_RATE as usize) * 8;

/// What one capture window produced
enum WindowOutcome {
    Utterance(Vec<f32>),
    NoSpeech,
    Aborted,
    Failed(String),
}

/// Capture engine reading the default microphone
pub struct MicrophoneEngine {
    stt: Arc<SpeechToText>,
    events: mpsc::Sender<CaptureEvent>,
    running: Arc<AtomicBool>,
}

impl MicrophoneEngine {
    /// Create an engine that emits events on the given channel
    #[must_use]
    pub fn new(stt: SpeechToText, events: mpsc::Sender<CaptureEvent>) -> Self {
        Self {
            stt: Arc::new(stt),
            events,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl CaptureEngine for MicrophoneEngine {
    async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::Capture("capture already running".to_string()));
        }

        let (window_tx, mut window_rx) = mpsc::channel::<WindowOutcome>(1);

        // Audio thread: owns the cpal stream, which is not Send
        let running = Arc::clone(&self.running);
        std::thread::spawn(move || capture_window(&running, &window_tx));

        // STT task: turns the window outcome into engine events
        let events = self.events.clone();
        let stt = Arc::clone(&self.stt);
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            let _ = events.send(CaptureEvent::Started).await;

            match window_rx.recv().await {
                Some(WindowOutcome::Utterance(samples)) => {
                    transcribe_and_emit(&stt, samples, &events).await;
                }
                Some(WindowOutcome::NoSpeech) => {
                    let _ = events
                        .send(CaptureEvent::Error(ERROR_NO_SPEECH.to_string()))
                        .await;
                }
                Some(WindowOutcome::Aborted) => {
                    let _ = events
                        .send(CaptureEvent::Error(ERROR_ABORTED.to_string()))
                        .await;
                }
                Some(WindowOutcome::Failed(code)) => {
                    let _ = events.send(CaptureEvent::Error(code)).await;
                }
                None => {}
            }

            // Clear before Ended so an auto-restart can start cleanly
            running.store(false, Ordering::SeqCst);
            let _ = events.send(CaptureEvent::Ended).await;
        });

        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Run one capture window on a dedicated thread
fn capture_window(running: &Arc<AtomicBool>, window_tx: &mpsc::Sender<WindowOutcome>) {
    let mic = match MicStream::open() {
        Ok(mic) => mic,
        Err(e) => {
            tracing::error!(error = %e, "failed to open microphone");
            let _ = window_tx.blocking_send(WindowOutcome::Failed("audio-capture".to_string()));
            return;
        }
    };

    let mut segmenter = UtteranceSegmenter::new();
    let mut waited = 0usize;

    loop {
        if !running.load(Ordering::SeqCst) {
            let _ = window_tx.blocking_send(WindowOutcome::Aborted);
            return;
        }

        std::thread::sleep(CHUNK_INTERVAL);
        let chunk = mic.drain();

        if let Some(utterance) = segmenter.push(&chunk) {
            let _ = window_tx.blocking_send(WindowOutcome::Utterance(utterance));
            return;
        }

        // The timeout only applies while nothing has been heard yet
        if segmenter.state() == SegmenterState::Waiting {
            waited += chunk.len();
            if waited > NO_SPEECH_TIMEOUT_SAMPLES {
                let _ = window_tx.blocking_send(WindowOutcome::NoSpeech);
                return;
            }
        } else {
            waited = 0;
        }
    }
}

/// Encode, transcribe, and emit the transcript event
async fn transcribe_and_emit(
    stt: &SpeechToText,
    samples: Vec<f32>,
    events: &mpsc::Sender<CaptureEvent>,
) {
    let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
        Ok(wav) => wav,
        Err(e) => {
            tracing::error!(error = %e, "WAV encoding failed");
            let _ = events
                .send(CaptureEvent::Error("audio-encode".to_string()))
                .await;
            return;
        }
    };

    match stt.transcribe(wav).await {
        Ok(text) if text.trim().is_empty() => {
            let _ = events
                .send(CaptureEvent::Error(ERROR_NO_SPEECH.to_string()))
                .await;
        }
        Ok(text) => {
            let _ = events.send(CaptureEvent::Transcript(text)).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "transcription failed");
            let _ = events
                .send(CaptureEvent::Error("stt-failure".to_string()))
                .await;
        }
    }
}
