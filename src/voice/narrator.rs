//! Narration with interrupt-and-replace
//!
//! `speak` cancels whatever is currently playing before enqueueing the
//! new utterance, so the most recent instruction is always the one
//! heard. Navigation commands supersede previous narration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::{Error, Result};

/// Backend that turns one utterance of text into audible speech
///
/// Implementations poll `cancel` and return early when it is set.
#[async_trait]
pub trait SpeechSink: Send + Sync + 'static {
    /// Speak the text to completion or until canceled
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str, cancel: Arc<AtomicBool>) -> Result<()>;
}

/// An in-flight utterance
struct Utterance {
    handle: JoinHandle<()>,
    cancel: Arc<AtomicBool>,
}

/// Speaks status messages and recipe steps
pub struct Narrator {
    sink: Arc<dyn SpeechSink>,
    current: Mutex<Option<Utterance>>,
}

impl Narrator {
    /// Create a narrator over a speech sink
    #[must_use]
    pub fn new(sink: Arc<dyn SpeechSink>) -> Self {
        Self {
            sink,
            current: Mutex::new(None),
        }
    }

    /// Speak, replacing any in-flight utterance
    pub fn speak(&self, text: &str) {
        self.cancel_all();

        let cancel = Arc::new(AtomicBool::new(false));
        let sink = Arc::clone(&self.sink);
        let task_cancel = Arc::clone(&cancel);
        let text = text.to_string();

        tracing::debug!(text = %text, "narrating");

        let handle = tokio::spawn(async move {
            if let Err(e) = sink.speak(&text, task_cancel).await {
                tracing::warn!(error = %e, "narration failed");
            }
        });

        if let Ok(mut current) = self.current.lock() {
            *current = Some(Utterance { handle, cancel });
        }
    }

    /// Cancel any queued or playing utterance
    pub fn cancel_all(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(utterance) = current.take() {
                utterance.cancel.store(true, Ordering::SeqCst);
                utterance.handle.abort();
            }
        }
    }
}

/// Sink that synthesizes via the TTS API and plays to the speakers
pub struct SpokenNarration {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl SpokenNarration {
    /// Create a sink from a TTS client and a playback device
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }
}

#[async_trait]
impl SpeechSink for SpokenNarration {
    async fn speak(&self, text: &str, cancel: Arc<AtomicBool>) -> Result<()> {
        let mp3 = self.tts.synthesize(text).await?;

        if cancel.load(Ordering::SeqCst) {
            return Ok(());
        }

        let playback = self.playback.clone();
        tokio::task::spawn_blocking(move || playback.play_mp3_blocking(&mp3, &cancel))
            .await
            .map_err(|e| Error::Audio(e.to_string()))?
    }
}

/// Sink that prints narration instead of speaking it
///
/// Used when voice output is disabled or no audio hardware exists.
pub struct ConsoleNarration;

#[async_trait]
impl SpeechSink for ConsoleNarration {
    async fn speak(&self, text: &str, _cancel: Arc<AtomicBool>) -> Result<()> {
        println!("[sous] {text}");
        Ok(())
    }
}
