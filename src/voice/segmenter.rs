//! Utterance segmentation
//!
//! Splits the microphone stream into bounded utterance windows using
//! RMS energy: speech begins a window, trailing silence closes it.
//! Every closed window is a command candidate for STT.

use super::capture::rms;

/// Minimum audio energy to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech length for a valid utterance (samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Trailing silence that closes an utterance (samples)
const TRAILING_SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Segmenter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech to begin
    Waiting,
    /// Accumulating an utterance
    Capturing,
}

/// Splits a sample stream into utterances
pub struct UtteranceSegmenter {
    state: SegmenterState,
    buffer: Vec<f32>,
    silence_counter: usize,
}

impl UtteranceSegmenter {
    /// Create a segmenter in the waiting state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SegmenterState::Waiting,
            buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Feed a chunk of samples; returns a finalized utterance when
    /// trailing silence closes one
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        let is_speech = rms(samples) > ENERGY_THRESHOLD;

        match self.state {
            SegmenterState::Waiting => {
                if is_speech {
                    self.state = SegmenterState::Capturing;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!("speech detected, capturing");
                }
                None
            }
            SegmenterState::Capturing => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > TRAILING_SILENCE_SAMPLES {
                    if self.buffer.len() > MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.buffer.len(), "utterance complete");
                        self.state = SegmenterState::Waiting;
                        self.silence_counter = 0;
                        return Some(std::mem::take(&mut self.buffer));
                    }

                    // Noise blip too short to be an utterance
                    tracing::trace!("discarding short segment");
                    self.reset();
                }

                None
            }
        }
    }

    /// Reset to the waiting state, discarding any buffered audio
    pub fn reset(&mut self) {
        self.state = SegmenterState::Waiting;
        self.buffer.clear();
        self.silence_counter = 0;
    }
}

impl Default for UtteranceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
