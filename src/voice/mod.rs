//! Voice processing module
//!
//! Capture side: microphone stream → utterance segmentation → STT,
//! packaged as a bounded-window engine that the controller restarts to
//! present continuous listening. Narration side: TTS → playback with
//! interrupt-and-replace.

mod capture;
mod controller;
mod engine;
mod mic;
mod narrator;
mod playback;
mod segmenter;
mod stt;
mod tts;

pub use capture::{MicStream, SAMPLE_RATE, rms, samples_to_wav};
pub use controller::{CaptureController, ControllerState};
pub use engine::{
    CaptureEngine, CaptureEvent, ERROR_ABORTED, ERROR_NO_SPEECH, ErrorClass, classify_error,
};
pub use mic::MicrophoneEngine;
pub use narrator::{ConsoleNarration, Narrator, SpeechSink, SpokenNarration};
pub use playback::AudioPlayback;
pub use segmenter::{SegmenterState, UtteranceSegmenter};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
