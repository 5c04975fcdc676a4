//! Speech capture engine contract
//!
//! A capture engine delivers one bounded utterance window per start:
//! it emits `Started`, then a `Transcript` (or an error), then `Ended`.
//! The controller layers continuous listening on top by restarting the
//! engine after each benign end.

use async_trait::async_trait;

use crate::Result;

/// Error code for a window that closed without any speech
pub const ERROR_NO_SPEECH: &str = "no-speech";

/// Error code for a deliberately aborted capture
pub const ERROR_ABORTED: &str = "aborted";

/// Event emitted by a capture engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Capture began
    Started,
    /// Engine-initiated end of a capture window
    Ended,
    /// Capture failed with an engine error code
    Error(String),
    /// A finalized transcript for one utterance
    Transcript(String),
}

/// Classification of an engine error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected termination; ignored, no retry
    Benign,
    /// Anything else; capture is retried after a delay
    Recoverable,
}

/// Classify an engine error code
#[must_use]
pub fn classify_error(code: &str) -> ErrorClass {
    match code {
        ERROR_NO_SPEECH | ERROR_ABORTED => ErrorClass::Benign,
        _ => ErrorClass::Recoverable,
    }
}

/// A speech capture engine
///
/// Implementations emit [`CaptureEvent`]s on the channel handed to
/// them at construction. Only one capture window is active at a time;
/// `start` while running is an error the caller absorbs.
#[async_trait]
pub trait CaptureEngine: Send + Sync + 'static {
    /// Begin a capture window
    ///
    /// # Errors
    ///
    /// Returns error if capture cannot start (e.g., already running)
    async fn start(&self) -> Result<()>;

    /// Stop capturing
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot be stopped
    async fn stop(&self) -> Result<()>;
}
