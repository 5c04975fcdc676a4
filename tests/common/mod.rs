//! Shared test utilities

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sous_voice::voice::{CaptureEngine, SpeechSink};
use sous_voice::{Difficulty, Recipe, Result};

/// The three-step recipe used across scenario tests
#[must_use]
pub fn pasta() -> Recipe {
    Recipe {
        id: None,
        title: "Pasta".to_string(),
        time: "20 mins".to_string(),
        difficulty: Difficulty::Easy,
        category: "Italian".to_string(),
        image: String::new(),
        steps: vec![
            "Boil water".to_string(),
            "Add pasta".to_string(),
            "Drain".to_string(),
        ],
        source_url: None,
        servings: Some(2),
    }
}

/// Capture engine double that always succeeds and counts calls
#[derive(Default)]
pub struct ScriptedEngine {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedEngine {
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureEngine for ScriptedEngine {
    async fn start(&self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Speech sink double that records every utterance it is asked to speak
#[derive(Default)]
pub struct RecordingSink {
    utterances: Mutex<Vec<String>>,
}

impl RecordingSink {
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.utterances.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_spoken(&self) -> Option<String> {
        self.utterances.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SpeechSink for RecordingSink {
    async fn speak(
        &self,
        text: &str,
        _cancel: Arc<std::sync::atomic::AtomicBool>,
    ) -> Result<()> {
        self.utterances.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
