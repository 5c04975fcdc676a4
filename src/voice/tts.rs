//! Narration synthesis
//!
//! One speech request per utterance; the result is MP3 audio for the
//! playback layer.

use serde::Serialize;

use crate::{Error, Result};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
}

/// Synthesizes narration audio from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
}

impl TextToSpeech {
    /// Create a TTS client
    ///
    /// The speed multiplier is clamped to the API's accepted range
    /// (0.25 to 4.0).
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, voice: String, speed: f32, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed: speed.clamp(0.25, 4.0),
            model,
        })
    }

    /// Synthesize one utterance, returning MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        tracing::debug!(chars = text.len(), voice = %self.voice, "synthesizing narration");

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                model: &self.model,
                input: text,
                voice: &self.voice,
                speed: self.speed,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
